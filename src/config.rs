// Runtime configuration: where the database and bill files live

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    pub files_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_base(default_base_dir())
    }
}

impl Config {
    /// Lay out the standard file structure under `base`.
    pub fn from_base(base: PathBuf) -> Self {
        Config {
            db_path: base.join("billbook.db"),
            files_dir: base.join("bill_files"),
        }
    }

    /// Read the saved configuration, falling back to the default layout
    /// when none has been written yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Create the directories the database and bill files live in.
    pub fn ensure_dirs(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.files_dir)?;
        Ok(())
    }
}

fn default_base_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billbook")
}

fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billbook")
        .join(CONFIG_FILE)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_base_layout() {
        let config = Config::from_base(PathBuf::from("/tmp/billbook-test"));

        assert_eq!(config.db_path, PathBuf::from("/tmp/billbook-test/billbook.db"));
        assert_eq!(
            config.files_dir,
            PathBuf::from("/tmp/billbook-test/bill_files")
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config::from_base(dir.path().join("base"));

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&dir.path().join("missing.json")).unwrap();

        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_ensure_dirs_creates_layout() {
        let dir = TempDir::new().unwrap();
        let config = Config::from_base(dir.path().join("base"));

        config.ensure_dirs().unwrap();

        assert!(config.files_dir.is_dir());
        assert!(config.db_path.parent().unwrap().is_dir());
    }
}
