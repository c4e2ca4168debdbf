// Service provider reference records

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{BillError, Result};
use crate::row::{opt_cell, Row};

// ============================================================================
// PROVIDER CLASS
// ============================================================================

/// Broad class of service a provider bills for, derived from the suffix of
/// the provider code ("SCWA-UTI" is a utility, "WP-REP" a repair shop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderClass {
    Utility,
    Mortgage,
    Depreciation,
    Tax,
    Supplies,
    Repair,
    Insurance,
    CommonCharge,
}

impl ProviderClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderClass::Utility => "Utility",
            ProviderClass::Mortgage => "Mortgage",
            ProviderClass::Depreciation => "Depreciation",
            ProviderClass::Tax => "Tax",
            ProviderClass::Supplies => "Supplies",
            ProviderClass::Repair => "Repair",
            ProviderClass::Insurance => "Insurance",
            ProviderClass::CommonCharge => "Common Charge",
        }
    }
}

// ============================================================================
// PROVIDER KIND
// ============================================================================

/// Known service providers. Bills and import files carry the provider code
/// string; everything else goes through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Electric utility
    PsegUti,

    /// Natural gas utility
    NgUti,

    /// Water utility
    ScwaUti,

    /// Cable and internet
    OcUti,

    /// Phone
    ViUti,

    /// Mortgage lender
    MsMi,

    /// Synthetic provider carried on depreciation bills
    DepDep,

    /// Property tax
    ScTax,

    /// Hardware supplies
    HdSup,

    /// General supplies
    WmtSup,

    /// Plumbing and repair
    WpRep,

    /// Homeowner insurance
    NbIns,

    /// Homeowner association common charges
    KpcCm,
}

impl ProviderKind {
    pub fn all() -> [ProviderKind; 13] {
        [
            ProviderKind::PsegUti,
            ProviderKind::NgUti,
            ProviderKind::ScwaUti,
            ProviderKind::OcUti,
            ProviderKind::ViUti,
            ProviderKind::MsMi,
            ProviderKind::DepDep,
            ProviderKind::ScTax,
            ProviderKind::HdSup,
            ProviderKind::WmtSup,
            ProviderKind::WpRep,
            ProviderKind::NbIns,
            ProviderKind::KpcCm,
        ]
    }

    /// Canonical provider code used in files and exports.
    pub fn value(&self) -> &'static str {
        match self {
            ProviderKind::PsegUti => "PSEG-UTI",
            ProviderKind::NgUti => "NG-UTI",
            ProviderKind::ScwaUti => "SCWA-UTI",
            ProviderKind::OcUti => "OC-UTI",
            ProviderKind::ViUti => "VI-UTI",
            ProviderKind::MsMi => "MS-MI",
            ProviderKind::DepDep => "DEP-DEP",
            ProviderKind::ScTax => "SC-TAX",
            ProviderKind::HdSup => "HD-SUP",
            ProviderKind::WmtSup => "WMT-SUP",
            ProviderKind::WpRep => "WP-REP",
            ProviderKind::NbIns => "NB-INS",
            ProviderKind::KpcCm => "KPC-CM",
        }
    }

    pub fn provider_class(&self) -> ProviderClass {
        match self {
            ProviderKind::PsegUti
            | ProviderKind::NgUti
            | ProviderKind::ScwaUti
            | ProviderKind::OcUti
            | ProviderKind::ViUti => ProviderClass::Utility,
            ProviderKind::MsMi => ProviderClass::Mortgage,
            ProviderKind::DepDep => ProviderClass::Depreciation,
            ProviderKind::ScTax => ProviderClass::Tax,
            ProviderKind::HdSup | ProviderKind::WmtSup => ProviderClass::Supplies,
            ProviderKind::WpRep => ProviderClass::Repair,
            ProviderKind::NbIns => ProviderClass::Insurance,
            ProviderKind::KpcCm => ProviderClass::CommonCharge,
        }
    }

    /// Look up a provider by its canonical code string.
    pub fn from_value(value: &str) -> Result<ProviderKind> {
        ProviderKind::all()
            .into_iter()
            .find(|k| k.value() == value)
            .ok_or_else(|| BillError::UnknownProvider(value.to_string()))
    }
}

// ============================================================================
// SERVICE PROVIDER ENTITY
// ============================================================================

/// A known provider. `id` is the storage key and stays `None` until the
/// record has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: Option<i64>,
    pub provider: ProviderKind,
}

impl ServiceProvider {
    pub fn new(provider: ProviderKind) -> Self {
        ServiceProvider { id: None, provider }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Project to an ordered row. The caller renames `id` when joining into
    /// a bill row.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.push("id", opt_cell(self.id.as_ref()));
        row.push("provider", self.provider.value());
        row
    }
}

// ============================================================================
// SERVICE PROVIDER REGISTRY
// ============================================================================

/// In-memory collection of the known providers, shared by reference.
pub struct ServiceProviderRegistry {
    providers: Vec<Arc<ServiceProvider>>,
}

impl ServiceProviderRegistry {
    pub fn new() -> Self {
        ServiceProviderRegistry {
            providers: Vec::new(),
        }
    }

    /// Registry with every known provider pre-loaded.
    pub fn with_defaults() -> Self {
        let mut registry = ServiceProviderRegistry::new();
        registry.register_default_providers();
        registry
    }

    fn register_default_providers(&mut self) {
        for (i, kind) in ProviderKind::all().into_iter().enumerate() {
            self.register(ServiceProvider::new(kind).with_id(i as i64 + 1));
        }
    }

    pub fn register(&mut self, provider: ServiceProvider) -> Arc<ServiceProvider> {
        let provider = Arc::new(provider);
        self.providers.push(provider.clone());
        provider
    }

    pub fn find_by_kind(&self, kind: ProviderKind) -> Option<Arc<ServiceProvider>> {
        self.providers.iter().find(|p| p.provider == kind).cloned()
    }

    pub fn find_by_id(&self, id: i64) -> Option<Arc<ServiceProvider>> {
        self.providers.iter().find(|p| p.id == Some(id)).cloned()
    }

    pub fn all(&self) -> &[Arc<ServiceProvider>] {
        &self.providers
    }

    pub fn count(&self) -> usize {
        self.providers.len()
    }
}

impl Default for ServiceProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value_known_code() {
        assert_eq!(
            ProviderKind::from_value("SCWA-UTI").unwrap(),
            ProviderKind::ScwaUti
        );
        assert_eq!(
            ProviderKind::from_value("MS-MI").unwrap(),
            ProviderKind::MsMi
        );
    }

    #[test]
    fn test_from_value_unknown_code_keeps_raw_string() {
        let err = ProviderKind::from_value("ACME-GAS").unwrap_err();
        assert!(err.to_string().contains("ACME-GAS"));
    }

    #[test]
    fn test_provider_class_follows_code_suffix() {
        assert_eq!(
            ProviderKind::PsegUti.provider_class(),
            ProviderClass::Utility
        );
        assert_eq!(ProviderKind::MsMi.provider_class(), ProviderClass::Mortgage);
        assert_eq!(
            ProviderKind::DepDep.provider_class(),
            ProviderClass::Depreciation
        );
        assert_eq!(ProviderKind::ScTax.provider_class(), ProviderClass::Tax);
        assert_eq!(
            ProviderKind::WmtSup.provider_class(),
            ProviderClass::Supplies
        );
        assert_eq!(ProviderKind::WpRep.provider_class(), ProviderClass::Repair);
        assert_eq!(
            ProviderKind::NbIns.provider_class(),
            ProviderClass::Insurance
        );
        assert_eq!(
            ProviderKind::KpcCm.provider_class(),
            ProviderClass::CommonCharge
        );
    }

    #[test]
    fn test_registry_initialization() {
        let registry = ServiceProviderRegistry::with_defaults();
        assert_eq!(registry.count(), ProviderKind::all().len());

        let pseg = registry.find_by_kind(ProviderKind::PsegUti).unwrap();
        assert_eq!(pseg.id, Some(1));
    }

    #[test]
    fn test_registry_find_by_id() {
        let registry = ServiceProviderRegistry::with_defaults();

        let provider = registry.find_by_id(3).unwrap();
        assert_eq!(provider.provider, ProviderKind::ScwaUti);

        assert!(registry.find_by_id(99).is_none());
    }

    #[test]
    fn test_to_row_column_order() {
        let provider = ServiceProvider::new(ProviderKind::ScwaUti).with_id(3);
        let row = provider.to_row();

        assert_eq!(row.columns(), vec!["id", "provider"]);
        assert_eq!(row.get("provider"), Some("SCWA-UTI"));
    }
}
