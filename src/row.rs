// Ordered tabular rows for report and export output

// ============================================================================
// ROW
// ============================================================================

/// A single report row: ordered (column, cell) pairs.
///
/// Column names are not required to be unique. A joined row may carry the
/// same column twice (a depreciation bill and its depreciation item both
/// have `real_estate_id` and `notes`); callers that need unique names apply
/// a prefix first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Row { cells: Vec::new() }
    }

    /// Append a column at the end of the row.
    pub fn push(&mut self, column: &str, value: impl Into<String>) {
        self.cells.push((column.to_string(), value.into()));
    }

    /// Append all columns of `other` after this row's columns.
    pub fn extend(&mut self, other: Row) {
        self.cells.extend(other.cells);
    }

    /// Rename every column named `from` to `to`.
    pub fn rename(&mut self, from: &str, to: &str) {
        for (column, _) in &mut self.cells {
            if column == from {
                *column = to.to_string();
            }
        }
    }

    /// Prefix the listed columns with `prefix`, leaving all others untouched.
    pub fn prefix(&mut self, prefix: &str, columns: &[&str]) {
        for (column, _) in &mut self.cells {
            if columns.contains(&column.as_str()) {
                *column = format!("{}{}", prefix, column);
            }
        }
    }

    /// Cell of the first column named `column`, if present.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> Vec<&str> {
        self.cells.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// ============================================================================
// ROW OPTIONS
// ============================================================================

/// Options controlling how a bill projects to a row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowOptions {
    /// Prefix the depreciation item's overlapping columns with `rpv_` so the
    /// joined row has no duplicate column names. Off by default.
    pub rpv_prefix: bool,
}

// ============================================================================
// CELL HELPERS
// ============================================================================

/// Render an optional value for a row cell. `None` becomes the empty string.
pub fn opt_cell<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.push("id", "1");
        row.push("address", "somewhere");
        row.push("notes", "first");
        row
    }

    #[test]
    fn test_push_preserves_order() {
        let row = sample_row();
        assert_eq!(row.columns(), vec!["id", "address", "notes"]);
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_get_returns_first_match() {
        let mut row = sample_row();
        row.push("notes", "second");

        assert_eq!(row.get("notes"), Some("first"));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn test_rename_hits_every_occurrence() {
        let mut row = sample_row();
        row.push("id", "7");

        row.rename("id", "real_estate_id");

        assert_eq!(
            row.columns(),
            vec!["real_estate_id", "address", "notes", "real_estate_id"]
        );
    }

    #[test]
    fn test_prefix_only_listed_columns() {
        let mut row = sample_row();
        row.prefix("rpv_", &["address", "notes"]);

        assert_eq!(row.columns(), vec!["id", "rpv_address", "rpv_notes"]);
        assert_eq!(row.get("rpv_address"), Some("somewhere"));
    }

    #[test]
    fn test_extend_appends_in_order() {
        let mut row = sample_row();
        let mut other = Row::new();
        other.push("item", "dishwasher");
        other.push("notes", "second");

        row.extend(other);

        assert_eq!(row.columns(), vec!["id", "address", "notes", "item", "notes"]);
    }

    #[test]
    fn test_opt_cell() {
        assert_eq!(opt_cell(Some(&42)), "42");
        assert_eq!(opt_cell::<i64>(None), "");
    }
}
