// Depreciable item reference records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::entities::real_estate::{Address, RealEstate};
use crate::row::{opt_cell, Row};

// ============================================================================
// REAL PROPERTY VALUES ENTITY
// ============================================================================

/// Valuation data for a depreciable item: the property it belongs to, what
/// it is, when it was bought, what it cost, and its depreciation class.
/// `id` is the storage key and stays `None` until the record has been
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RealPropertyValues {
    pub id: Option<i64>,
    pub real_estate: Arc<RealEstate>,
    pub item: String,
    pub purchase_date: NaiveDate,
    pub cost_basis: Decimal,
    pub dep_class: String,
    pub notes: Option<String>,
}

impl RealPropertyValues {
    pub fn new(
        real_estate: Arc<RealEstate>,
        item: impl Into<String>,
        purchase_date: NaiveDate,
        cost_basis: Decimal,
        dep_class: impl Into<String>,
    ) -> Self {
        RealPropertyValues {
            id: None,
            real_estate,
            item: item.into(),
            purchase_date,
            cost_basis,
            dep_class: dep_class.into(),
            notes: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Project to an ordered row: the referenced property's columns with its
    /// `id` renamed `real_estate_id`, then this item's own columns. This
    /// row keeps `id` as-is; a joining bill renames it.
    pub fn to_row(&self) -> Row {
        let mut row = self.real_estate.to_row();
        row.rename("id", "real_estate_id");
        row.push("id", opt_cell(self.id.as_ref()));
        row.push("item", self.item.clone());
        row.push("purchase_date", self.purchase_date.to_string());
        row.push("cost_basis", self.cost_basis.to_string());
        row.push("dep_class", self.dep_class.clone());
        row.push("notes", opt_cell(self.notes.as_ref()));
        row
    }
}

// ============================================================================
// REAL PROPERTY VALUES REGISTRY
// ============================================================================

/// In-memory collection of the known depreciable items, shared by reference.
pub struct RealPropertyValuesRegistry {
    values: Vec<Arc<RealPropertyValues>>,
}

impl RealPropertyValuesRegistry {
    pub fn new() -> Self {
        RealPropertyValuesRegistry { values: Vec::new() }
    }

    /// Registry with a few known items pre-loaded.
    pub fn with_defaults() -> Self {
        let mut registry = RealPropertyValuesRegistry::new();
        registry.register_default_values();
        registry
    }

    fn register_default_values(&mut self) {
        let house = Arc::new(RealEstate::new(Address::WagonLane).with_id(1));
        let apt = Arc::new(RealEstate::new(Address::WagonLaneApt1).with_id(2));

        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();

        self.register(
            RealPropertyValues::new(
                house.clone(),
                "Dishwasher",
                d(2021, 5, 15),
                Decimal::new(64999, 2),
                "GDS-5YR",
            )
            .with_id(1),
        );
        self.register(
            RealPropertyValues::new(
                house,
                "HVAC Condenser",
                d(2022, 8, 1),
                Decimal::new(385000, 2),
                "GDS-27.5YR",
            )
            .with_id(2),
        );
        self.register(
            RealPropertyValues::new(
                apt,
                "Refrigerator",
                d(2020, 3, 10),
                Decimal::new(119900, 2),
                "GDS-5YR",
            )
            .with_id(3)
            .with_notes(Some("tenant unit".to_string())),
        );
    }

    pub fn register(&mut self, value: RealPropertyValues) -> Arc<RealPropertyValues> {
        let value = Arc::new(value);
        self.values.push(value.clone());
        value
    }

    pub fn find_by_item(&self, item: &str) -> Option<Arc<RealPropertyValues>> {
        self.values.iter().find(|v| v.item == item).cloned()
    }

    pub fn find_by_id(&self, id: i64) -> Option<Arc<RealPropertyValues>> {
        self.values.iter().find(|v| v.id == Some(id)).cloned()
    }

    pub fn all(&self) -> &[Arc<RealPropertyValues>] {
        &self.values
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }
}

impl Default for RealPropertyValuesRegistry {
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
    fn test_registry_initialization() {
        let registry = RealPropertyValuesRegistry::with_defaults();
        assert_eq!(registry.count(), 3);

        let dishwasher = registry.find_by_item("Dishwasher").unwrap();
        assert_eq!(dishwasher.id, Some(1));
        assert_eq!(dishwasher.cost_basis, Decimal::new(64999, 2));
        assert_eq!(dishwasher.real_estate.address, Address::WagonLane);
    }

    #[test]
    fn test_registry_find_by_id() {
        let registry = RealPropertyValuesRegistry::with_defaults();

        let item = registry.find_by_id(3).unwrap();
        assert_eq!(item.item, "Refrigerator");
        assert_eq!(item.real_estate.address, Address::WagonLaneApt1);

        assert!(registry.find_by_id(99).is_none());
    }

    #[test]
    fn test_to_row_joins_real_estate_columns() {
        let registry = RealPropertyValuesRegistry::with_defaults();
        let row = registry.find_by_item("Dishwasher").unwrap().to_row();

        assert_eq!(
            row.columns(),
            vec![
                "real_estate_id",
                "address",
                "street_num",
                "street_name",
                "city",
                "state",
                "zip_code",
                "apt",
                "id",
                "item",
                "purchase_date",
                "cost_basis",
                "dep_class",
                "notes"
            ]
        );
        assert_eq!(row.get("real_estate_id"), Some("1"));
        assert_eq!(row.get("id"), Some("1"));
        assert_eq!(row.get("purchase_date"), Some("2021-05-15"));
        assert_eq!(row.get("cost_basis"), Some("649.99"));
    }
}
