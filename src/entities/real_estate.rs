// Real estate reference records - every bill points at one of these

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{BillError, Result};
use crate::row::{opt_cell, Row};

// ============================================================================
// ADDRESS
// ============================================================================

/// Known property addresses. Bills and import files refer to properties by
/// the canonical full-address string; everything else goes through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// Single family home
    WagonLane,

    /// Rented apartment in the same building
    WagonLaneApt1,
}

impl Address {
    pub fn all() -> [Address; 2] {
        [Address::WagonLane, Address::WagonLaneApt1]
    }

    /// Canonical full-address string used in files and exports.
    pub fn value(&self) -> &'static str {
        match self {
            Address::WagonLane => "5 Wagon Ln Centereach NY 11720",
            Address::WagonLaneApt1 => "5 Wagon Ln Apt 1 Centereach NY 11720",
        }
    }

    /// Short form used in generated file names.
    pub fn short_name(&self) -> &'static str {
        match self {
            Address::WagonLane => "WagonLn",
            Address::WagonLaneApt1 => "WagonLnApt1",
        }
    }

    /// Look up an address by its canonical full-address string.
    pub fn to_address(value: &str) -> Result<Address> {
        Address::all()
            .into_iter()
            .find(|a| a.value() == value)
            .ok_or_else(|| BillError::UnknownAddress(value.to_string()))
    }
}

// ============================================================================
// REAL ESTATE ENTITY
// ============================================================================

/// A known property location. `id` is the storage key and stays `None`
/// until the record has been persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealEstate {
    pub id: Option<i64>,
    pub address: Address,
    pub street_num: String,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub apt: Option<String>,
}

impl RealEstate {
    /// Create a record for `address` with the street parts filled in.
    pub fn new(address: Address) -> Self {
        let apt = match address {
            Address::WagonLane => None,
            Address::WagonLaneApt1 => Some("1".to_string()),
        };

        RealEstate {
            id: None,
            address,
            street_num: "5".to_string(),
            street_name: "Wagon Ln".to_string(),
            city: "Centereach".to_string(),
            state: "NY".to_string(),
            zip_code: "11720".to_string(),
            apt,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Project to an ordered row. Column names match the struct fields; the
    /// caller renames `id` when joining into a bill row.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.push("id", opt_cell(self.id.as_ref()));
        row.push("address", self.address.value());
        row.push("street_num", self.street_num.clone());
        row.push("street_name", self.street_name.clone());
        row.push("city", self.city.clone());
        row.push("state", self.state.clone());
        row.push("zip_code", self.zip_code.clone());
        row.push("apt", opt_cell(self.apt.as_ref()));
        row
    }
}

// ============================================================================
// REAL ESTATE REGISTRY
// ============================================================================

/// In-memory collection of the known properties, shared by reference.
pub struct RealEstateRegistry {
    estates: Vec<Arc<RealEstate>>,
}

impl RealEstateRegistry {
    pub fn new() -> Self {
        RealEstateRegistry { estates: Vec::new() }
    }

    /// Registry with every known address pre-loaded.
    pub fn with_defaults() -> Self {
        let mut registry = RealEstateRegistry::new();
        registry.register_default_estates();
        registry
    }

    fn register_default_estates(&mut self) {
        for (i, address) in Address::all().into_iter().enumerate() {
            self.register(RealEstate::new(address).with_id(i as i64 + 1));
        }
    }

    pub fn register(&mut self, estate: RealEstate) -> Arc<RealEstate> {
        let estate = Arc::new(estate);
        self.estates.push(estate.clone());
        estate
    }

    pub fn find_by_address(&self, address: Address) -> Option<Arc<RealEstate>> {
        self.estates.iter().find(|e| e.address == address).cloned()
    }

    pub fn find_by_id(&self, id: i64) -> Option<Arc<RealEstate>> {
        self.estates.iter().find(|e| e.id == Some(id)).cloned()
    }

    pub fn all(&self) -> &[Arc<RealEstate>] {
        &self.estates
    }

    pub fn count(&self) -> usize {
        self.estates.len()
    }
}

impl Default for RealEstateRegistry {
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
    fn test_to_address_known_value() {
        let address = Address::to_address("5 Wagon Ln Centereach NY 11720").unwrap();
        assert_eq!(address, Address::WagonLane);

        let apt = Address::to_address("5 Wagon Ln Apt 1 Centereach NY 11720").unwrap();
        assert_eq!(apt, Address::WagonLaneApt1);
    }

    #[test]
    fn test_to_address_unknown_value_keeps_raw_string() {
        let err = Address::to_address("12 Nowhere Rd").unwrap_err();
        assert!(err.to_string().contains("12 Nowhere Rd"));
    }

    #[test]
    fn test_new_fills_street_parts() {
        let estate = RealEstate::new(Address::WagonLaneApt1);

        assert_eq!(estate.id, None);
        assert_eq!(estate.street_num, "5");
        assert_eq!(estate.street_name, "Wagon Ln");
        assert_eq!(estate.apt, Some("1".to_string()));

        let house = RealEstate::new(Address::WagonLane);
        assert_eq!(house.apt, None);
    }

    #[test]
    fn test_registry_initialization() {
        let registry = RealEstateRegistry::with_defaults();
        assert_eq!(registry.count(), 2);

        let house = registry.find_by_address(Address::WagonLane).unwrap();
        assert_eq!(house.id, Some(1));

        let apt = registry.find_by_address(Address::WagonLaneApt1).unwrap();
        assert_eq!(apt.id, Some(2));
    }

    #[test]
    fn test_registry_find_by_id() {
        let registry = RealEstateRegistry::with_defaults();

        let estate = registry.find_by_id(2).unwrap();
        assert_eq!(estate.address, Address::WagonLaneApt1);

        assert!(registry.find_by_id(99).is_none());
    }

    #[test]
    fn test_to_row_column_order() {
        let estate = RealEstate::new(Address::WagonLane).with_id(1);
        let row = estate.to_row();

        assert_eq!(
            row.columns(),
            vec![
                "id",
                "address",
                "street_num",
                "street_name",
                "city",
                "state",
                "zip_code",
                "apt"
            ]
        );
        assert_eq!(row.get("id"), Some("1"));
        assert_eq!(row.get("address"), Some("5 Wagon Ln Centereach NY 11720"));
        assert_eq!(row.get("apt"), Some(""));
    }
}
