// Simple service bills - no fields beyond the shared core

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bills::core::{BillCore, CorePatch};
use crate::entities::{RealEstate, ServiceProvider};
use crate::error::Result;
use crate::row::Row;

// ============================================================================
// SIMPLE BILL
// ============================================================================

/// A bill for an ordinary service: water, taxes, insurance, supplies,
/// repairs. Nothing beyond the shared attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleBill {
    pub core: BillCore,
}

impl SimpleBill {
    pub fn new(
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_cost: Decimal,
    ) -> Self {
        SimpleBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                start_date,
                end_date,
                total_cost,
            ),
        }
    }

    pub fn with_paid_date(mut self, paid_date: Option<NaiveDate>) -> Self {
        self.core = self.core.with_paid_date(paid_date);
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.core = self.core.with_notes(notes);
        self
    }

    /// Apply the present fields of `patch`. Nothing here can fail; the
    /// `Result` keeps the update surface uniform across bill variants.
    pub fn apply_update(&mut self, patch: &SimpleBillPatch) -> Result<()> {
        self.core.apply_update(&patch.core);
        Ok(())
    }

    /// Flat relational-insert shape: entity id and object references are
    /// dropped, the referenced records contribute their ids.
    pub fn to_record(&self) -> SimpleBillRecord {
        SimpleBillRecord {
            real_estate_id: self.core.real_estate.id,
            service_provider_id: self.core.service_provider.id,
            start_date: self.core.start_date(),
            end_date: self.core.end_date(),
            total_cost: self.core.total_cost,
            paid_date: self.core.paid_date(),
            notes: self.core.notes.clone(),
        }
    }

    /// Rebuild a bill from its record plus the referenced records the
    /// caller resolved from the record's ids.
    pub fn from_record(
        record: SimpleBillRecord,
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
    ) -> Self {
        SimpleBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                record.start_date,
                record.end_date,
                record.total_cost,
            )
            .with_paid_date(record.paid_date)
            .with_notes(record.notes),
        }
    }

    pub fn to_row(&self) -> Row {
        self.core.to_row()
    }
}

// ============================================================================
// RECORD AND PATCH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleBillRecord {
    pub real_estate_id: Option<i64>,
    pub service_provider_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleBillPatch {
    pub core: CorePatch,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        Address, ProviderKind, RealEstateRegistry, ServiceProviderRegistry,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_bill() -> SimpleBill {
        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        SimpleBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::ScwaUti).unwrap(),
            d(2024, 1, 10),
            d(2024, 3, 9),
            Decimal::new(10450, 2),
        )
        .with_notes(Some("quarterly".to_string()))
    }

    #[test]
    fn test_record_drops_ids_and_references() {
        let mut bill = sample_bill();
        bill.core.id = Some(17);

        let record = bill.to_record();
        assert_eq!(record.real_estate_id, Some(1));
        assert_eq!(record.service_provider_id, Some(3));
        assert_eq!(record.total_cost, Decimal::new(10450, 2));
        assert_eq!(record.paid_date, None);
    }

    #[test]
    fn test_record_round_trip() {
        let bill = sample_bill().with_paid_date(Some(d(2024, 3, 20)));
        let record = bill.to_record();

        let rebuilt = SimpleBill::from_record(
            record,
            bill.core.real_estate.clone(),
            bill.core.service_provider.clone(),
        );
        assert_eq!(rebuilt, bill);
    }

    #[test]
    fn test_apply_update_is_idempotent() {
        let mut bill = sample_bill();
        let patch = SimpleBillPatch {
            core: CorePatch {
                paid_date: Some(Some(d(2024, 3, 20))),
                total_cost: Some(Decimal::new(9999, 2)),
                ..Default::default()
            },
        };

        bill.apply_update(&patch).unwrap();
        let once = bill.clone();
        bill.apply_update(&patch).unwrap();

        assert_eq!(bill, once);
        assert_eq!(bill.core.paid_date(), Some(d(2024, 3, 20)));
    }

    #[test]
    fn test_to_row_is_core_row() {
        let bill = sample_bill();
        assert_eq!(bill.to_row(), bill.core.to_row());
        assert_eq!(bill.to_row().get("provider"), Some("SCWA-UTI"));
    }
}
