// Attributes common to every service bill

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::entities::{RealEstate, ServiceProvider};
use crate::row::{opt_cell, Row};

/// Day-of-month cutoff used when labeling a bill with its month.
pub const DEFAULT_MONTH_YEAR_THRESHOLD: u32 = 25;

// ============================================================================
// BILL PERIOD LABELING
// ============================================================================

/// Label a billing period with "YYYY-MM": the start date's month if the
/// bill starts on or before `threshold`, otherwise the end date's month.
///
/// A bill starting late in a month (say the 28th) is mostly for the next
/// month, so it is labeled with the month it runs into.
pub fn calc_bill_month_year(
    start_date: NaiveDate,
    end_date: NaiveDate,
    threshold: u32,
) -> String {
    let date = if start_date.day() <= threshold {
        start_date
    } else {
        end_date
    };
    date.format("%Y-%m").to_string()
}

// ============================================================================
// BILL CORE
// ============================================================================

/// Common attributes of a service bill: where, who, when, how much.
///
/// The date fields are private with unvalidated setters. Bill variants that
/// restrict dates (depreciation) keep their core private and wrap these
/// setters with the validated ones.
#[derive(Debug, Clone, PartialEq)]
pub struct BillCore {
    /// Storage key, `None` until the bill is persisted.
    pub id: Option<i64>,
    pub real_estate: Arc<RealEstate>,
    pub service_provider: Arc<ServiceProvider>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    pub total_cost: Decimal,
    paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl BillCore {
    pub fn new(
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_cost: Decimal,
    ) -> Self {
        BillCore {
            id: None,
            real_estate,
            service_provider,
            start_date,
            end_date,
            total_cost,
            paid_date: None,
            notes: None,
        }
    }

    pub fn with_paid_date(mut self, paid_date: Option<NaiveDate>) -> Self {
        self.paid_date = paid_date;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }

    /// Unvalidated write. Variants that restrict start dates wrap this.
    pub fn set_start_date(&mut self, start_date: NaiveDate) {
        self.start_date = start_date;
    }

    /// Unvalidated write. Variants that restrict end dates wrap this.
    pub fn set_end_date(&mut self, end_date: NaiveDate) {
        self.end_date = end_date;
    }

    /// Unvalidated write. Variants that restrict paid dates wrap this.
    pub fn set_paid_date(&mut self, paid_date: Option<NaiveDate>) {
        self.paid_date = paid_date;
    }

    /// "YYYY-MM" label for this bill's period, default threshold.
    pub fn bill_month_year(&self) -> String {
        calc_bill_month_year(self.start_date, self.end_date, DEFAULT_MONTH_YEAR_THRESHOLD)
    }

    /// Apply the present fields of `patch`, in order, without validation.
    pub fn apply_update(&mut self, patch: &CorePatch) {
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = end_date;
        }
        if let Some(total_cost) = patch.total_cost {
            self.total_cost = total_cost;
        }
        if let Some(paid_date) = patch.paid_date {
            self.paid_date = paid_date;
        }
        if let Some(ref notes) = patch.notes {
            self.notes = notes.clone();
        }
    }

    /// Project the shared columns: the referenced property's row with `id`
    /// renamed `real_estate_id`, the provider's row with `id` renamed
    /// `service_provider_id`, then the bill's own fields.
    pub fn to_row(&self) -> Row {
        let mut row = self.real_estate.to_row();
        row.rename("id", "real_estate_id");

        let mut provider_row = self.service_provider.to_row();
        provider_row.rename("id", "service_provider_id");
        row.extend(provider_row);

        row.push("id", opt_cell(self.id.as_ref()));
        row.push("start_date", self.start_date.to_string());
        row.push("end_date", self.end_date.to_string());
        row.push("total_cost", self.total_cost.to_string());
        row.push("paid_date", opt_cell(self.paid_date.as_ref()));
        row.push("notes", opt_cell(self.notes.as_ref()));
        row
    }
}

// ============================================================================
// CORE PATCH
// ============================================================================

/// Partial update of the shared bill fields. `None` leaves a field alone;
/// the nullable fields take a second level of `Option` so a patch can
/// distinguish "no change" from "set to NULL".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorePatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub total_cost: Option<Decimal>,
    pub paid_date: Option<Option<NaiveDate>>,
    pub notes: Option<Option<String>>,
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

    fn sample_core() -> BillCore {
        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        BillCore::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::ScwaUti).unwrap(),
            d(2024, 1, 20),
            d(2024, 2, 15),
            Decimal::new(8334, 2),
        )
    }

    #[test]
    fn test_month_year_from_start_date_at_or_below_threshold() {
        assert_eq!(
            calc_bill_month_year(d(2024, 1, 20), d(2024, 2, 15), 25),
            "2024-01"
        );
        // day equal to the threshold still uses the start date
        assert_eq!(
            calc_bill_month_year(d(2024, 1, 25), d(2024, 2, 15), 25),
            "2024-01"
        );
    }

    #[test]
    fn test_month_year_from_end_date_above_threshold() {
        assert_eq!(
            calc_bill_month_year(d(2024, 1, 26), d(2024, 2, 15), 25),
            "2024-02"
        );
    }

    #[test]
    fn test_bill_month_year_uses_default_threshold() {
        let mut core = sample_core();
        assert_eq!(core.bill_month_year(), "2024-01");

        core.set_start_date(d(2024, 1, 26));
        assert_eq!(core.bill_month_year(), "2024-02");
    }

    #[test]
    fn test_new_defaults() {
        let core = sample_core();
        assert_eq!(core.id, None);
        assert_eq!(core.paid_date(), None);
        assert_eq!(core.notes, None);
    }

    #[test]
    fn test_apply_update_only_touches_present_fields() {
        let mut core = sample_core();
        let before = core.clone();

        core.apply_update(&CorePatch::default());
        assert_eq!(core, before);

        core.apply_update(&CorePatch {
            total_cost: Some(Decimal::new(9000, 2)),
            paid_date: Some(Some(d(2024, 3, 1))),
            ..Default::default()
        });
        assert_eq!(core.total_cost, Decimal::new(9000, 2));
        assert_eq!(core.paid_date(), Some(d(2024, 3, 1)));
        assert_eq!(core.start_date(), before.start_date());
    }

    #[test]
    fn test_apply_update_can_clear_nullable_fields() {
        let mut core = sample_core()
            .with_paid_date(Some(d(2024, 3, 1)))
            .with_notes(Some("paid online".to_string()));

        core.apply_update(&CorePatch {
            paid_date: Some(None),
            notes: Some(None),
            ..Default::default()
        });

        assert_eq!(core.paid_date(), None);
        assert_eq!(core.notes, None);
    }

    #[test]
    fn test_to_row_column_order() {
        let mut core = sample_core();
        core.id = Some(4);
        let row = core.to_row();

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
                "service_provider_id",
                "provider",
                "id",
                "start_date",
                "end_date",
                "total_cost",
                "paid_date",
                "notes"
            ]
        );
        assert_eq!(row.get("real_estate_id"), Some("1"));
        assert_eq!(row.get("id"), Some("4"));
        assert_eq!(row.get("total_cost"), Some("83.34"));
        assert_eq!(row.get("paid_date"), Some(""));
    }
}
