// Depreciation bills - year-aligned periods and a usage percentage

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bills::core::{BillCore, CorePatch};
use crate::entities::{RealEstate, RealPropertyValues, ServiceProvider};
use crate::error::{BillError, Result};
use crate::row::{Row, RowOptions};

/// Property-value columns that collide with the bill's own columns when the
/// two rows are joined. `RowOptions::rpv_prefix` renames exactly these.
const RPV_PREFIX_COLUMNS: [&str; 9] = [
    "real_estate_id",
    "address",
    "street_num",
    "street_name",
    "city",
    "state",
    "zip_code",
    "apt",
    "notes",
];

// ============================================================================
// DEPRECIATION BILL
// ============================================================================

/// A yearly depreciation charge for one depreciable item.
///
/// Depreciation runs on tax years: the start date must be Jan 1, the end
/// date Dec 31, and the paid date (when set) Dec 31. The usage percentage
/// covers items bought or disposed of mid-year and items partly in
/// personal use. The core is private so every date write goes through the
/// validated setters.
#[derive(Debug, Clone, PartialEq)]
pub struct DepreciationBill {
    core: BillCore,
    real_property_value: Arc<RealPropertyValues>,
    period_usage_pct: Decimal,
}

impl DepreciationBill {
    pub fn new(
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
        real_property_value: Arc<RealPropertyValues>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        period_usage_pct: Decimal,
        total_cost: Decimal,
    ) -> Result<Self> {
        check_start_date(start_date)?;
        check_end_date(end_date)?;
        check_period_usage_pct(period_usage_pct)?;

        Ok(DepreciationBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                start_date,
                end_date,
                total_cost,
            ),
            real_property_value,
            period_usage_pct,
        })
    }

    pub fn with_paid_date(mut self, paid_date: Option<NaiveDate>) -> Result<Self> {
        check_paid_date(paid_date)?;
        self.core = self.core.with_paid_date(paid_date);
        Ok(self)
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.core = self.core.with_notes(notes);
        self
    }

    // ------------------------------------------------------------------
    // accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> Option<i64> {
        self.core.id
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        self.core.id = id;
    }

    pub fn real_estate(&self) -> &Arc<RealEstate> {
        &self.core.real_estate
    }

    pub fn service_provider(&self) -> &Arc<ServiceProvider> {
        &self.core.service_provider
    }

    pub fn real_property_value(&self) -> &Arc<RealPropertyValues> {
        &self.real_property_value
    }

    pub fn start_date(&self) -> NaiveDate {
        self.core.start_date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.core.end_date()
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.core.paid_date()
    }

    pub fn total_cost(&self) -> Decimal {
        self.core.total_cost
    }

    pub fn set_total_cost(&mut self, total_cost: Decimal) {
        self.core.total_cost = total_cost;
    }

    pub fn notes(&self) -> Option<&str> {
        self.core.notes.as_deref()
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.core.notes = notes;
    }

    pub fn period_usage_pct(&self) -> Decimal {
        self.period_usage_pct
    }

    pub fn bill_month_year(&self) -> String {
        self.core.bill_month_year()
    }

    // ------------------------------------------------------------------
    // validated setters
    // ------------------------------------------------------------------

    /// Only the first day of a year is accepted.
    pub fn set_start_date(&mut self, start_date: NaiveDate) -> Result<()> {
        check_start_date(start_date)?;
        self.core.set_start_date(start_date);
        Ok(())
    }

    /// Only the last day of a year is accepted.
    pub fn set_end_date(&mut self, end_date: NaiveDate) -> Result<()> {
        check_end_date(end_date)?;
        self.core.set_end_date(end_date);
        Ok(())
    }

    /// `None` or the last day of a year.
    pub fn set_paid_date(&mut self, paid_date: Option<NaiveDate>) -> Result<()> {
        check_paid_date(paid_date)?;
        self.core.set_paid_date(paid_date);
        Ok(())
    }

    /// Percent value between 000.00 and 100.00 inclusive.
    pub fn set_period_usage_pct(&mut self, period_usage_pct: Decimal) -> Result<()> {
        check_period_usage_pct(period_usage_pct)?;
        self.period_usage_pct = period_usage_pct;
        Ok(())
    }

    // ------------------------------------------------------------------
    // bulk update and projections
    // ------------------------------------------------------------------

    /// Apply the present fields of `patch` in field order, routing the
    /// constrained fields through their validated setters. A rejected
    /// value stops the update there; fields already applied stay applied,
    /// the rejected field keeps its last valid value.
    pub fn apply_update(&mut self, patch: &DepreciationBillPatch) -> Result<()> {
        if let Some(start_date) = patch.core.start_date {
            self.set_start_date(start_date)?;
        }
        if let Some(end_date) = patch.core.end_date {
            self.set_end_date(end_date)?;
        }
        if let Some(total_cost) = patch.core.total_cost {
            self.core.total_cost = total_cost;
        }
        if let Some(paid_date) = patch.core.paid_date {
            self.set_paid_date(paid_date)?;
        }
        if let Some(ref notes) = patch.core.notes {
            self.core.notes = notes.clone();
        }
        if let Some(period_usage_pct) = patch.period_usage_pct {
            self.set_period_usage_pct(period_usage_pct)?;
        }
        Ok(())
    }

    /// Flat relational-insert shape. The property-value reference is
    /// dropped and its id carried as `real_property_values_id`.
    pub fn to_record(&self) -> DepreciationBillRecord {
        DepreciationBillRecord {
            real_estate_id: self.core.real_estate.id,
            service_provider_id: self.core.service_provider.id,
            real_property_values_id: self.real_property_value.id,
            start_date: self.core.start_date(),
            end_date: self.core.end_date(),
            total_cost: self.core.total_cost,
            paid_date: self.core.paid_date(),
            notes: self.core.notes.clone(),
            period_usage_pct: self.period_usage_pct,
        }
    }

    /// Rebuild a bill from its record plus the referenced records the
    /// caller resolved from the record's ids. Constrained fields go back
    /// through validation.
    pub fn from_record(
        record: DepreciationBillRecord,
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
        real_property_value: Arc<RealPropertyValues>,
    ) -> Result<Self> {
        DepreciationBill::new(
            real_estate,
            service_provider,
            real_property_value,
            record.start_date,
            record.end_date,
            record.period_usage_pct,
            record.total_cost,
        )?
        .with_paid_date(record.paid_date)
        .map(|bill| bill.with_notes(record.notes))
    }

    pub fn to_row(&self) -> Row {
        self.to_row_with(RowOptions::default())
    }

    /// The shared columns plus `period_usage_pct`, then the property
    /// value's row with its `id` renamed `real_property_value_id`. Without
    /// the prefix option the joined row carries duplicate column names.
    pub fn to_row_with(&self, options: RowOptions) -> Row {
        let mut row = self.core.to_row();
        row.push("period_usage_pct", self.period_usage_pct.to_string());

        let mut rpv_row = self.real_property_value.to_row();
        rpv_row.rename("id", "real_property_value_id");
        if options.rpv_prefix {
            rpv_row.prefix("rpv_", &RPV_PREFIX_COLUMNS);
        }
        row.extend(rpv_row);
        row
    }
}

// ============================================================================
// VALIDATION RULES
// ============================================================================

fn check_start_date(start_date: NaiveDate) -> Result<()> {
    if (start_date.month(), start_date.day()) != (1, 1) {
        return Err(BillError::InvalidDate {
            field: "start_date",
            value: start_date,
            expected: "YYYY-01-01",
        });
    }
    Ok(())
}

fn check_end_date(end_date: NaiveDate) -> Result<()> {
    if (end_date.month(), end_date.day()) != (12, 31) {
        return Err(BillError::InvalidDate {
            field: "end_date",
            value: end_date,
            expected: "YYYY-12-31",
        });
    }
    Ok(())
}

fn check_paid_date(paid_date: Option<NaiveDate>) -> Result<()> {
    if let Some(paid_date) = paid_date {
        if (paid_date.month(), paid_date.day()) != (12, 31) {
            return Err(BillError::InvalidDate {
                field: "paid_date",
                value: paid_date,
                expected: "YYYY-12-31",
            });
        }
    }
    Ok(())
}

fn check_period_usage_pct(period_usage_pct: Decimal) -> Result<()> {
    if period_usage_pct < Decimal::ZERO || period_usage_pct > Decimal::ONE_HUNDRED {
        return Err(BillError::PercentOutOfRange(period_usage_pct));
    }
    Ok(())
}

// ============================================================================
// RECORD AND PATCH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationBillRecord {
    pub real_estate_id: Option<i64>,
    pub service_provider_id: Option<i64>,
    pub real_property_values_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub period_usage_pct: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepreciationBillPatch {
    pub core: CorePatch,
    pub period_usage_pct: Option<Decimal>,
}

// ============================================================================
// TESTS
// ============================================================================
