// Bill variants and the closed set over them

pub mod core;
pub mod depreciation;
pub mod electric;
pub mod mortgage;
pub mod simple;

pub use self::core::{
    calc_bill_month_year, BillCore, CorePatch, DEFAULT_MONTH_YEAR_THRESHOLD,
};
pub use depreciation::{DepreciationBill, DepreciationBillPatch, DepreciationBillRecord};
pub use electric::{ElectricBill, ElectricBillPatch, ElectricBillRecord};
pub use mortgage::{MortgageBill, MortgageBillPatch, MortgageBillRecord};
pub use simple::{SimpleBill, SimpleBillPatch, SimpleBillRecord};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::entities::{RealEstate, ServiceProvider};
use crate::row::{Row, RowOptions};

// ============================================================================
// BILL
// ============================================================================

/// Any bill. The set of variants is closed; code that consumes bills
/// matches on this instead of trading in trait objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Bill {
    Simple(SimpleBill),
    Mortgage(MortgageBill),
    Depreciation(DepreciationBill),
    Electric(ElectricBill),
}

impl Bill {
    /// Name of the table this bill persists to.
    pub fn table(&self) -> &'static str {
        match self {
            Bill::Simple(_) => "simple_bill_data",
            Bill::Mortgage(_) => "mortgage_bill_data",
            Bill::Depreciation(_) => "depreciation_bill_data",
            Bill::Electric(_) => "electric_bill_data",
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Bill::Simple(bill) => bill.core.id,
            Bill::Mortgage(bill) => bill.core.id,
            Bill::Depreciation(bill) => bill.id(),
            Bill::Electric(bill) => bill.core.id,
        }
    }

    pub fn set_id(&mut self, id: Option<i64>) {
        match self {
            Bill::Simple(bill) => bill.core.id = id,
            Bill::Mortgage(bill) => bill.core.id = id,
            Bill::Depreciation(bill) => bill.set_id(id),
            Bill::Electric(bill) => bill.core.id = id,
        }
    }

    pub fn real_estate(&self) -> &Arc<RealEstate> {
        match self {
            Bill::Simple(bill) => &bill.core.real_estate,
            Bill::Mortgage(bill) => &bill.core.real_estate,
            Bill::Depreciation(bill) => bill.real_estate(),
            Bill::Electric(bill) => &bill.core.real_estate,
        }
    }

    pub fn service_provider(&self) -> &Arc<ServiceProvider> {
        match self {
            Bill::Simple(bill) => &bill.core.service_provider,
            Bill::Mortgage(bill) => &bill.core.service_provider,
            Bill::Depreciation(bill) => bill.service_provider(),
            Bill::Electric(bill) => &bill.core.service_provider,
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        match self {
            Bill::Simple(bill) => bill.core.start_date(),
            Bill::Mortgage(bill) => bill.core.start_date(),
            Bill::Depreciation(bill) => bill.start_date(),
            Bill::Electric(bill) => bill.core.start_date(),
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        match self {
            Bill::Simple(bill) => bill.core.end_date(),
            Bill::Mortgage(bill) => bill.core.end_date(),
            Bill::Depreciation(bill) => bill.end_date(),
            Bill::Electric(bill) => bill.core.end_date(),
        }
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        match self {
            Bill::Simple(bill) => bill.core.paid_date(),
            Bill::Mortgage(bill) => bill.core.paid_date(),
            Bill::Depreciation(bill) => bill.paid_date(),
            Bill::Electric(bill) => bill.core.paid_date(),
        }
    }

    pub fn total_cost(&self) -> Decimal {
        match self {
            Bill::Simple(bill) => bill.core.total_cost,
            Bill::Mortgage(bill) => bill.core.total_cost,
            Bill::Depreciation(bill) => bill.total_cost(),
            Bill::Electric(bill) => bill.core.total_cost,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Bill::Simple(bill) => bill.core.notes.as_deref(),
            Bill::Mortgage(bill) => bill.core.notes.as_deref(),
            Bill::Depreciation(bill) => bill.notes(),
            Bill::Electric(bill) => bill.core.notes.as_deref(),
        }
    }

    /// The "YYYY-MM" period this bill belongs to.
    pub fn bill_month_year(&self) -> String {
        match self {
            Bill::Simple(bill) => bill.core.bill_month_year(),
            Bill::Mortgage(bill) => bill.core.bill_month_year(),
            Bill::Depreciation(bill) => bill.bill_month_year(),
            Bill::Electric(bill) => bill.core.bill_month_year(),
        }
    }

    pub fn to_row(&self) -> Row {
        self.to_row_with(RowOptions::default())
    }

    /// Tabular projection. Only depreciation bills carry columns the
    /// options can rename; the other variants ignore them.
    pub fn to_row_with(&self, options: RowOptions) -> Row {
        match self {
            Bill::Simple(bill) => bill.to_row(),
            Bill::Mortgage(bill) => bill.to_row(),
            Bill::Depreciation(bill) => bill.to_row_with(options),
            Bill::Electric(bill) => bill.to_row(),
        }
    }
}

impl From<SimpleBill> for Bill {
    fn from(bill: SimpleBill) -> Self {
        Bill::Simple(bill)
    }
}

impl From<MortgageBill> for Bill {
    fn from(bill: MortgageBill) -> Self {
        Bill::Mortgage(bill)
    }
}

impl From<DepreciationBill> for Bill {
    fn from(bill: DepreciationBill) -> Self {
        Bill::Depreciation(bill)
    }
}

impl From<ElectricBill> for Bill {
    fn from(bill: ElectricBill) -> Self {
        Bill::Electric(bill)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        Address, ProviderKind, RealEstateRegistry, RealPropertyValuesRegistry,
        ServiceProviderRegistry,
    };

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn simple_bill() -> SimpleBill {
        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        SimpleBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::ScwaUti).unwrap(),
            d(2024, 1, 20),
            d(2024, 2, 15),
            Decimal::new(5250, 2),
        )
    }

    #[test]
    fn test_dispatch_reaches_variant_fields() {
        let mut bill = Bill::from(simple_bill());

        assert_eq!(bill.id(), None);
        bill.set_id(Some(17));
        assert_eq!(bill.id(), Some(17));

        assert_eq!(bill.table(), "simple_bill_data");
        assert_eq!(bill.total_cost(), Decimal::new(5250, 2));
        assert_eq!(bill.bill_month_year(), "2024-01");
        assert_eq!(bill.service_provider().provider, ProviderKind::ScwaUti);
    }

    #[test]
    fn test_row_options_only_touch_depreciation() {
        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        let values = RealPropertyValuesRegistry::with_defaults();

        let dep = DepreciationBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::DepDep).unwrap(),
            values.find_by_item("Dishwasher").unwrap(),
            d(2024, 1, 1),
            d(2024, 12, 31),
            Decimal::ONE_HUNDRED,
            Decimal::new(13000, 2),
        )
        .unwrap();
        let prefixed = RowOptions { rpv_prefix: true };

        let dep_row = Bill::from(dep).to_row_with(prefixed);
        assert!(dep_row.columns().contains(&"rpv_notes"));
        assert!(dep_row.columns().contains(&"item"));

        let simple_row = Bill::from(simple_bill()).to_row_with(prefixed);
        assert!(!simple_row.columns().iter().any(|c| c.starts_with("rpv_")));
    }
}
