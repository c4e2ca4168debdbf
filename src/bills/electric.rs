// Electric bills - the complex variant with per-line-item rates and costs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bills::core::{BillCore, CorePatch};
use crate::entities::{RealEstate, ServiceProvider};
use crate::error::Result;
use crate::row::{opt_cell, Row};

// ============================================================================
// ELECTRIC BILL
// ============================================================================

/// A monthly electric bill, actual or estimated.
///
/// The usage totals and cost subtotals are always on the bill; the line
/// items (tiered usage, surcharges, taxes) only appear when the provider
/// charged them, so they stay `None` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectricBill {
    pub core: BillCore,
    /// Data from an actual bill, as opposed to an estimate
    pub is_actual: bool,
    /// Total kwh used from the provider
    pub total_kwh: i64,
    /// Electric heater kwh usage
    pub eh_kwh: i64,
    /// Banked kwh
    pub bank_kwh: i64,
    /// Basic service charge rate and cost
    pub bs_rate: Decimal,
    pub bs_cost: Decimal,
    // kwh billed at the first tier rate
    pub first_kwh: Option<i64>,
    pub first_rate: Option<Decimal>,
    pub first_cost: Option<Decimal>,
    // kwh billed at the next tier rate
    pub next_kwh: Option<i64>,
    pub next_rate: Option<Decimal>,
    pub next_cost: Option<Decimal>,
    // customer benefit contribution charge
    pub cbc_rate: Option<Decimal>,
    pub cbc_cost: Option<Decimal>,
    // merchant function charge
    pub mfc_rate: Option<Decimal>,
    pub mfc_cost: Option<Decimal>,
    /// Delivery and system charges total cost
    pub dsc_total_cost: Decimal,
    // power supply charge
    pub psc_rate: Option<Decimal>,
    pub psc_cost: Option<Decimal>,
    pub psc_total_cost: Option<Decimal>,
    // distributed energy resources charge
    pub der_rate: Option<Decimal>,
    pub der_cost: Option<Decimal>,
    // delivery service adjustment
    pub dsa_rate: Option<Decimal>,
    pub dsa_cost: Option<Decimal>,
    // revenue decoupling adjustment
    pub rda_rate: Option<Decimal>,
    pub rda_cost: Option<Decimal>,
    // state assessment
    pub nysa_rate: Option<Decimal>,
    pub nysa_cost: Option<Decimal>,
    // revenue-based PILOTs
    pub rbp_rate: Option<Decimal>,
    pub rbp_cost: Option<Decimal>,
    // property tax adjustment
    pub spta_rate: Option<Decimal>,
    pub spta_cost: Option<Decimal>,
    // sales tax
    pub st_rate: Option<Decimal>,
    pub st_cost: Option<Decimal>,
    /// Taxes and other charges total cost
    pub toc_total_cost: Decimal,
}

impl ElectricBill {
    /// Create a bill with the always-present fields; line items come in
    /// through the `with_*` builders.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_kwh: i64,
        eh_kwh: i64,
        bank_kwh: i64,
        total_cost: Decimal,
        bs_rate: Decimal,
        bs_cost: Decimal,
        dsc_total_cost: Decimal,
        toc_total_cost: Decimal,
        is_actual: bool,
    ) -> Self {
        ElectricBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                start_date,
                end_date,
                total_cost,
            ),
            is_actual,
            total_kwh,
            eh_kwh,
            bank_kwh,
            bs_rate,
            bs_cost,
            first_kwh: None,
            first_rate: None,
            first_cost: None,
            next_kwh: None,
            next_rate: None,
            next_cost: None,
            cbc_rate: None,
            cbc_cost: None,
            mfc_rate: None,
            mfc_cost: None,
            dsc_total_cost,
            psc_rate: None,
            psc_cost: None,
            psc_total_cost: None,
            der_rate: None,
            der_cost: None,
            dsa_rate: None,
            dsa_cost: None,
            rda_rate: None,
            rda_cost: None,
            nysa_rate: None,
            nysa_cost: None,
            rbp_rate: None,
            rbp_cost: None,
            spta_rate: None,
            spta_cost: None,
            st_rate: None,
            st_cost: None,
            toc_total_cost,
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

    pub fn with_first_tier(mut self, kwh: i64, rate: Decimal, cost: Decimal) -> Self {
        self.first_kwh = Some(kwh);
        self.first_rate = Some(rate);
        self.first_cost = Some(cost);
        self
    }

    pub fn with_next_tier(mut self, kwh: i64, rate: Decimal, cost: Decimal) -> Self {
        self.next_kwh = Some(kwh);
        self.next_rate = Some(rate);
        self.next_cost = Some(cost);
        self
    }

    pub fn with_cbc(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.cbc_rate = Some(rate);
        self.cbc_cost = Some(cost);
        self
    }

    pub fn with_mfc(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.mfc_rate = Some(rate);
        self.mfc_cost = Some(cost);
        self
    }

    pub fn with_psc(mut self, rate: Decimal, cost: Decimal, total_cost: Decimal) -> Self {
        self.psc_rate = Some(rate);
        self.psc_cost = Some(cost);
        self.psc_total_cost = Some(total_cost);
        self
    }

    pub fn with_der(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.der_rate = Some(rate);
        self.der_cost = Some(cost);
        self
    }

    pub fn with_dsa(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.dsa_rate = Some(rate);
        self.dsa_cost = Some(cost);
        self
    }

    pub fn with_rda(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.rda_rate = Some(rate);
        self.rda_cost = Some(cost);
        self
    }

    pub fn with_nysa(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.nysa_rate = Some(rate);
        self.nysa_cost = Some(cost);
        self
    }

    pub fn with_rbp(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.rbp_rate = Some(rate);
        self.rbp_cost = Some(cost);
        self
    }

    pub fn with_spta(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.spta_rate = Some(rate);
        self.spta_cost = Some(cost);
        self
    }

    pub fn with_st(mut self, rate: Decimal, cost: Decimal) -> Self {
        self.st_rate = Some(rate);
        self.st_cost = Some(cost);
        self
    }

    /// Two-phase update: the present fields land first, then the
    /// actual-vs-estimated flag, which travels in raw storage form, is
    /// normalized to a strict bool after everything else has been applied.
    pub fn apply_update(&mut self, patch: &ElectricBillPatch) -> Result<()> {
        self.core.apply_update(&patch.core);
        if let Some(total_kwh) = patch.total_kwh {
            self.total_kwh = total_kwh;
        }
        if let Some(eh_kwh) = patch.eh_kwh {
            self.eh_kwh = eh_kwh;
        }
        if let Some(bank_kwh) = patch.bank_kwh {
            self.bank_kwh = bank_kwh;
        }
        if let Some(bs_rate) = patch.bs_rate {
            self.bs_rate = bs_rate;
        }
        if let Some(bs_cost) = patch.bs_cost {
            self.bs_cost = bs_cost;
        }
        if let Some(first_kwh) = patch.first_kwh {
            self.first_kwh = first_kwh;
        }
        if let Some(first_rate) = patch.first_rate {
            self.first_rate = first_rate;
        }
        if let Some(first_cost) = patch.first_cost {
            self.first_cost = first_cost;
        }
        if let Some(next_kwh) = patch.next_kwh {
            self.next_kwh = next_kwh;
        }
        if let Some(next_rate) = patch.next_rate {
            self.next_rate = next_rate;
        }
        if let Some(next_cost) = patch.next_cost {
            self.next_cost = next_cost;
        }
        if let Some(cbc_rate) = patch.cbc_rate {
            self.cbc_rate = cbc_rate;
        }
        if let Some(cbc_cost) = patch.cbc_cost {
            self.cbc_cost = cbc_cost;
        }
        if let Some(mfc_rate) = patch.mfc_rate {
            self.mfc_rate = mfc_rate;
        }
        if let Some(mfc_cost) = patch.mfc_cost {
            self.mfc_cost = mfc_cost;
        }
        if let Some(dsc_total_cost) = patch.dsc_total_cost {
            self.dsc_total_cost = dsc_total_cost;
        }
        if let Some(psc_rate) = patch.psc_rate {
            self.psc_rate = psc_rate;
        }
        if let Some(psc_cost) = patch.psc_cost {
            self.psc_cost = psc_cost;
        }
        if let Some(psc_total_cost) = patch.psc_total_cost {
            self.psc_total_cost = psc_total_cost;
        }
        if let Some(der_rate) = patch.der_rate {
            self.der_rate = der_rate;
        }
        if let Some(der_cost) = patch.der_cost {
            self.der_cost = der_cost;
        }
        if let Some(dsa_rate) = patch.dsa_rate {
            self.dsa_rate = dsa_rate;
        }
        if let Some(dsa_cost) = patch.dsa_cost {
            self.dsa_cost = dsa_cost;
        }
        if let Some(rda_rate) = patch.rda_rate {
            self.rda_rate = rda_rate;
        }
        if let Some(rda_cost) = patch.rda_cost {
            self.rda_cost = rda_cost;
        }
        if let Some(nysa_rate) = patch.nysa_rate {
            self.nysa_rate = nysa_rate;
        }
        if let Some(nysa_cost) = patch.nysa_cost {
            self.nysa_cost = nysa_cost;
        }
        if let Some(rbp_rate) = patch.rbp_rate {
            self.rbp_rate = rbp_rate;
        }
        if let Some(rbp_cost) = patch.rbp_cost {
            self.rbp_cost = rbp_cost;
        }
        if let Some(spta_rate) = patch.spta_rate {
            self.spta_rate = spta_rate;
        }
        if let Some(spta_cost) = patch.spta_cost {
            self.spta_cost = spta_cost;
        }
        if let Some(st_rate) = patch.st_rate {
            self.st_rate = st_rate;
        }
        if let Some(st_cost) = patch.st_cost {
            self.st_cost = st_cost;
        }
        if let Some(toc_total_cost) = patch.toc_total_cost {
            self.toc_total_cost = toc_total_cost;
        }

        self.finalize_is_actual(patch.is_actual);
        Ok(())
    }

    /// Phase two of an update: coerce the raw 0/1 flag to a bool. Runs
    /// after every other field write.
    fn finalize_is_actual(&mut self, raw: Option<i64>) {
        if let Some(raw) = raw {
            self.is_actual = raw != 0;
        }
    }

    /// Flat relational-insert shape. The flag goes out in raw numeric form.
    pub fn to_record(&self) -> ElectricBillRecord {
        ElectricBillRecord {
            real_estate_id: self.core.real_estate.id,
            service_provider_id: self.core.service_provider.id,
            start_date: self.core.start_date(),
            end_date: self.core.end_date(),
            total_cost: self.core.total_cost,
            paid_date: self.core.paid_date(),
            notes: self.core.notes.clone(),
            is_actual: i64::from(self.is_actual),
            total_kwh: self.total_kwh,
            eh_kwh: self.eh_kwh,
            bank_kwh: self.bank_kwh,
            bs_rate: self.bs_rate,
            bs_cost: self.bs_cost,
            first_kwh: self.first_kwh,
            first_rate: self.first_rate,
            first_cost: self.first_cost,
            next_kwh: self.next_kwh,
            next_rate: self.next_rate,
            next_cost: self.next_cost,
            cbc_rate: self.cbc_rate,
            cbc_cost: self.cbc_cost,
            mfc_rate: self.mfc_rate,
            mfc_cost: self.mfc_cost,
            dsc_total_cost: self.dsc_total_cost,
            psc_rate: self.psc_rate,
            psc_cost: self.psc_cost,
            psc_total_cost: self.psc_total_cost,
            der_rate: self.der_rate,
            der_cost: self.der_cost,
            dsa_rate: self.dsa_rate,
            dsa_cost: self.dsa_cost,
            rda_rate: self.rda_rate,
            rda_cost: self.rda_cost,
            nysa_rate: self.nysa_rate,
            nysa_cost: self.nysa_cost,
            rbp_rate: self.rbp_rate,
            rbp_cost: self.rbp_cost,
            spta_rate: self.spta_rate,
            spta_cost: self.spta_cost,
            st_rate: self.st_rate,
            st_cost: self.st_cost,
            toc_total_cost: self.toc_total_cost,
        }
    }

    /// Rebuild a bill from its record plus the referenced records the
    /// caller resolved from the record's ids. The raw flag is normalized
    /// last, after all field values are in place.
    pub fn from_record(
        record: ElectricBillRecord,
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
    ) -> Self {
        let mut bill = ElectricBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                record.start_date,
                record.end_date,
                record.total_cost,
            )
            .with_paid_date(record.paid_date)
            .with_notes(record.notes),
            is_actual: false,
            total_kwh: record.total_kwh,
            eh_kwh: record.eh_kwh,
            bank_kwh: record.bank_kwh,
            bs_rate: record.bs_rate,
            bs_cost: record.bs_cost,
            first_kwh: record.first_kwh,
            first_rate: record.first_rate,
            first_cost: record.first_cost,
            next_kwh: record.next_kwh,
            next_rate: record.next_rate,
            next_cost: record.next_cost,
            cbc_rate: record.cbc_rate,
            cbc_cost: record.cbc_cost,
            mfc_rate: record.mfc_rate,
            mfc_cost: record.mfc_cost,
            dsc_total_cost: record.dsc_total_cost,
            psc_rate: record.psc_rate,
            psc_cost: record.psc_cost,
            psc_total_cost: record.psc_total_cost,
            der_rate: record.der_rate,
            der_cost: record.der_cost,
            dsa_rate: record.dsa_rate,
            dsa_cost: record.dsa_cost,
            rda_rate: record.rda_rate,
            rda_cost: record.rda_cost,
            nysa_rate: record.nysa_rate,
            nysa_cost: record.nysa_cost,
            rbp_rate: record.rbp_rate,
            rbp_cost: record.rbp_cost,
            spta_rate: record.spta_rate,
            spta_cost: record.spta_cost,
            st_rate: record.st_rate,
            st_cost: record.st_cost,
            toc_total_cost: record.toc_total_cost,
        };
        bill.finalize_is_actual(Some(record.is_actual));
        bill
    }

    pub fn to_row(&self) -> Row {
        let mut row = self.core.to_row();
        row.push("is_actual", self.is_actual.to_string());
        row.push("total_kwh", self.total_kwh.to_string());
        row.push("eh_kwh", self.eh_kwh.to_string());
        row.push("bank_kwh", self.bank_kwh.to_string());
        row.push("bs_rate", self.bs_rate.to_string());
        row.push("bs_cost", self.bs_cost.to_string());
        row.push("first_kwh", opt_cell(self.first_kwh.as_ref()));
        row.push("first_rate", opt_cell(self.first_rate.as_ref()));
        row.push("first_cost", opt_cell(self.first_cost.as_ref()));
        row.push("next_kwh", opt_cell(self.next_kwh.as_ref()));
        row.push("next_rate", opt_cell(self.next_rate.as_ref()));
        row.push("next_cost", opt_cell(self.next_cost.as_ref()));
        row.push("cbc_rate", opt_cell(self.cbc_rate.as_ref()));
        row.push("cbc_cost", opt_cell(self.cbc_cost.as_ref()));
        row.push("mfc_rate", opt_cell(self.mfc_rate.as_ref()));
        row.push("mfc_cost", opt_cell(self.mfc_cost.as_ref()));
        row.push("dsc_total_cost", self.dsc_total_cost.to_string());
        row.push("psc_rate", opt_cell(self.psc_rate.as_ref()));
        row.push("psc_cost", opt_cell(self.psc_cost.as_ref()));
        row.push("psc_total_cost", opt_cell(self.psc_total_cost.as_ref()));
        row.push("der_rate", opt_cell(self.der_rate.as_ref()));
        row.push("der_cost", opt_cell(self.der_cost.as_ref()));
        row.push("dsa_rate", opt_cell(self.dsa_rate.as_ref()));
        row.push("dsa_cost", opt_cell(self.dsa_cost.as_ref()));
        row.push("rda_rate", opt_cell(self.rda_rate.as_ref()));
        row.push("rda_cost", opt_cell(self.rda_cost.as_ref()));
        row.push("nysa_rate", opt_cell(self.nysa_rate.as_ref()));
        row.push("nysa_cost", opt_cell(self.nysa_cost.as_ref()));
        row.push("rbp_rate", opt_cell(self.rbp_rate.as_ref()));
        row.push("rbp_cost", opt_cell(self.rbp_cost.as_ref()));
        row.push("spta_rate", opt_cell(self.spta_rate.as_ref()));
        row.push("spta_cost", opt_cell(self.spta_cost.as_ref()));
        row.push("st_rate", opt_cell(self.st_rate.as_ref()));
        row.push("st_cost", opt_cell(self.st_cost.as_ref()));
        row.push("toc_total_cost", self.toc_total_cost.to_string());
        row
    }
}

// ============================================================================
// RECORD AND PATCH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricBillRecord {
    pub real_estate_id: Option<i64>,
    pub service_provider_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Raw storage form of the flag: 1 actual, 0 estimated
    pub is_actual: i64,
    pub total_kwh: i64,
    pub eh_kwh: i64,
    pub bank_kwh: i64,
    pub bs_rate: Decimal,
    pub bs_cost: Decimal,
    pub first_kwh: Option<i64>,
    pub first_rate: Option<Decimal>,
    pub first_cost: Option<Decimal>,
    pub next_kwh: Option<i64>,
    pub next_rate: Option<Decimal>,
    pub next_cost: Option<Decimal>,
    pub cbc_rate: Option<Decimal>,
    pub cbc_cost: Option<Decimal>,
    pub mfc_rate: Option<Decimal>,
    pub mfc_cost: Option<Decimal>,
    pub dsc_total_cost: Decimal,
    pub psc_rate: Option<Decimal>,
    pub psc_cost: Option<Decimal>,
    pub psc_total_cost: Option<Decimal>,
    pub der_rate: Option<Decimal>,
    pub der_cost: Option<Decimal>,
    pub dsa_rate: Option<Decimal>,
    pub dsa_cost: Option<Decimal>,
    pub rda_rate: Option<Decimal>,
    pub rda_cost: Option<Decimal>,
    pub nysa_rate: Option<Decimal>,
    pub nysa_cost: Option<Decimal>,
    pub rbp_rate: Option<Decimal>,
    pub rbp_cost: Option<Decimal>,
    pub spta_rate: Option<Decimal>,
    pub spta_cost: Option<Decimal>,
    pub st_rate: Option<Decimal>,
    pub st_cost: Option<Decimal>,
    pub toc_total_cost: Decimal,
}

/// Partial update for an electric bill. The flag field carries the raw
/// storage form; `apply_update` normalizes it in its second phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectricBillPatch {
    pub core: CorePatch,
    pub is_actual: Option<i64>,
    pub total_kwh: Option<i64>,
    pub eh_kwh: Option<i64>,
    pub bank_kwh: Option<i64>,
    pub bs_rate: Option<Decimal>,
    pub bs_cost: Option<Decimal>,
    pub first_kwh: Option<Option<i64>>,
    pub first_rate: Option<Option<Decimal>>,
    pub first_cost: Option<Option<Decimal>>,
    pub next_kwh: Option<Option<i64>>,
    pub next_rate: Option<Option<Decimal>>,
    pub next_cost: Option<Option<Decimal>>,
    pub cbc_rate: Option<Option<Decimal>>,
    pub cbc_cost: Option<Option<Decimal>>,
    pub mfc_rate: Option<Option<Decimal>>,
    pub mfc_cost: Option<Option<Decimal>>,
    pub dsc_total_cost: Option<Decimal>,
    pub psc_rate: Option<Option<Decimal>>,
    pub psc_cost: Option<Option<Decimal>>,
    pub psc_total_cost: Option<Option<Decimal>>,
    pub der_rate: Option<Option<Decimal>>,
    pub der_cost: Option<Option<Decimal>>,
    pub dsa_rate: Option<Option<Decimal>>,
    pub dsa_cost: Option<Option<Decimal>>,
    pub rda_rate: Option<Option<Decimal>>,
    pub rda_cost: Option<Option<Decimal>>,
    pub nysa_rate: Option<Option<Decimal>>,
    pub nysa_cost: Option<Option<Decimal>>,
    pub rbp_rate: Option<Option<Decimal>>,
    pub rbp_cost: Option<Option<Decimal>>,
    pub spta_rate: Option<Option<Decimal>>,
    pub spta_cost: Option<Option<Decimal>>,
    pub st_rate: Option<Option<Decimal>>,
    pub st_cost: Option<Option<Decimal>>,
    pub toc_total_cost: Option<Decimal>,
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

    fn dec(mantissa: i64, scale: u32) -> Decimal {
        Decimal::new(mantissa, scale)
    }

    fn sample_bill() -> ElectricBill {
        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        ElectricBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::PsegUti).unwrap(),
            d(2024, 6, 15),
            d(2024, 7, 16),
            817,
            0,
            91,
            dec(17796, 2),
            dec(6500, 4),
            dec(2145, 2),
            dec(9862, 2),
            dec(1259, 2),
            true,
        )
    }

    #[test]
    fn test_new_leaves_line_items_absent() {
        let bill = sample_bill();

        assert!(bill.is_actual);
        assert_eq!(bill.total_kwh, 817);
        assert_eq!(bill.first_kwh, None);
        assert_eq!(bill.psc_total_cost, None);
        assert_eq!(bill.st_cost, None);
        assert_eq!(bill.toc_total_cost, dec(1259, 2));
    }

    #[test]
    fn test_builders_fill_line_item_groups() {
        let bill = sample_bill()
            .with_first_tier(250, dec(1049, 4), dec(2623, 2))
            .with_next_tier(567, dec(734, 4), dec(4162, 2))
            .with_psc(dec(1102, 4), dec(9003, 2), dec(9003, 2))
            .with_st(dec(250, 4), dec(432, 2));

        assert_eq!(bill.first_kwh, Some(250));
        assert_eq!(bill.next_rate, Some(dec(734, 4)));
        assert_eq!(bill.psc_total_cost, Some(dec(9003, 2)));
        assert_eq!(bill.st_cost, Some(dec(432, 2)));
        assert_eq!(bill.cbc_rate, None);
    }

    #[test]
    fn test_record_carries_raw_flag() {
        let actual = sample_bill().to_record();
        assert_eq!(actual.is_actual, 1);

        let mut estimated = sample_bill();
        estimated.is_actual = false;
        assert_eq!(estimated.to_record().is_actual, 0);
    }

    #[test]
    fn test_record_round_trip_with_line_items() {
        let bill = sample_bill()
            .with_paid_date(Some(d(2024, 7, 20)))
            .with_first_tier(250, dec(1049, 4), dec(2623, 2))
            .with_cbc(dec(69, 4), dec(56, 2))
            .with_rda(dec(-23, 4), dec(-19, 2));
        let record = bill.to_record();

        let rebuilt = ElectricBill::from_record(
            record,
            bill.core.real_estate.clone(),
            bill.core.service_provider.clone(),
        );
        assert_eq!(rebuilt, bill);
        assert!(rebuilt.is_actual);
        assert_eq!(rebuilt.rda_cost, Some(dec(-19, 2)));
    }

    #[test]
    fn test_from_record_normalizes_flag_last() {
        let mut record = sample_bill().to_record();
        record.is_actual = 0;

        let source = sample_bill();
        let rebuilt = ElectricBill::from_record(
            record,
            source.core.real_estate.clone(),
            source.core.service_provider.clone(),
        );
        assert!(!rebuilt.is_actual);
    }

    #[test]
    fn test_apply_update_coerces_raw_flag() {
        let mut bill = sample_bill();

        let patch = ElectricBillPatch {
            is_actual: Some(0),
            total_kwh: Some(900),
            ..Default::default()
        };
        bill.apply_update(&patch).unwrap();
        assert!(!bill.is_actual);
        assert_eq!(bill.total_kwh, 900);

        bill.apply_update(&ElectricBillPatch {
            is_actual: Some(1),
            ..Default::default()
        })
        .unwrap();
        assert!(bill.is_actual);
    }

    #[test]
    fn test_apply_update_is_idempotent() {
        let mut bill = sample_bill();
        let patch = ElectricBillPatch {
            is_actual: Some(0),
            bank_kwh: Some(120),
            first_kwh: Some(Some(300)),
            psc_total_cost: Some(None),
            ..Default::default()
        };

        bill.apply_update(&patch).unwrap();
        let once = bill.clone();
        bill.apply_update(&patch).unwrap();

        assert_eq!(bill, once);
        assert_eq!(bill.first_kwh, Some(300));
        assert_eq!(bill.psc_total_cost, None);
    }

    #[test]
    fn test_to_row_column_order() {
        let row = sample_bill().to_row();
        let columns = row.columns();

        let is_actual_pos = columns.iter().position(|c| *c == "is_actual").unwrap();
        assert_eq!(columns[is_actual_pos - 1], "notes");
        assert_eq!(columns[is_actual_pos + 1], "total_kwh");
        assert_eq!(*columns.last().unwrap(), "toc_total_cost");

        assert_eq!(row.get("is_actual"), Some("true"));
        assert_eq!(row.get("bs_rate"), Some("0.6500"));
        assert_eq!(row.get("first_kwh"), Some(""));
    }
}
