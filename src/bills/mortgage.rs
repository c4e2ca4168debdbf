// Mortgage bills - payment breakdown on top of the shared core

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::bills::core::{BillCore, CorePatch};
use crate::entities::{RealEstate, ServiceProvider};
use crate::error::Result;
use crate::row::Row;

// ============================================================================
// MORTGAGE BILL
// ============================================================================

/// A monthly mortgage statement. The total breaks down into principal,
/// interest, escrow and other payments; the statement also reports the
/// outstanding principal and escrow balance. No extra validation.
#[derive(Debug, Clone, PartialEq)]
pub struct MortgageBill {
    pub core: BillCore,
    /// Outstanding principal before the principal payment is applied
    pub outs_prin: Decimal,
    /// Escrow balance
    pub esc_bal: Decimal,
    /// Principal payment
    pub prin_pmt: Decimal,
    /// Interest payment
    pub int_pmt: Decimal,
    /// Escrow payment
    pub esc_pmt: Decimal,
    /// Other payment
    pub other_pmt: Decimal,
}

impl MortgageBill {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        total_cost: Decimal,
        outs_prin: Decimal,
        esc_bal: Decimal,
        prin_pmt: Decimal,
        int_pmt: Decimal,
        esc_pmt: Decimal,
        other_pmt: Decimal,
    ) -> Self {
        MortgageBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                start_date,
                end_date,
                total_cost,
            ),
            outs_prin,
            esc_bal,
            prin_pmt,
            int_pmt,
            esc_pmt,
            other_pmt,
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
    pub fn apply_update(&mut self, patch: &MortgageBillPatch) -> Result<()> {
        self.core.apply_update(&patch.core);
        if let Some(outs_prin) = patch.outs_prin {
            self.outs_prin = outs_prin;
        }
        if let Some(esc_bal) = patch.esc_bal {
            self.esc_bal = esc_bal;
        }
        if let Some(prin_pmt) = patch.prin_pmt {
            self.prin_pmt = prin_pmt;
        }
        if let Some(int_pmt) = patch.int_pmt {
            self.int_pmt = int_pmt;
        }
        if let Some(esc_pmt) = patch.esc_pmt {
            self.esc_pmt = esc_pmt;
        }
        if let Some(other_pmt) = patch.other_pmt {
            self.other_pmt = other_pmt;
        }
        Ok(())
    }

    pub fn to_record(&self) -> MortgageBillRecord {
        MortgageBillRecord {
            real_estate_id: self.core.real_estate.id,
            service_provider_id: self.core.service_provider.id,
            start_date: self.core.start_date(),
            end_date: self.core.end_date(),
            total_cost: self.core.total_cost,
            paid_date: self.core.paid_date(),
            notes: self.core.notes.clone(),
            outs_prin: self.outs_prin,
            esc_bal: self.esc_bal,
            prin_pmt: self.prin_pmt,
            int_pmt: self.int_pmt,
            esc_pmt: self.esc_pmt,
            other_pmt: self.other_pmt,
        }
    }

    pub fn from_record(
        record: MortgageBillRecord,
        real_estate: Arc<RealEstate>,
        service_provider: Arc<ServiceProvider>,
    ) -> Self {
        MortgageBill {
            core: BillCore::new(
                real_estate,
                service_provider,
                record.start_date,
                record.end_date,
                record.total_cost,
            )
            .with_paid_date(record.paid_date)
            .with_notes(record.notes),
            outs_prin: record.outs_prin,
            esc_bal: record.esc_bal,
            prin_pmt: record.prin_pmt,
            int_pmt: record.int_pmt,
            esc_pmt: record.esc_pmt,
            other_pmt: record.other_pmt,
        }
    }

    pub fn to_row(&self) -> Row {
        let mut row = self.core.to_row();
        row.push("outs_prin", self.outs_prin.to_string());
        row.push("esc_bal", self.esc_bal.to_string());
        row.push("prin_pmt", self.prin_pmt.to_string());
        row.push("int_pmt", self.int_pmt.to_string());
        row.push("esc_pmt", self.esc_pmt.to_string());
        row.push("other_pmt", self.other_pmt.to_string());
        row
    }
}

// ============================================================================
// RECORD AND PATCH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageBillRecord {
    pub real_estate_id: Option<i64>,
    pub service_provider_id: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_cost: Decimal,
    pub paid_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub outs_prin: Decimal,
    pub esc_bal: Decimal,
    pub prin_pmt: Decimal,
    pub int_pmt: Decimal,
    pub esc_pmt: Decimal,
    pub other_pmt: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MortgageBillPatch {
    pub core: CorePatch,
    pub outs_prin: Option<Decimal>,
    pub esc_bal: Option<Decimal>,
    pub prin_pmt: Option<Decimal>,
    pub int_pmt: Option<Decimal>,
    pub esc_pmt: Option<Decimal>,
    pub other_pmt: Option<Decimal>,
}

// ============================================================================
// TESTS
// ============================================================================
