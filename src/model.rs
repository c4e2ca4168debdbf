// Workflow layer for simple bills: file import/export and database access

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::bills::SimpleBill;
use crate::config::Config;
use crate::db;
use crate::entities::{
    Address, ProviderKind, RealEstateRegistry, RealPropertyValuesRegistry,
    ServiceProviderRegistry,
};
use crate::error::{BillError, Result};

// ============================================================================
// CSV FILE FORMAT
// ============================================================================

/// One bill as it appears in an import/export file. Every cell travels as
/// raw text; dates and costs are parsed per column on import so a bad cell
/// can be reported by name.
#[derive(Debug, Serialize, Deserialize)]
struct SimpleBillCsvRow {
    address: String,
    provider: String,
    start_date: String,
    end_date: String,
    total_cost: String,
    paid_date: Option<String>,
    notes: Option<String>,
}

impl SimpleBillCsvRow {
    fn from_bill(bill: &SimpleBill) -> Self {
        SimpleBillCsvRow {
            address: bill.core.real_estate.address.value().to_string(),
            provider: bill.core.service_provider.provider.value().to_string(),
            start_date: bill.core.start_date().to_string(),
            end_date: bill.core.end_date().to_string(),
            total_cost: bill.core.total_cost.to_string(),
            paid_date: bill.core.paid_date().map(|d| d.to_string()),
            notes: bill.core.notes.clone(),
        }
    }
}

fn parse_date_field(column: &'static str, value: &str) -> Result<NaiveDate> {
    value
        .trim()
        .parse()
        .map_err(|e: chrono::ParseError| BillError::BadField {
            column,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_cost_field(column: &'static str, value: &str) -> Result<Decimal> {
    value
        .trim()
        .parse()
        .map_err(|e: rust_decimal::Error| BillError::BadField {
            column,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

// ============================================================================
// SIMPLE BILL MODEL
// ============================================================================

/// Holds the database connection, the reference registries, and the
/// directory bill files are read from and written to.
pub struct SimpleBillModel {
    conn: Connection,
    files_dir: PathBuf,
    estates: RealEstateRegistry,
    providers: ServiceProviderRegistry,
}

impl SimpleBillModel {
    pub fn new(config: &Config) -> Result<Self> {
        config.ensure_dirs()?;
        let conn = db::open_database(&config.db_path)?;
        Self::with_connection(conn, config.files_dir.clone())
    }

    /// Build a model around an existing connection. Seeds the default
    /// reference rows on first run, then loads the registries back from
    /// storage so lookups match the persisted rows.
    pub fn with_connection(conn: Connection, files_dir: PathBuf) -> Result<Self> {
        db::setup_database(&conn)?;

        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        let values = RealPropertyValuesRegistry::with_defaults();
        db::seed_reference_tables(&conn, &estates, &providers, &values)?;

        let (estates, providers, _values) = db::load_registries(&conn)?;

        Ok(SimpleBillModel {
            conn,
            files_dir,
            estates,
            providers,
        })
    }

    /// Providers this model accepts. Electric, gas, and mortgage bills
    /// have richer variants and are handled outside the simple flow.
    pub fn valid_providers(&self) -> Vec<ProviderKind> {
        vec![
            ProviderKind::DepDep,
            ProviderKind::HdSup,
            ProviderKind::KpcCm,
            ProviderKind::NbIns,
            ProviderKind::OcUti,
            ProviderKind::ScwaUti,
            ProviderKind::ScTax,
            ProviderKind::WmtSup,
            ProviderKind::WpRep,
            ProviderKind::ViUti,
        ]
    }

    /// Read one bill from `filename` in the files directory. Only the
    /// first data row is used. The returned bill has no id; `paid_date`
    /// and `notes` are taken from the file when present.
    pub fn process_bill_file(&self, filename: &str) -> Result<SimpleBill> {
        let path = self.files_dir.join(filename);
        let mut reader = csv::Reader::from_path(&path)?;
        let row: SimpleBillCsvRow = reader
            .deserialize()
            .next()
            .ok_or(BillError::EmptyImport)??;

        let start_date = parse_date_field("start_date", &row.start_date)?;
        let end_date = parse_date_field("end_date", &row.end_date)?;
        let total_cost = parse_cost_field("total_cost", &row.total_cost)?;
        let paid_date = row
            .paid_date
            .as_deref()
            .map(|v| parse_date_field("paid_date", v))
            .transpose()?;

        let address = Address::to_address(&row.address)?;
        let real_estate = self
            .estates
            .find_by_address(address)
            .ok_or_else(|| BillError::UnknownAddress(row.address.clone()))?;

        let kind = ProviderKind::from_value(&row.provider)?;
        if !self.valid_providers().contains(&kind) {
            return Err(BillError::UnsupportedProvider(row.provider.clone()));
        }
        let service_provider = self
            .providers
            .find_by_kind(kind)
            .ok_or_else(|| BillError::UnknownProvider(row.provider.clone()))?;

        let bill = SimpleBill::new(
            real_estate,
            service_provider,
            start_date,
            end_date,
            total_cost,
        )
        .with_paid_date(paid_date)
        .with_notes(row.notes);

        info!(file = %path.display(), provider = kind.value(), "imported simple bill");
        Ok(bill)
    }

    /// Write `bill` to the files directory and return the file name.
    ///
    /// Name format: shortaddress_provider_startdate_enddate_N.csv. An
    /// existing file is never overwritten; N counts up until a free name
    /// is found.
    pub fn save_bill_to_file(&self, bill: &SimpleBill) -> Result<String> {
        let mut version = 1u32;
        let mut filename = bill_file_name(bill, version);
        while self.files_dir.join(&filename).exists() {
            version += 1;
            filename = bill_file_name(bill, version);
        }
        if version > 1 {
            warn!(file = %filename, "bill file already on disk, writing next version");
        }

        let path = self.files_dir.join(&filename);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.serialize(SimpleBillCsvRow::from_bill(bill))?;
        writer.flush()?;

        info!(file = %path.display(), "saved simple bill");
        Ok(filename)
    }

    pub fn insert_bill(&self, bill: &SimpleBill) -> Result<i64> {
        db::insert_simple_bill(&self.conn, &bill.to_record())
    }

    /// All stored simple bills, ordered by start date.
    pub fn bills(&self) -> Result<Vec<SimpleBill>> {
        db::read_simple_bills(&self.conn, &self.estates, &self.providers)
    }

    /// Stored bills for one property and provider starting on `start_date`.
    pub fn bills_by_provider_and_start(
        &self,
        address: Address,
        provider: ProviderKind,
        start_date: NaiveDate,
    ) -> Result<Vec<SimpleBill>> {
        let real_estate = self
            .estates
            .find_by_address(address)
            .ok_or_else(|| BillError::UnknownAddress(address.value().to_string()))?;
        let service_provider = self
            .providers
            .find_by_kind(provider)
            .ok_or_else(|| BillError::UnknownProvider(provider.value().to_string()))?;
        db::read_simple_bills_by_provider_and_start(
            &self.conn,
            &self.estates,
            &self.providers,
            &real_estate,
            &service_provider,
            start_date,
        )
    }

    pub fn bills_for_period(&self, month_year: &str) -> Result<Vec<SimpleBill>> {
        db::read_simple_bills_by_period(&self.conn, &self.estates, &self.providers, month_year)
    }

    pub fn unpaid_bills(&self) -> Result<Vec<SimpleBill>> {
        db::read_unpaid_simple_bills(&self.conn, &self.estates, &self.providers)
    }

    pub fn mark_paid(&self, id: i64, paid_date: NaiveDate) -> Result<()> {
        db::update_simple_bill_paid_date(&self.conn, id, Some(paid_date))
    }
}

fn bill_file_name(bill: &SimpleBill, version: u32) -> String {
    format!(
        "{}_{}_{}_{}_{}.csv",
        bill.core.real_estate.address.short_name(),
        bill.core.service_provider.provider.value(),
        bill.core.start_date(),
        bill.core.end_date(),
        version
    )
}

// ============================================================================
// TESTS
// ============================================================================
