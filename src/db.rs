// SQLite persistence for reference data and the four bill tables

use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use chrono::NaiveDate;

use crate::bills::{
    DepreciationBill, DepreciationBillRecord, ElectricBill, ElectricBillRecord,
    MortgageBill, MortgageBillRecord, SimpleBill, SimpleBillRecord,
    DEFAULT_MONTH_YEAR_THRESHOLD,
};
use crate::entities::{
    Address, ProviderKind, RealEstate, RealEstateRegistry, RealPropertyValues,
    RealPropertyValuesRegistry, ServiceProvider, ServiceProviderRegistry,
};
use crate::error::{BillError, Result};
use std::sync::Arc;

// ============================================================================
// SETUP
// ============================================================================

/// Open (or create) the database file and make sure the schema exists.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;

    // ==========================================================================
    // Reference tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS real_estate (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            address TEXT UNIQUE NOT NULL,
            street_num TEXT NOT NULL,
            street_name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            zip_code TEXT NOT NULL,
            apt TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS service_provider (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            provider TEXT UNIQUE NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS real_property_values (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            real_estate_id INTEGER NOT NULL REFERENCES real_estate(id),
            item TEXT NOT NULL,
            purchase_date TEXT NOT NULL,
            cost_basis TEXT NOT NULL,
            dep_class TEXT NOT NULL,
            notes TEXT
        )",
        [],
    )?;

    // ==========================================================================
    // Bill tables, one per variant
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS simple_bill_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            real_estate_id INTEGER NOT NULL REFERENCES real_estate(id),
            service_provider_id INTEGER NOT NULL REFERENCES service_provider(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            total_cost TEXT NOT NULL,
            paid_date TEXT,
            notes TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS mortgage_bill_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            real_estate_id INTEGER NOT NULL REFERENCES real_estate(id),
            service_provider_id INTEGER NOT NULL REFERENCES service_provider(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            total_cost TEXT NOT NULL,
            paid_date TEXT,
            notes TEXT,
            outs_prin TEXT NOT NULL,
            esc_bal TEXT NOT NULL,
            prin_pmt TEXT NOT NULL,
            int_pmt TEXT NOT NULL,
            esc_pmt TEXT NOT NULL,
            other_pmt TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS depreciation_bill_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            real_estate_id INTEGER NOT NULL REFERENCES real_estate(id),
            service_provider_id INTEGER NOT NULL REFERENCES service_provider(id),
            real_property_values_id INTEGER NOT NULL REFERENCES real_property_values(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            total_cost TEXT NOT NULL,
            paid_date TEXT,
            notes TEXT,
            period_usage_pct TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS electric_bill_data (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            real_estate_id INTEGER NOT NULL REFERENCES real_estate(id),
            service_provider_id INTEGER NOT NULL REFERENCES service_provider(id),
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            total_cost TEXT NOT NULL,
            paid_date TEXT,
            notes TEXT,
            is_actual INTEGER NOT NULL,
            total_kwh INTEGER NOT NULL,
            eh_kwh INTEGER NOT NULL,
            bank_kwh INTEGER NOT NULL,
            bs_rate TEXT NOT NULL,
            bs_cost TEXT NOT NULL,
            first_kwh INTEGER,
            first_rate TEXT,
            first_cost TEXT,
            next_kwh INTEGER,
            next_rate TEXT,
            next_cost TEXT,
            cbc_rate TEXT,
            cbc_cost TEXT,
            mfc_rate TEXT,
            mfc_cost TEXT,
            dsc_total_cost TEXT NOT NULL,
            psc_rate TEXT,
            psc_cost TEXT,
            psc_total_cost TEXT,
            der_rate TEXT,
            der_cost TEXT,
            dsa_rate TEXT,
            dsa_cost TEXT,
            rda_rate TEXT,
            rda_cost TEXT,
            nysa_rate TEXT,
            nysa_cost TEXT,
            rbp_rate TEXT,
            rbp_cost TEXT,
            spta_rate TEXT,
            spta_cost TEXT,
            st_rate TEXT,
            st_cost TEXT,
            toc_total_cost TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_simple_start_date ON simple_bill_data(start_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_simple_paid_date ON simple_bill_data(paid_date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_electric_start_date ON electric_bill_data(start_date)",
        [],
    )?;

    info!("database schema ready");
    Ok(())
}

/// Write the registry entries into the reference tables. Rows already
/// present keep their stored values.
pub fn seed_reference_tables(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
    values: &RealPropertyValuesRegistry,
) -> Result<()> {
    for estate in estates.all() {
        if estate.id.is_none() {
            // NULL id lets SQLite assign one, which the in-memory entry
            // will not know about
            warn!(address = estate.address.value(), "seeding real estate without a fixed id");
        }
        conn.execute(
            "INSERT OR IGNORE INTO real_estate (
                id, address, street_num, street_name, city, state, zip_code, apt
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                estate.id,
                estate.address.value(),
                estate.street_num,
                estate.street_name,
                estate.city,
                estate.state,
                estate.zip_code,
                estate.apt,
            ],
        )?;
    }

    for provider in providers.all() {
        if provider.id.is_none() {
            warn!(provider = provider.provider.value(), "seeding service provider without a fixed id");
        }
        conn.execute(
            "INSERT OR IGNORE INTO service_provider (id, provider) VALUES (?1, ?2)",
            params![provider.id, provider.provider.value()],
        )?;
    }

    for value in values.all() {
        if value.id.is_none() {
            warn!(item = %value.item, "seeding property value without a fixed id");
        }
        conn.execute(
            "INSERT OR IGNORE INTO real_property_values (
                id, real_estate_id, item, purchase_date, cost_basis, dep_class, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                value.id,
                value.real_estate.id,
                value.item,
                value.purchase_date.to_string(),
                value.cost_basis.to_string(),
                value.dep_class,
                value.notes,
            ],
        )?;
    }

    info!(
        estates = estates.count(),
        providers = providers.count(),
        property_values = values.count(),
        "seeded reference tables"
    );
    Ok(())
}

// ============================================================================
// REGISTRY LOADING
// ============================================================================

/// Rebuild the in-memory registries from the reference tables, so lookups
/// reflect exactly what storage knows about. `with_defaults()` is for tests
/// and first-run seeding; a running model loads from here.
pub fn load_registries(
    conn: &Connection,
) -> Result<(
    RealEstateRegistry,
    ServiceProviderRegistry,
    RealPropertyValuesRegistry,
)> {
    let mut estates = RealEstateRegistry::new();
    let mut stmt = conn.prepare(
        "SELECT id, address, street_num, street_name, city, state, zip_code, apt
         FROM real_estate ORDER BY id",
    )?;
    let estate_rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (id, address, street_num, street_name, city, state, zip_code, apt) in estate_rows {
        estates.register(RealEstate {
            id: Some(id),
            address: Address::to_address(&address)?,
            street_num,
            street_name,
            city,
            state,
            zip_code,
            apt,
        });
    }

    let mut providers = ServiceProviderRegistry::new();
    let mut stmt = conn.prepare("SELECT id, provider FROM service_provider ORDER BY id")?;
    let provider_rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (id, value) in provider_rows {
        providers.register(ServiceProvider::new(ProviderKind::from_value(&value)?).with_id(id));
    }

    let mut values = RealPropertyValuesRegistry::new();
    let mut stmt = conn.prepare(
        "SELECT id, real_estate_id, item, purchase_date, cost_basis, dep_class, notes
         FROM real_property_values ORDER BY id",
    )?;
    let value_rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                parse_date(3, row.get(3)?)?,
                parse_decimal(4, row.get(4)?)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (id, real_estate_id, item, purchase_date, cost_basis, dep_class, notes) in value_rows {
        let real_estate = find_estate(&estates, real_estate_id)?;
        values.register(
            RealPropertyValues::new(real_estate, item, purchase_date, cost_basis, dep_class)
                .with_id(id)
                .with_notes(notes),
        );
    }

    debug!(
        estates = estates.count(),
        providers = providers.count(),
        property_values = values.count(),
        "loaded registries from storage"
    );
    Ok((estates, providers, values))
}

// ============================================================================
// COLUMN PARSING
// ============================================================================

fn parse_date(idx: usize, value: String) -> rusqlite::Result<NaiveDate> {
    value.parse().map_err(|e: chrono::ParseError| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_opt_date(idx: usize, value: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    value.map(|v| parse_date(idx, v)).transpose()
}

fn parse_decimal(idx: usize, value: String) -> rusqlite::Result<Decimal> {
    Decimal::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_opt_decimal(idx: usize, value: Option<String>) -> rusqlite::Result<Option<Decimal>> {
    value.map(|v| parse_decimal(idx, v)).transpose()
}

fn opt_text<T: ToString>(value: Option<T>) -> Option<String> {
    value.map(|v| v.to_string())
}

// ============================================================================
// REFERENCE RESOLUTION
// ============================================================================

fn find_estate(estates: &RealEstateRegistry, id: i64) -> Result<Arc<RealEstate>> {
    estates.find_by_id(id).ok_or(BillError::MissingReference {
        table: "real_estate",
        id,
    })
}

fn find_provider(
    providers: &ServiceProviderRegistry,
    id: i64,
) -> Result<Arc<ServiceProvider>> {
    providers.find_by_id(id).ok_or(BillError::MissingReference {
        table: "service_provider",
        id,
    })
}

fn find_property_value(
    values: &RealPropertyValuesRegistry,
    id: i64,
) -> Result<Arc<RealPropertyValues>> {
    values.find_by_id(id).ok_or(BillError::MissingReference {
        table: "real_property_values",
        id,
    })
}

// ============================================================================
// SIMPLE BILLS
// ============================================================================

const SIMPLE_SELECT: &str = "SELECT id, real_estate_id, service_provider_id, start_date, \
     end_date, total_cost, paid_date, notes FROM simple_bill_data";

pub fn insert_simple_bill(conn: &Connection, record: &SimpleBillRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO simple_bill_data (
            real_estate_id, service_provider_id, start_date, end_date,
            total_cost, paid_date, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            record.real_estate_id,
            record.service_provider_id,
            record.start_date.to_string(),
            record.end_date.to_string(),
            record.total_cost.to_string(),
            opt_text(record.paid_date),
            record.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(id, start_date = %record.start_date, "inserted simple bill");
    Ok(id)
}

fn map_simple_row(
    row: &rusqlite::Row<'_>,
) -> rusqlite::Result<(i64, i64, i64, SimpleBillRecord)> {
    let real_estate_id: i64 = row.get(1)?;
    let service_provider_id: i64 = row.get(2)?;
    let record = SimpleBillRecord {
        real_estate_id: Some(real_estate_id),
        service_provider_id: Some(service_provider_id),
        start_date: parse_date(3, row.get(3)?)?,
        end_date: parse_date(4, row.get(4)?)?,
        total_cost: parse_decimal(5, row.get(5)?)?,
        paid_date: parse_opt_date(6, row.get(6)?)?,
        notes: row.get(7)?,
    };
    Ok((row.get(0)?, real_estate_id, service_provider_id, record))
}

fn resolve_simple_rows(
    rows: Vec<(i64, i64, i64, SimpleBillRecord)>,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
) -> Result<Vec<SimpleBill>> {
    let mut bills = Vec::with_capacity(rows.len());
    for (id, real_estate_id, service_provider_id, record) in rows {
        let real_estate = find_estate(estates, real_estate_id)?;
        let service_provider = find_provider(providers, service_provider_id)?;
        let mut bill = SimpleBill::from_record(record, real_estate, service_provider);
        bill.core.id = Some(id);
        bills.push(bill);
    }
    Ok(bills)
}

pub fn read_simple_bills(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
) -> Result<Vec<SimpleBill>> {
    let sql = format!("{SIMPLE_SELECT} ORDER BY start_date, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_simple_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    resolve_simple_rows(rows, estates, providers)
}

/// Bills for one property and provider starting on an exact date. This is
/// the lookup used to re-find a bill after importing its file.
pub fn read_simple_bills_by_provider_and_start(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
    real_estate: &RealEstate,
    service_provider: &ServiceProvider,
    start_date: NaiveDate,
) -> Result<Vec<SimpleBill>> {
    let sql = format!(
        "{SIMPLE_SELECT} WHERE real_estate_id = ?1 AND service_provider_id = ?2 \
         AND start_date = ?3 ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![real_estate.id, service_provider.id, start_date.to_string()],
            map_simple_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    resolve_simple_rows(rows, estates, providers)
}

/// Bills whose billing period resolves to `month_year` ("YYYY-MM"). The
/// period rule matches `calc_bill_month_year`: the start month owns the
/// bill unless the start day is past the threshold.
pub fn read_simple_bills_by_period(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
    month_year: &str,
) -> Result<Vec<SimpleBill>> {
    let sql = format!(
        "{SIMPLE_SELECT} WHERE CASE \
             WHEN CAST(strftime('%d', start_date) AS INTEGER) <= ?2 \
             THEN strftime('%Y-%m', start_date) \
             ELSE strftime('%Y-%m', end_date) END = ?1 \
         ORDER BY start_date, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            params![month_year, DEFAULT_MONTH_YEAR_THRESHOLD],
            map_simple_row,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    resolve_simple_rows(rows, estates, providers)
}

pub fn read_unpaid_simple_bills(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
) -> Result<Vec<SimpleBill>> {
    let sql = format!("{SIMPLE_SELECT} WHERE paid_date IS NULL ORDER BY start_date, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], map_simple_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    resolve_simple_rows(rows, estates, providers)
}

pub fn update_simple_bill_paid_date(
    conn: &Connection,
    id: i64,
    paid_date: Option<NaiveDate>,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE simple_bill_data SET paid_date = ?1 WHERE id = ?2",
        params![opt_text(paid_date), id],
    )?;
    if changed == 0 {
        return Err(BillError::MissingReference {
            table: "simple_bill_data",
            id,
        });
    }
    debug!(id, paid_date = ?paid_date, "updated simple bill paid date");
    Ok(())
}

// ============================================================================
// MORTGAGE BILLS
// ============================================================================

pub fn insert_mortgage_bill(conn: &Connection, record: &MortgageBillRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO mortgage_bill_data (
            real_estate_id, service_provider_id, start_date, end_date,
            total_cost, paid_date, notes,
            outs_prin, esc_bal, prin_pmt, int_pmt, esc_pmt, other_pmt
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.real_estate_id,
            record.service_provider_id,
            record.start_date.to_string(),
            record.end_date.to_string(),
            record.total_cost.to_string(),
            opt_text(record.paid_date),
            record.notes,
            record.outs_prin.to_string(),
            record.esc_bal.to_string(),
            record.prin_pmt.to_string(),
            record.int_pmt.to_string(),
            record.esc_pmt.to_string(),
            record.other_pmt.to_string(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(id, start_date = %record.start_date, "inserted mortgage bill");
    Ok(id)
}

pub fn read_mortgage_bills(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
) -> Result<Vec<MortgageBill>> {
    let mut stmt = conn.prepare(
        "SELECT id, real_estate_id, service_provider_id, start_date, end_date,
                total_cost, paid_date, notes,
                outs_prin, esc_bal, prin_pmt, int_pmt, esc_pmt, other_pmt
         FROM mortgage_bill_data
         ORDER BY start_date, id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let real_estate_id: i64 = row.get(1)?;
            let service_provider_id: i64 = row.get(2)?;
            let record = MortgageBillRecord {
                real_estate_id: Some(real_estate_id),
                service_provider_id: Some(service_provider_id),
                start_date: parse_date(3, row.get(3)?)?,
                end_date: parse_date(4, row.get(4)?)?,
                total_cost: parse_decimal(5, row.get(5)?)?,
                paid_date: parse_opt_date(6, row.get(6)?)?,
                notes: row.get(7)?,
                outs_prin: parse_decimal(8, row.get(8)?)?,
                esc_bal: parse_decimal(9, row.get(9)?)?,
                prin_pmt: parse_decimal(10, row.get(10)?)?,
                int_pmt: parse_decimal(11, row.get(11)?)?,
                esc_pmt: parse_decimal(12, row.get(12)?)?,
                other_pmt: parse_decimal(13, row.get(13)?)?,
            };
            Ok((row.get::<_, i64>(0)?, real_estate_id, service_provider_id, record))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut bills = Vec::with_capacity(rows.len());
    for (id, real_estate_id, service_provider_id, record) in rows {
        let real_estate = find_estate(estates, real_estate_id)?;
        let service_provider = find_provider(providers, service_provider_id)?;
        let mut bill = MortgageBill::from_record(record, real_estate, service_provider);
        bill.core.id = Some(id);
        bills.push(bill);
    }
    Ok(bills)
}

// ============================================================================
// DEPRECIATION BILLS
// ============================================================================

pub fn insert_depreciation_bill(
    conn: &Connection,
    record: &DepreciationBillRecord,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO depreciation_bill_data (
            real_estate_id, service_provider_id, real_property_values_id,
            start_date, end_date, total_cost, paid_date, notes, period_usage_pct
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            record.real_estate_id,
            record.service_provider_id,
            record.real_property_values_id,
            record.start_date.to_string(),
            record.end_date.to_string(),
            record.total_cost.to_string(),
            opt_text(record.paid_date),
            record.notes,
            record.period_usage_pct.to_string(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(id, start_date = %record.start_date, "inserted depreciation bill");
    Ok(id)
}

pub fn read_depreciation_bills(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
    values: &RealPropertyValuesRegistry,
) -> Result<Vec<DepreciationBill>> {
    let mut stmt = conn.prepare(
        "SELECT id, real_estate_id, service_provider_id, real_property_values_id,
                start_date, end_date, total_cost, paid_date, notes, period_usage_pct
         FROM depreciation_bill_data
         ORDER BY start_date, id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let real_estate_id: i64 = row.get(1)?;
            let service_provider_id: i64 = row.get(2)?;
            let real_property_values_id: i64 = row.get(3)?;
            let record = DepreciationBillRecord {
                real_estate_id: Some(real_estate_id),
                service_provider_id: Some(service_provider_id),
                real_property_values_id: Some(real_property_values_id),
                start_date: parse_date(4, row.get(4)?)?,
                end_date: parse_date(5, row.get(5)?)?,
                total_cost: parse_decimal(6, row.get(6)?)?,
                paid_date: parse_opt_date(7, row.get(7)?)?,
                notes: row.get(8)?,
                period_usage_pct: parse_decimal(9, row.get(9)?)?,
            };
            Ok((
                row.get::<_, i64>(0)?,
                real_estate_id,
                service_provider_id,
                real_property_values_id,
                record,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut bills = Vec::with_capacity(rows.len());
    for (id, real_estate_id, service_provider_id, real_property_values_id, record) in rows {
        let real_estate = find_estate(estates, real_estate_id)?;
        let service_provider = find_provider(providers, service_provider_id)?;
        let real_property_value = find_property_value(values, real_property_values_id)?;
        let mut bill = DepreciationBill::from_record(
            record,
            real_estate,
            service_provider,
            real_property_value,
        )?;
        bill.set_id(Some(id));
        bills.push(bill);
    }
    Ok(bills)
}

// ============================================================================
// ELECTRIC BILLS
// ============================================================================

pub fn insert_electric_bill(conn: &Connection, record: &ElectricBillRecord) -> Result<i64> {
    conn.execute(
        "INSERT INTO electric_bill_data (
            real_estate_id, service_provider_id, start_date, end_date,
            total_cost, paid_date, notes, is_actual,
            total_kwh, eh_kwh, bank_kwh, bs_rate, bs_cost,
            first_kwh, first_rate, first_cost, next_kwh, next_rate, next_cost,
            cbc_rate, cbc_cost, mfc_rate, mfc_cost, dsc_total_cost,
            psc_rate, psc_cost, psc_total_cost, der_rate, der_cost,
            dsa_rate, dsa_cost, rda_rate, rda_cost, nysa_rate, nysa_cost,
            rbp_rate, rbp_cost, spta_rate, spta_cost, st_rate, st_cost,
            toc_total_cost
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                  ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26,
                  ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36, ?37, ?38,
                  ?39, ?40, ?41, ?42)",
        params![
            record.real_estate_id,
            record.service_provider_id,
            record.start_date.to_string(),
            record.end_date.to_string(),
            record.total_cost.to_string(),
            opt_text(record.paid_date),
            record.notes,
            record.is_actual,
            record.total_kwh,
            record.eh_kwh,
            record.bank_kwh,
            record.bs_rate.to_string(),
            record.bs_cost.to_string(),
            record.first_kwh,
            opt_text(record.first_rate),
            opt_text(record.first_cost),
            record.next_kwh,
            opt_text(record.next_rate),
            opt_text(record.next_cost),
            opt_text(record.cbc_rate),
            opt_text(record.cbc_cost),
            opt_text(record.mfc_rate),
            opt_text(record.mfc_cost),
            record.dsc_total_cost.to_string(),
            opt_text(record.psc_rate),
            opt_text(record.psc_cost),
            opt_text(record.psc_total_cost),
            opt_text(record.der_rate),
            opt_text(record.der_cost),
            opt_text(record.dsa_rate),
            opt_text(record.dsa_cost),
            opt_text(record.rda_rate),
            opt_text(record.rda_cost),
            opt_text(record.nysa_rate),
            opt_text(record.nysa_cost),
            opt_text(record.rbp_rate),
            opt_text(record.rbp_cost),
            opt_text(record.spta_rate),
            opt_text(record.spta_cost),
            opt_text(record.st_rate),
            opt_text(record.st_cost),
            record.toc_total_cost.to_string(),
        ],
    )?;
    let id = conn.last_insert_rowid();
    debug!(id, start_date = %record.start_date, "inserted electric bill");
    Ok(id)
}

pub fn read_electric_bills(
    conn: &Connection,
    estates: &RealEstateRegistry,
    providers: &ServiceProviderRegistry,
) -> Result<Vec<ElectricBill>> {
    let mut stmt = conn.prepare(
        "SELECT id, real_estate_id, service_provider_id, start_date, end_date,
                total_cost, paid_date, notes, is_actual,
                total_kwh, eh_kwh, bank_kwh, bs_rate, bs_cost,
                first_kwh, first_rate, first_cost, next_kwh, next_rate, next_cost,
                cbc_rate, cbc_cost, mfc_rate, mfc_cost, dsc_total_cost,
                psc_rate, psc_cost, psc_total_cost, der_rate, der_cost,
                dsa_rate, dsa_cost, rda_rate, rda_cost, nysa_rate, nysa_cost,
                rbp_rate, rbp_cost, spta_rate, spta_cost, st_rate, st_cost,
                toc_total_cost
         FROM electric_bill_data
         ORDER BY start_date, id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            let real_estate_id: i64 = row.get(1)?;
            let service_provider_id: i64 = row.get(2)?;
            let record = ElectricBillRecord {
                real_estate_id: Some(real_estate_id),
                service_provider_id: Some(service_provider_id),
                start_date: parse_date(3, row.get(3)?)?,
                end_date: parse_date(4, row.get(4)?)?,
                total_cost: parse_decimal(5, row.get(5)?)?,
                paid_date: parse_opt_date(6, row.get(6)?)?,
                notes: row.get(7)?,
                is_actual: row.get(8)?,
                total_kwh: row.get(9)?,
                eh_kwh: row.get(10)?,
                bank_kwh: row.get(11)?,
                bs_rate: parse_decimal(12, row.get(12)?)?,
                bs_cost: parse_decimal(13, row.get(13)?)?,
                first_kwh: row.get(14)?,
                first_rate: parse_opt_decimal(15, row.get(15)?)?,
                first_cost: parse_opt_decimal(16, row.get(16)?)?,
                next_kwh: row.get(17)?,
                next_rate: parse_opt_decimal(18, row.get(18)?)?,
                next_cost: parse_opt_decimal(19, row.get(19)?)?,
                cbc_rate: parse_opt_decimal(20, row.get(20)?)?,
                cbc_cost: parse_opt_decimal(21, row.get(21)?)?,
                mfc_rate: parse_opt_decimal(22, row.get(22)?)?,
                mfc_cost: parse_opt_decimal(23, row.get(23)?)?,
                dsc_total_cost: parse_decimal(24, row.get(24)?)?,
                psc_rate: parse_opt_decimal(25, row.get(25)?)?,
                psc_cost: parse_opt_decimal(26, row.get(26)?)?,
                psc_total_cost: parse_opt_decimal(27, row.get(27)?)?,
                der_rate: parse_opt_decimal(28, row.get(28)?)?,
                der_cost: parse_opt_decimal(29, row.get(29)?)?,
                dsa_rate: parse_opt_decimal(30, row.get(30)?)?,
                dsa_cost: parse_opt_decimal(31, row.get(31)?)?,
                rda_rate: parse_opt_decimal(32, row.get(32)?)?,
                rda_cost: parse_opt_decimal(33, row.get(33)?)?,
                nysa_rate: parse_opt_decimal(34, row.get(34)?)?,
                nysa_cost: parse_opt_decimal(35, row.get(35)?)?,
                rbp_rate: parse_opt_decimal(36, row.get(36)?)?,
                rbp_cost: parse_opt_decimal(37, row.get(37)?)?,
                spta_rate: parse_opt_decimal(38, row.get(38)?)?,
                spta_cost: parse_opt_decimal(39, row.get(39)?)?,
                st_rate: parse_opt_decimal(40, row.get(40)?)?,
                st_cost: parse_opt_decimal(41, row.get(41)?)?,
                toc_total_cost: parse_decimal(42, row.get(42)?)?,
            };
            Ok((row.get::<_, i64>(0)?, real_estate_id, service_provider_id, record))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut bills = Vec::with_capacity(rows.len());
    for (id, real_estate_id, service_provider_id, record) in rows {
        let real_estate = find_estate(estates, real_estate_id)?;
        let service_provider = find_provider(providers, service_provider_id)?;
        let mut bill = ElectricBill::from_record(record, real_estate, service_provider);
        bill.core.id = Some(id);
        bills.push(bill);
    }
    Ok(bills)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn seeded_conn() -> (
        Connection,
        RealEstateRegistry,
        ServiceProviderRegistry,
        RealPropertyValuesRegistry,
    ) {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();

        let estates = RealEstateRegistry::with_defaults();
        let providers = ServiceProviderRegistry::with_defaults();
        let values = RealPropertyValuesRegistry::with_defaults();
        seed_reference_tables(&conn, &estates, &providers, &values).unwrap();

        (conn, estates, providers, values)
    }

    fn simple_bill(
        estates: &RealEstateRegistry,
        providers: &ServiceProviderRegistry,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SimpleBill {
        SimpleBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::ScwaUti).unwrap(),
            start,
            end,
            Decimal::new(5250, 2),
        )
    }

    #[test]
    fn test_setup_database_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[test]
    fn test_seed_reference_tables_twice_keeps_counts() {
        let (conn, estates, providers, values) = seeded_conn();
        seed_reference_tables(&conn, &estates, &providers, &values).unwrap();

        let providers_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM service_provider", [], |row| row.get(0))
            .unwrap();
        assert_eq!(providers_count, 13);

        let estates_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM real_estate", [], |row| row.get(0))
            .unwrap();
        assert_eq!(estates_count, 2);
    }

    #[test]
    fn test_simple_bill_insert_and_read_back() {
        let (conn, estates, providers, _) = seeded_conn();
        let bill = simple_bill(&estates, &providers, d(2024, 1, 20), d(2024, 2, 15))
            .with_notes(Some("water".to_string()));

        let id = insert_simple_bill(&conn, &bill.to_record()).unwrap();
        let bills = read_simple_bills(&conn, &estates, &providers).unwrap();

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].core.id, Some(id));
        assert_eq!(bills[0].core.start_date(), d(2024, 1, 20));
        assert_eq!(bills[0].core.total_cost, Decimal::new(5250, 2));
        assert_eq!(bills[0].core.notes.as_deref(), Some("water"));
        assert_eq!(
            bills[0].core.service_provider.provider,
            ProviderKind::ScwaUti
        );
    }

    #[test]
    fn test_insert_rejects_unpersisted_references() {
        let (conn, estates, providers, _) = seeded_conn();
        let mut record =
            simple_bill(&estates, &providers, d(2024, 1, 20), d(2024, 2, 15)).to_record();
        record.real_estate_id = None;

        let err = insert_simple_bill(&conn, &record).unwrap_err();
        assert!(matches!(err, BillError::Sql(_)));
    }

    #[test]
    fn test_read_simple_bills_by_period_applies_threshold() {
        let (conn, estates, providers, _) = seeded_conn();
        // Starts on day 20, owned by January
        insert_simple_bill(
            &conn,
            &simple_bill(&estates, &providers, d(2024, 1, 20), d(2024, 2, 15)).to_record(),
        )
        .unwrap();
        // Starts on day 26, pushed to the end month
        insert_simple_bill(
            &conn,
            &simple_bill(&estates, &providers, d(2024, 1, 26), d(2024, 2, 24)).to_record(),
        )
        .unwrap();

        let january =
            read_simple_bills_by_period(&conn, &estates, &providers, "2024-01").unwrap();
        assert_eq!(january.len(), 1);
        assert_eq!(january[0].core.start_date(), d(2024, 1, 20));

        let february =
            read_simple_bills_by_period(&conn, &estates, &providers, "2024-02").unwrap();
        assert_eq!(february.len(), 1);
        assert_eq!(february[0].core.start_date(), d(2024, 1, 26));
    }

    #[test]
    fn test_load_registries_reflects_seeded_rows() {
        let (conn, estates, providers, values) = seeded_conn();

        let (loaded_estates, loaded_providers, loaded_values) =
            load_registries(&conn).unwrap();

        assert_eq!(loaded_estates.count(), estates.count());
        assert_eq!(loaded_providers.count(), providers.count());
        assert_eq!(loaded_values.count(), values.count());

        let house = loaded_estates.find_by_address(Address::WagonLane).unwrap();
        assert_eq!(house.id, Some(1));
        assert_eq!(house.street_name, "Wagon Ln");

        let water = loaded_providers.find_by_kind(ProviderKind::ScwaUti).unwrap();
        assert_eq!(water.id, Some(3));

        let dishwasher = loaded_values.find_by_item("Dishwasher").unwrap();
        assert_eq!(dishwasher.real_estate.address, Address::WagonLane);
        assert_eq!(dishwasher.cost_basis.to_string(), "649.99");

        let fridge = loaded_values.find_by_item("Refrigerator").unwrap();
        assert_eq!(fridge.notes.as_deref(), Some("tenant unit"));
    }

    #[test]
    fn test_read_simple_bills_by_provider_and_start() {
        let (conn, estates, providers, _) = seeded_conn();
        let house = estates.find_by_address(Address::WagonLane).unwrap();
        let water = providers.find_by_kind(ProviderKind::ScwaUti).unwrap();

        insert_simple_bill(
            &conn,
            &simple_bill(&estates, &providers, d(2024, 1, 20), d(2024, 2, 15)).to_record(),
        )
        .unwrap();
        insert_simple_bill(
            &conn,
            &simple_bill(&estates, &providers, d(2024, 2, 16), d(2024, 3, 15)).to_record(),
        )
        .unwrap();

        let found = read_simple_bills_by_provider_and_start(
            &conn,
            &estates,
            &providers,
            &house,
            &water,
            d(2024, 1, 20),
        )
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].core.start_date(), d(2024, 1, 20));

        let none = read_simple_bills_by_provider_and_start(
            &conn,
            &estates,
            &providers,
            &house,
            &water,
            d(2024, 5, 1),
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_unpaid_then_mark_paid() {
        let (conn, estates, providers, _) = seeded_conn();
        let unpaid_id = insert_simple_bill(
            &conn,
            &simple_bill(&estates, &providers, d(2024, 1, 20), d(2024, 2, 15)).to_record(),
        )
        .unwrap();
        insert_simple_bill(
            &conn,
            &simple_bill(&estates, &providers, d(2024, 2, 16), d(2024, 3, 15))
                .with_paid_date(Some(d(2024, 3, 20)))
                .to_record(),
        )
        .unwrap();

        let unpaid = read_unpaid_simple_bills(&conn, &estates, &providers).unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].core.id, Some(unpaid_id));

        update_simple_bill_paid_date(&conn, unpaid_id, Some(d(2024, 2, 20))).unwrap();
        let unpaid = read_unpaid_simple_bills(&conn, &estates, &providers).unwrap();
        assert!(unpaid.is_empty());

        let err = update_simple_bill_paid_date(&conn, 999, Some(d(2024, 2, 20))).unwrap_err();
        assert!(matches!(
            err,
            BillError::MissingReference { table: "simple_bill_data", id: 999 }
        ));
    }

    #[test]
    fn test_mortgage_bill_round_trip() {
        let (conn, estates, providers, _) = seeded_conn();
        let bill = MortgageBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::MsMi).unwrap(),
            d(2024, 3, 1),
            d(2024, 3, 31),
            Decimal::new(185000, 2),
            Decimal::new(21050000, 2),
            Decimal::new(312000, 2),
            Decimal::new(52500, 2),
            Decimal::new(78100, 2),
            Decimal::new(54400, 2),
            Decimal::new(0, 2),
        );

        let id = insert_mortgage_bill(&conn, &bill.to_record()).unwrap();
        let bills = read_mortgage_bills(&conn, &estates, &providers).unwrap();

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].core.id, Some(id));
        assert_eq!(bills[0].outs_prin, Decimal::new(21050000, 2));
        // TEXT storage keeps the written scale
        assert_eq!(bills[0].other_pmt.to_string(), "0.00");
    }

    #[test]
    fn test_depreciation_bill_round_trip_and_missing_reference() {
        let (conn, estates, providers, values) = seeded_conn();
        let bill = DepreciationBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::DepDep).unwrap(),
            values.find_by_item("Dishwasher").unwrap(),
            d(2024, 1, 1),
            d(2024, 12, 31),
            Decimal::new(10000, 2),
            Decimal::new(13000, 2),
        )
        .unwrap();

        let id = insert_depreciation_bill(&conn, &bill.to_record()).unwrap();
        let bills = read_depreciation_bills(&conn, &estates, &providers, &values).unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].id(), Some(id));
        assert_eq!(bills[0].real_property_value().item, "Dishwasher");
        assert_eq!(bills[0].period_usage_pct(), Decimal::new(10000, 2));

        // A registry that does not know the referenced property value
        let empty_values = RealPropertyValuesRegistry::new();
        let err =
            read_depreciation_bills(&conn, &estates, &providers, &empty_values).unwrap_err();
        assert!(matches!(
            err,
            BillError::MissingReference { table: "real_property_values", .. }
        ));
    }

    #[test]
    fn test_electric_bill_round_trip() {
        let (conn, estates, providers, _) = seeded_conn();
        let bill = ElectricBill::new(
            estates.find_by_address(Address::WagonLane).unwrap(),
            providers.find_by_kind(ProviderKind::PsegUti).unwrap(),
            d(2024, 6, 15),
            d(2024, 7, 16),
            817,
            0,
            91,
            Decimal::new(17796, 2),
            Decimal::new(6500, 4),
            Decimal::new(2145, 2),
            Decimal::new(9862, 2),
            Decimal::new(1259, 2),
            true,
        )
        .with_first_tier(250, Decimal::new(1049, 4), Decimal::new(2623, 2))
        .with_st(Decimal::new(250, 4), Decimal::new(432, 2));

        let id = insert_electric_bill(&conn, &bill.to_record()).unwrap();
        let bills = read_electric_bills(&conn, &estates, &providers).unwrap();

        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].core.id, Some(id));
        assert!(bills[0].is_actual);
        assert_eq!(bills[0].total_kwh, 817);
        assert_eq!(bills[0].first_kwh, Some(250));
        assert_eq!(bills[0].first_rate, Some(Decimal::new(1049, 4)));
        assert_eq!(bills[0].next_kwh, None);
        assert_eq!(bills[0].st_cost, Some(Decimal::new(432, 2)));
        assert_eq!(bills[0].bs_rate.to_string(), "0.6500");
    }
}
