// Error types shared across the library

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error type covering validation, lookup, import, and storage failures.
///
/// Validation errors leave the entity in its last valid state; the caller
/// decides whether to re-prompt, skip, or abort. Nothing is retried here.
#[derive(Debug, Error)]
pub enum BillError {
    #[error("{field} {value} is invalid. Must have format {expected}.")]
    InvalidDate {
        field: &'static str,
        value: NaiveDate,
        expected: &'static str,
    },

    #[error("period_usage_pct {0} is invalid. Must be between 000.00 and 100.00 (inclusive)")]
    PercentOutOfRange(Decimal),

    #[error("address '{0}' is not a known address")]
    UnknownAddress(String),

    #[error("provider '{0}' is not a known service provider")]
    UnknownProvider(String),

    #[error("provider '{0}' is not accepted by this bill model")]
    UnsupportedProvider(String),

    #[error("column {column} has invalid value '{value}': {reason}")]
    BadField {
        column: &'static str,
        value: String,
        reason: String,
    },

    #[error("import file has no data row")]
    EmptyImport,

    #[error("no {table} record with id {id}")]
    MissingReference { table: &'static str, id: i64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Sql(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, BillError>;
