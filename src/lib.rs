// Household bill tracking library
// Bill variants, reference registries, SQLite persistence, file import/export

pub mod bills;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod model;
pub mod row;

// Re-export commonly used types
pub use bills::{
    calc_bill_month_year, Bill, BillCore, CorePatch, DepreciationBill,
    DepreciationBillPatch, DepreciationBillRecord, ElectricBill, ElectricBillPatch,
    ElectricBillRecord, MortgageBill, MortgageBillPatch, MortgageBillRecord, SimpleBill,
    SimpleBillPatch, SimpleBillRecord, DEFAULT_MONTH_YEAR_THRESHOLD,
};
pub use config::Config;
pub use entities::{
    Address, ProviderClass, ProviderKind, RealEstate, RealEstateRegistry,
    RealPropertyValues, RealPropertyValuesRegistry, ServiceProvider,
    ServiceProviderRegistry,
};
pub use error::{BillError, Result};
pub use model::SimpleBillModel;
pub use row::{Row, RowOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initialize the global tracing subscriber. Safe to call more than once.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("billbook=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}
