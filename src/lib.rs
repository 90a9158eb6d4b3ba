// Habit Ledger - Core Library
// Exposes the data model and billing/aggregation engine for CLI and tests

pub mod billing;
pub mod error;
pub mod export;
pub mod period;
pub mod prompt;
pub mod registry;
pub mod status;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use billing::{BillingEngine, UserBilling, CHARGE_AMOUNT, CHARGE_THRESHOLD};
pub use error::{ErrorCategory, LedgerError};
pub use export::export_summary_to_csv;
pub use period::{days_in_month, period_label, GridRow, PeriodGrid, PeriodStore};
pub use prompt::{register_user_interactive, UserPrompt};
pub use registry::{HabitRegistry, User, HABITS_PER_USER};
pub use status::CellStatus;
pub use store::{
    load_all_periods, load_period, load_registry, save_period, save_registry, tracking_range,
    write_summary, MemoryStore, SqliteStore, TabularStore, SUMMARY_RANGE, TRACKING_PREFIX,
    USERS_RANGE,
};
pub use summary::{SummaryAggregator, SummaryOutcome, SummaryRecord};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
