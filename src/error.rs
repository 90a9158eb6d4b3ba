// 🚨 Error Taxonomy - Typed failures for every engine operation
//
// Three categories, matching how callers recover:
// - Validation: bad input, fix and re-invoke
// - NotFound: referenced user/row/period is absent
// - State: the operation conflicts with existing state
//
// No error is fatal; the registry and summary records are rebuilt
// wholesale, so every operation is independently retriable.

use chrono::NaiveDate;
use thiserror::Error;

// ============================================================================
// ERROR CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid input value (status symbol, duplicate name, bad habit list)
    Validation,
    /// Referenced user, row, date, or period does not exist
    NotFound,
    /// Operation conflicts with existing state (period already created)
    State,
}

impl ErrorCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Validation",
            ErrorCategory::NotFound => "NotFound",
            ErrorCategory::State => "State",
        }
    }
}

// ============================================================================
// LEDGER ERROR
// ============================================================================

/// Core error type for habit-ledger operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    // ===================
    // Validation
    // ===================
    #[error("user already registered: {name}")]
    DuplicateUser { name: String },

    #[error("user name must not be blank")]
    BlankUserName,

    #[error("invalid habit list: {reason}")]
    InvalidHabit { reason: String },

    #[error("invalid status symbol: {symbol:?}")]
    InvalidStatus { symbol: String },

    // ===================
    // NotFound
    // ===================
    #[error("user not found: {name}")]
    UserNotFound { name: String },

    #[error("no row for user {user:?} habit {habit:?} in period {period}")]
    RowNotFound {
        user: String,
        habit: String,
        period: String,
    },

    #[error("date {date} is outside period {period}")]
    DateOutOfRange { date: NaiveDate, period: String },

    #[error("no period grid for {year}-{month:02}")]
    PeriodNotFound { year: i32, month: u32 },

    #[error("corrupt row in range {range_id}: {reason}")]
    CorruptRow { range_id: String, reason: String },

    // ===================
    // State
    // ===================
    #[error("period grid for {year}-{month:02} already exists")]
    PeriodExists { year: i32, month: u32 },

    #[error("invalid calendar month: {year}-{month}")]
    InvalidDate { year: i32, month: u32 },
}

impl LedgerError {
    /// Which recovery category this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::DuplicateUser { .. }
            | LedgerError::BlankUserName
            | LedgerError::InvalidHabit { .. }
            | LedgerError::InvalidStatus { .. } => ErrorCategory::Validation,

            LedgerError::UserNotFound { .. }
            | LedgerError::RowNotFound { .. }
            | LedgerError::DateOutOfRange { .. }
            | LedgerError::PeriodNotFound { .. }
            | LedgerError::CorruptRow { .. } => ErrorCategory::NotFound,

            LedgerError::PeriodExists { .. } | LedgerError::InvalidDate { .. } => {
                ErrorCategory::State
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn is_state(&self) -> bool {
        self.category() == ErrorCategory::State
    }
}

// ============================================================================
// TESTS
// ============================================================================
