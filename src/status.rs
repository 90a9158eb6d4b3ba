// ✔ Cell Status - Closed four-value status model
//
// Every daily cell holds exactly one of these four values. Invalid
// symbols are rejected at the type boundary, never compared as raw
// strings inside the engine.

use crate::error::LedgerError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CELL STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellStatus {
    /// Habit done that day
    Complete,

    /// Habit missed that day
    Incomplete,

    /// Habit legitimately did not apply that day (travel, illness)
    Exempt,

    /// Day not yet recorded
    Empty,
}

impl CellStatus {
    pub const ALL: [CellStatus; 4] = [
        CellStatus::Complete,
        CellStatus::Incomplete,
        CellStatus::Exempt,
        CellStatus::Empty,
    ];

    /// Sheet symbol for this status
    pub fn symbol(&self) -> &'static str {
        match self {
            CellStatus::Complete => "✓",
            CellStatus::Incomplete => "✗",
            CellStatus::Exempt => "E",
            CellStatus::Empty => "-",
        }
    }

    /// Parse a sheet symbol; anything outside the four canonical values fails
    pub fn from_symbol(symbol: &str) -> Result<Self, LedgerError> {
        match symbol.trim() {
            "✓" => Ok(CellStatus::Complete),
            "✗" => Ok(CellStatus::Incomplete),
            "E" => Ok(CellStatus::Exempt),
            "-" => Ok(CellStatus::Empty),
            other => Err(LedgerError::InvalidStatus {
                symbol: other.to_string(),
            }),
        }
    }

    /// Trackable cells count toward the completion-rate denominator.
    /// Exempt and Empty are excluded so a user is not penalized for a
    /// habit that did not apply or a day not yet recorded.
    pub fn is_trackable(&self) -> bool {
        !matches!(self, CellStatus::Exempt | CellStatus::Empty)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, CellStatus::Complete)
    }
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// ============================================================================
// TESTS
// ============================================================================
