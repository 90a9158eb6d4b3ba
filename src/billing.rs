// 💷 Billing Engine - Completion rate and charge for one period
//
// Pure, stateless computation over one user's rows within one grid.
// Exempt and Empty cells are excluded from the denominator, so a user
// is neither penalized for a habit that did not apply on a day nor
// for days not yet recorded. A month with zero trackable cells has an
// undefined rate and is never charged.

use crate::period::PeriodGrid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed penalty when a month falls below the threshold, in GBP
pub const CHARGE_AMOUNT: f64 = 3.0;

/// Completion-rate threshold below which the charge applies
pub const CHARGE_THRESHOLD: f64 = 0.80;

// ============================================================================
// USER BILLING
// ============================================================================

/// Rate and charge for one user in one period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserBilling {
    /// None when the period has no trackable cells for this user
    pub rate: Option<f64>,
    pub charge: f64,
}

impl UserBilling {
    pub fn is_charged(&self) -> bool {
        self.charge > 0.0
    }
}

// ============================================================================
// BILLING ENGINE
// ============================================================================

pub struct BillingEngine {
    /// Penalty assessed when the rate falls below the threshold
    pub charge_amount: f64,

    /// Rate at or above which no charge applies
    pub threshold: f64,
}

impl BillingEngine {
    pub fn new() -> Self {
        BillingEngine {
            charge_amount: CHARGE_AMOUNT,
            threshold: CHARGE_THRESHOLD,
        }
    }

    pub fn with_charge(charge_amount: f64) -> Self {
        BillingEngine {
            charge_amount,
            threshold: CHARGE_THRESHOLD,
        }
    }

    pub fn with_thresholds(charge_amount: f64, threshold: f64) -> Self {
        BillingEngine {
            charge_amount,
            threshold,
        }
    }

    /// Cells across all of the user's habits where status is neither
    /// Exempt nor Empty
    pub fn trackable_count(&self, grid: &PeriodGrid, user: &str) -> usize {
        grid.rows_for_user(user)
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter(|c| c.is_trackable())
            .count()
    }

    /// Cells across all of the user's habits with status Complete
    pub fn complete_count(&self, grid: &PeriodGrid, user: &str) -> usize {
        grid.rows_for_user(user)
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter(|c| c.is_complete())
            .count()
    }

    /// complete / trackable, or None when there is nothing trackable
    pub fn completion_rate(&self, grid: &PeriodGrid, user: &str) -> Option<f64> {
        let trackable = self.trackable_count(grid, user);
        if trackable == 0 {
            return None;
        }

        Some(self.complete_count(grid, user) as f64 / trackable as f64)
    }

    /// Fixed charge when the rate is below the threshold; an undefined
    /// rate is never charged
    pub fn charge(&self, rate: Option<f64>) -> f64 {
        match rate {
            Some(r) if r < self.threshold => self.charge_amount,
            _ => 0.0,
        }
    }

    /// Rate and charge for one user in one grid
    pub fn assess(&self, grid: &PeriodGrid, user: &str) -> UserBilling {
        let rate = self.completion_rate(grid, user);
        UserBilling {
            rate,
            charge: self.charge(rate),
        }
    }

    /// Rate and charge for every user in the grid snapshot, keyed by
    /// user name
    pub fn run_billing(&self, grid: &PeriodGrid) -> BTreeMap<String, UserBilling> {
        grid.user_names()
            .into_iter()
            .map(|name| {
                let billing = self.assess(grid, &name);
                (name, billing)
            })
            .collect()
    }
}

impl Default for BillingEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
