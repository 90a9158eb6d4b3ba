// 📊 Summary Aggregator - Cross-period rebuild of records and totals
//
// Drives the billing engine across every period grid, rebuilds the
// summary records from scratch, and overwrites registry lifetime
// totals. Rebuild-and-overwrite (never merge, never increment) is
// what makes repeated runs with unchanged grids drift-free.

use crate::billing::BillingEngine;
use crate::error::LedgerError;
use crate::period::PeriodStore;
use crate::registry::HabitRegistry;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

// ============================================================================
// SUMMARY RECORD
// ============================================================================

/// Derived, disposable projection of one (user, period) billing result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub user: String,

    /// Period label, e.g. "Feb24"
    pub period: String,

    /// None when the user had no trackable cells that period
    pub completion_rate: Option<f64>,

    pub charge: f64,
}

impl SummaryRecord {
    /// Rate as the sheet renders it, e.g. "66.7%"; "n/a" when undefined
    pub fn rate_display(&self) -> String {
        match self.completion_rate {
            Some(rate) => format!("{:.1}%", rate * 100.0),
            None => "n/a".to_string(),
        }
    }

    /// Charge as the sheet renders it, e.g. "£3.00"
    pub fn charge_display(&self) -> String {
        format!("£{:.2}", self.charge)
    }
}

// ============================================================================
// SUMMARY OUTCOME
// ============================================================================

/// Result of one aggregation run: the full record set plus the
/// lifetime totals written back to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryOutcome {
    pub records: Vec<SummaryRecord>,
    pub updated_totals: BTreeMap<String, f64>,
}

impl SummaryOutcome {
    /// SHA-256 over the canonical record set and totals. Two runs over
    /// unchanged grids produce the same fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        for record in &self.records {
            hasher.update(record.user.as_bytes());
            hasher.update(b"|");
            hasher.update(record.period.as_bytes());
            hasher.update(b"|");
            match record.completion_rate {
                Some(rate) => hasher.update(format!("{:.6}", rate).as_bytes()),
                None => hasher.update(b"-"),
            }
            hasher.update(b"|");
            hasher.update(format!("{:.2}", record.charge).as_bytes());
            hasher.update(b"\n");
        }

        for (user, total) in &self.updated_totals {
            hasher.update(user.as_bytes());
            hasher.update(b"=");
            hasher.update(format!("{:.2}", total).as_bytes());
            hasher.update(b"\n");
        }

        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// SUMMARY AGGREGATOR
// ============================================================================

pub struct SummaryAggregator {
    engine: BillingEngine,
}

impl SummaryAggregator {
    pub fn new() -> Self {
        SummaryAggregator {
            engine: BillingEngine::new(),
        }
    }

    pub fn with_engine(engine: BillingEngine) -> Self {
        SummaryAggregator { engine }
    }

    /// Rebuild summary records across every period and overwrite
    /// registry lifetime totals.
    ///
    /// Grids are processed in (year, month) order; within a grid,
    /// users in snapshot order. A grid user no longer in the registry
    /// still gets a SummaryRecord (the historical record is kept) but
    /// is excluded from lifetime totals.
    pub fn run(
        &self,
        periods: &PeriodStore,
        registry: &mut HabitRegistry,
    ) -> Result<SummaryOutcome, LedgerError> {
        let mut records = Vec::new();
        let mut charge_sums: BTreeMap<String, f64> = BTreeMap::new();

        for grid in periods.grids() {
            let period = grid.label();

            for user in grid.user_names() {
                let billing = self.engine.assess(grid, &user);

                records.push(SummaryRecord {
                    user: user.clone(),
                    period: period.clone(),
                    completion_rate: billing.rate,
                    charge: billing.charge,
                });

                if registry.contains(&user) {
                    *charge_sums.entry(user).or_insert(0.0) += billing.charge;
                }
            }
        }

        for (user, total) in &charge_sums {
            registry.set_lifetime_charge(user, *total)?;
        }

        Ok(SummaryOutcome {
            records,
            updated_totals: charge_sums,
        })
    }
}

impl Default for SummaryAggregator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::CHARGE_AMOUNT;
    use crate::status::CellStatus;
    use chrono::NaiveDate;

    fn test_habits() -> Vec<String> {
        vec![
            "Exercise".to_string(),
            "Read".to_string(),
            "Meditate".to_string(),
            "Sleep by 11pm".to_string(),
            "No sugar".to_string(),
        ]
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Two users, two months. Alice completes everything she tracks;
    /// Ben misses most days in both months.
    fn test_fixture() -> (PeriodStore, HabitRegistry) {
        let mut registry = HabitRegistry::new();
        registry.register_user("Alice", &test_habits()).unwrap();
        registry.register_user("Ben", &test_habits()).unwrap();

        let mut periods = PeriodStore::new();
        for month in [1, 2] {
            periods
                .create_period(2024, month, registry.list_users())
                .unwrap();
            let grid = periods.get_mut(2024, month).unwrap();

            for day in 1..=5 {
                grid.set_cell("Alice", "Read", date(2024, month, day), CellStatus::Complete)
                    .unwrap();
                grid.set_cell("Ben", "Read", date(2024, month, day), CellStatus::Incomplete)
                    .unwrap();
            }
            grid.set_cell("Ben", "Read", date(2024, month, 6), CellStatus::Complete)
                .unwrap();
        }

        (periods, registry)
    }

    #[test]
    fn test_records_per_user_per_period() {
        let (periods, mut registry) = test_fixture();
        let aggregator = SummaryAggregator::new();

        let outcome = aggregator.run(&periods, &mut registry).unwrap();

        // 2 users x 2 periods
        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.records[0].period, "Jan24");
        assert_eq!(outcome.records[0].user, "Alice");
        assert_eq!(outcome.records[2].period, "Feb24");

        let alice_jan = &outcome.records[0];
        assert_eq!(alice_jan.completion_rate, Some(1.0));
        assert_eq!(alice_jan.charge, 0.0);

        let ben_jan = &outcome.records[1];
        assert!((ben_jan.completion_rate.unwrap() - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(ben_jan.charge, CHARGE_AMOUNT);
    }

    #[test]
    fn test_lifetime_totals_overwritten() {
        let (periods, mut registry) = test_fixture();
        let aggregator = SummaryAggregator::new();

        // Pre-existing stale total must be overwritten, not added to
        registry.set_lifetime_charge("Ben", 99.0).unwrap();

        let outcome = aggregator.run(&periods, &mut registry).unwrap();

        // Ben charged in both months
        assert_eq!(outcome.updated_totals["Ben"], 2.0 * CHARGE_AMOUNT);
        assert_eq!(outcome.updated_totals["Alice"], 0.0);
        assert_eq!(
            registry.get("Ben").unwrap().lifetime_charge,
            2.0 * CHARGE_AMOUNT
        );
        assert_eq!(registry.get("Alice").unwrap().lifetime_charge, 0.0);
    }

    #[test]
    fn test_idempotent_rerun() {
        let (periods, mut registry) = test_fixture();
        let aggregator = SummaryAggregator::new();

        let first = aggregator.run(&periods, &mut registry).unwrap();
        let second = aggregator.run(&periods, &mut registry).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
        // No cumulative drift in the registry either
        assert_eq!(
            registry.get("Ben").unwrap().lifetime_charge,
            2.0 * CHARGE_AMOUNT
        );

        println!("✅ Idempotence fingerprint: {}", first.fingerprint());
    }

    #[test]
    fn test_user_missing_from_registry() {
        let (periods, _full_registry) = test_fixture();

        // Rebuild a registry where Ben was later removed
        let mut registry = HabitRegistry::new();
        registry.register_user("Alice", &test_habits()).unwrap();

        let aggregator = SummaryAggregator::new();
        let outcome = aggregator.run(&periods, &mut registry).unwrap();

        // Ben's records survive as history
        let ben_records: Vec<_> = outcome.records.iter().filter(|r| r.user == "Ben").collect();
        assert_eq!(ben_records.len(), 2);
        assert_eq!(ben_records[0].charge, CHARGE_AMOUNT);

        // But he gets no lifetime total
        assert!(!outcome.updated_totals.contains_key("Ben"));
        assert!(outcome.updated_totals.contains_key("Alice"));
    }

    #[test]
    fn test_empty_period_store() {
        let mut registry = HabitRegistry::new();
        registry.register_user("Alice", &test_habits()).unwrap();

        let outcome = SummaryAggregator::new()
            .run(&PeriodStore::new(), &mut registry)
            .unwrap();

        assert!(outcome.records.is_empty());
        assert!(outcome.updated_totals.is_empty());
        // Untouched registry total
        assert_eq!(registry.get("Alice").unwrap().lifetime_charge, 0.0);
    }

    #[test]
    fn test_all_empty_month_in_summary() {
        let mut registry = HabitRegistry::new();
        registry.register_user("Alice", &test_habits()).unwrap();

        let mut periods = PeriodStore::new();
        periods.create_period(2024, 2, registry.list_users()).unwrap();

        let outcome = SummaryAggregator::new()
            .run(&periods, &mut registry)
            .unwrap();

        // Undefined rate, no charge
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].completion_rate, None);
        assert_eq!(outcome.records[0].charge, 0.0);
        assert_eq!(outcome.updated_totals["Alice"], 0.0);
    }

    #[test]
    fn test_fingerprint_changes_with_data() {
        let (periods, mut registry) = test_fixture();
        let aggregator = SummaryAggregator::new();
        let before = aggregator.run(&periods, &mut registry).unwrap();

        let (mut periods2, mut registry2) = test_fixture();
        periods2
            .get_mut(2024, 1)
            .unwrap()
            .set_cell("Ben", "Read", date(2024, 1, 7), CellStatus::Complete)
            .unwrap();
        let after = aggregator.run(&periods2, &mut registry2).unwrap();

        assert_ne!(before.fingerprint(), after.fingerprint());
    }

    #[test]
    fn test_rate_and_charge_display() {
        let record = SummaryRecord {
            user: "Alice".to_string(),
            period: "Feb24".to_string(),
            completion_rate: Some(2.0 / 3.0),
            charge: 3.0,
        };
        assert_eq!(record.rate_display(), "66.7%");
        assert_eq!(record.charge_display(), "£3.00");

        let undefined = SummaryRecord {
            user: "Alice".to_string(),
            period: "Feb24".to_string(),
            completion_rate: None,
            charge: 0.0,
        };
        assert_eq!(undefined.rate_display(), "n/a");
        assert_eq!(undefined.charge_display(), "£0.00");
    }
}
