// 📅 Period Grid - One calendar month of daily status cells
//
// A grid snapshots the (user, habit) pairs at creation time and holds
// one cell per day for each pair. Dates are fixed at creation; cell
// statuses are mutable afterward. Grids are never retroactively
// resized when users are added later.

use crate::error::LedgerError;
use crate::registry::User;
use crate::status::CellStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

// ============================================================================
// CALENDAR HELPERS
// ============================================================================

/// Days in a Gregorian month (28-31, leap years included)
pub fn days_in_month(year: i32, month: u32) -> Result<u32, LedgerError> {
    let first = first_of_month(year, month)?;
    let next = if month == 12 {
        first_of_month(year + 1, 1)?
    } else {
        first_of_month(year, month + 1)?
    };
    Ok(next.signed_duration_since(first).num_days() as u32)
}

/// Short period label, e.g. "Feb24" for (2024, 2)
pub fn period_label(year: i32, month: u32) -> Result<String, LedgerError> {
    Ok(first_of_month(year, month)?.format("%b%y").to_string())
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, LedgerError> {
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(LedgerError::InvalidDate { year, month })
}

// ============================================================================
// GRID ROW
// ============================================================================

/// One (user, habit) row: a snapshot of the names plus one cell per day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRow {
    pub user: String,
    pub habit: String,
    pub cells: Vec<CellStatus>,
}

impl GridRow {
    /// Count of Complete cells in this row (the in-engine replacement
    /// for the per-row total column)
    pub fn complete_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_complete()).count()
    }
}

// ============================================================================
// PERIOD GRID
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodGrid {
    pub year: i32,
    pub month: u32,
    dates: Vec<NaiveDate>,
    rows: Vec<GridRow>,
}

impl PeriodGrid {
    /// Build a grid for (year, month) from the current user snapshot.
    /// Every cell starts Empty.
    pub fn new(year: i32, month: u32, users: &[User]) -> Result<Self, LedgerError> {
        let days = days_in_month(year, month)?;

        let mut dates = Vec::with_capacity(days as usize);
        for day in 1..=days {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(LedgerError::InvalidDate { year, month })?;
            dates.push(date);
        }

        let mut rows = Vec::new();
        for user in users {
            for habit in &user.habits {
                rows.push(GridRow {
                    user: user.name.clone(),
                    habit: habit.clone(),
                    cells: vec![CellStatus::Empty; days as usize],
                });
            }
        }

        Ok(PeriodGrid {
            year,
            month,
            dates,
            rows,
        })
    }

    /// Rebuild a grid from stored rows. Each row must carry exactly one
    /// cell per day of the month.
    pub fn from_rows(year: i32, month: u32, rows: Vec<GridRow>) -> Result<Self, LedgerError> {
        let mut grid = PeriodGrid::new(year, month, &[])?;
        let days = grid.day_count();

        for row in &rows {
            if row.cells.len() != days {
                return Err(LedgerError::CorruptRow {
                    range_id: grid.label(),
                    reason: format!(
                        "row for {:?}/{:?} has {} cells, period has {} days",
                        row.user,
                        row.habit,
                        row.cells.len(),
                        days
                    ),
                });
            }
        }

        grid.rows = rows;
        Ok(grid)
    }

    /// Short label, e.g. "Feb24"
    pub fn label(&self) -> String {
        // Year/month were validated at construction
        self.dates
            .first()
            .map(|d| d.format("%b%y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn day_count(&self) -> usize {
        self.dates.len()
    }

    /// Column header labels, e.g. "Feb/1 Thu"
    pub fn day_labels(&self) -> Vec<String> {
        self.dates
            .iter()
            .map(|d| d.format("%b/%-d %a").to_string())
            .collect()
    }

    pub fn rows(&self) -> &[GridRow] {
        &self.rows
    }

    pub fn rows_for_user(&self, user: &str) -> Vec<&GridRow> {
        self.rows.iter().filter(|r| r.user == user).collect()
    }

    /// User names in the snapshot, first-occurrence order
    pub fn user_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            if !names.iter().any(|n| n == &row.user) {
                names.push(row.user.clone());
            }
        }
        names
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.rows.iter().any(|r| r.user == user)
    }

    fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }

    fn find_row(&self, user: &str, habit: &str) -> Option<&GridRow> {
        self.rows.iter().find(|r| r.user == user && r.habit == habit)
    }

    pub fn get_cell(
        &self,
        user: &str,
        habit: &str,
        date: NaiveDate,
    ) -> Result<CellStatus, LedgerError> {
        let index = self.date_index(date).ok_or(LedgerError::DateOutOfRange {
            date,
            period: self.label(),
        })?;

        let row = self.find_row(user, habit).ok_or(LedgerError::RowNotFound {
            user: user.to_string(),
            habit: habit.to_string(),
            period: self.label(),
        })?;

        Ok(row.cells[index])
    }

    /// Replace one cell's status. Pure replacement; rate and charge are
    /// derived on demand, never cached, so nothing else is recomputed.
    pub fn set_cell(
        &mut self,
        user: &str,
        habit: &str,
        date: NaiveDate,
        status: CellStatus,
    ) -> Result<(), LedgerError> {
        let period = self.label();

        let index = self
            .date_index(date)
            .ok_or(LedgerError::DateOutOfRange { date, period: period.clone() })?;

        let row = self
            .rows
            .iter_mut()
            .find(|r| r.user == user && r.habit == habit)
            .ok_or(LedgerError::RowNotFound {
                user: user.to_string(),
                habit: habit.to_string(),
                period,
            })?;

        row.cells[index] = status;
        Ok(())
    }

    /// Set a cell from a raw sheet symbol, rejecting anything outside
    /// the four canonical values before touching the grid
    pub fn set_cell_symbol(
        &mut self,
        user: &str,
        habit: &str,
        date: NaiveDate,
        symbol: &str,
    ) -> Result<(), LedgerError> {
        let status = CellStatus::from_symbol(symbol)?;
        self.set_cell(user, habit, date, status)
    }

    pub fn row_complete_count(&self, user: &str, habit: &str) -> Result<usize, LedgerError> {
        let row = self.find_row(user, habit).ok_or(LedgerError::RowNotFound {
            user: user.to_string(),
            habit: habit.to_string(),
            period: self.label(),
        })?;

        Ok(row.complete_count())
    }
}

// ============================================================================
// PERIOD STORE
// ============================================================================

/// Owns every PeriodGrid, keyed by (year, month)
#[derive(Debug, Default)]
pub struct PeriodStore {
    grids: BTreeMap<(i32, u32), PeriodGrid>,
}

impl PeriodStore {
    pub fn new() -> Self {
        PeriodStore {
            grids: BTreeMap::new(),
        }
    }

    /// Create the grid for (year, month). Fails with PeriodExists if
    /// one is already present; use reset_period to replace it.
    pub fn create_period(
        &mut self,
        year: i32,
        month: u32,
        users: &[User],
    ) -> Result<&mut PeriodGrid, LedgerError> {
        if self.grids.contains_key(&(year, month)) {
            return Err(LedgerError::PeriodExists { year, month });
        }

        let grid = PeriodGrid::new(year, month, users)?;
        Ok(self.grids.entry((year, month)).or_insert(grid))
    }

    /// Replace (or create) the grid for (year, month) with a fresh
    /// all-Empty one built from the current user snapshot
    pub fn reset_period(
        &mut self,
        year: i32,
        month: u32,
        users: &[User],
    ) -> Result<&mut PeriodGrid, LedgerError> {
        let grid = PeriodGrid::new(year, month, users)?;
        match self.grids.entry((year, month)) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(grid);
                Ok(occupied.into_mut())
            }
            Entry::Vacant(vacant) => Ok(vacant.insert(grid)),
        }
    }

    /// Insert a grid restored from storage
    pub fn insert(&mut self, grid: PeriodGrid) -> Result<(), LedgerError> {
        let key = (grid.year, grid.month);
        if self.grids.contains_key(&key) {
            return Err(LedgerError::PeriodExists {
                year: grid.year,
                month: grid.month,
            });
        }
        self.grids.insert(key, grid);
        Ok(())
    }

    pub fn get(&self, year: i32, month: u32) -> Option<&PeriodGrid> {
        self.grids.get(&(year, month))
    }

    pub fn get_mut(&mut self, year: i32, month: u32) -> Result<&mut PeriodGrid, LedgerError> {
        self.grids
            .get_mut(&(year, month))
            .ok_or(LedgerError::PeriodNotFound { year, month })
    }

    /// All grids in (year, month) order
    pub fn grids(&self) -> impl Iterator<Item = &PeriodGrid> {
        self.grids.values()
    }

    pub fn count(&self) -> usize {
        self.grids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::HabitRegistry;

    fn test_habits() -> Vec<String> {
        vec![
            "Exercise".to_string(),
            "Read".to_string(),
            "Meditate".to_string(),
            "Sleep by 11pm".to_string(),
            "No sugar".to_string(),
        ]
    }

    fn test_registry() -> HabitRegistry {
        let mut registry = HabitRegistry::new();
        registry.register_user("Alice", &test_habits()).unwrap();
        registry.register_user("Ben", &test_habits()).unwrap();
        registry
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_days_in_month_leap_rules() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29); // leap year
        assert_eq!(days_in_month(2023, 2).unwrap(), 28);
        assert_eq!(days_in_month(2100, 2).unwrap(), 28); // century, not leap
        assert_eq!(days_in_month(2000, 2).unwrap(), 29); // 400-year rule
        assert_eq!(days_in_month(2024, 1).unwrap(), 31);
        assert_eq!(days_in_month(2024, 4).unwrap(), 30);
        assert_eq!(days_in_month(2024, 12).unwrap(), 31);
    }

    #[test]
    fn test_invalid_month_rejected() {
        assert!(matches!(
            days_in_month(2024, 13),
            Err(LedgerError::InvalidDate { .. })
        ));
        assert!(matches!(
            days_in_month(2024, 0),
            Err(LedgerError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_grid_shape() {
        let registry = test_registry();
        let grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();

        assert_eq!(grid.day_count(), 29);
        assert_eq!(grid.dates().len(), 29);
        // 2 users x 5 habits
        assert_eq!(grid.rows().len(), 10);
        assert_eq!(grid.user_names(), vec!["Alice", "Ben"]);

        // Every cell starts Empty
        for row in grid.rows() {
            assert!(row.cells.iter().all(|c| *c == CellStatus::Empty));
        }
    }

    #[test]
    fn test_labels() {
        let registry = test_registry();
        let grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();

        assert_eq!(grid.label(), "Feb24");
        assert_eq!(period_label(2024, 2).unwrap(), "Feb24");

        let labels = grid.day_labels();
        assert_eq!(labels[0], "Feb/1 Thu");
        assert_eq!(labels[28], "Feb/29 Thu");
    }

    #[test]
    fn test_get_set_cell() {
        let registry = test_registry();
        let mut grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();
        let d = date(2024, 2, 10);

        assert_eq!(
            grid.get_cell("Alice", "Exercise", d).unwrap(),
            CellStatus::Empty
        );

        grid.set_cell("Alice", "Exercise", d, CellStatus::Complete)
            .unwrap();
        assert_eq!(
            grid.get_cell("Alice", "Exercise", d).unwrap(),
            CellStatus::Complete
        );

        // Overwriting the same value is a no-op replacement, not an error
        grid.set_cell("Alice", "Exercise", d, CellStatus::Complete)
            .unwrap();
        assert_eq!(
            grid.get_cell("Alice", "Exercise", d).unwrap(),
            CellStatus::Complete
        );
    }

    #[test]
    fn test_set_cell_unknown_row() {
        let registry = test_registry();
        let mut grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();
        let d = date(2024, 2, 10);

        let result = grid.set_cell("Ghost", "Exercise", d, CellStatus::Complete);
        assert!(matches!(result, Err(LedgerError::RowNotFound { .. })));

        let result = grid.set_cell("Alice", "Juggling", d, CellStatus::Complete);
        assert!(matches!(result, Err(LedgerError::RowNotFound { .. })));
    }

    #[test]
    fn test_set_cell_date_out_of_range() {
        let registry = test_registry();
        let mut grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();

        let result = grid.set_cell(
            "Alice",
            "Exercise",
            date(2024, 3, 1),
            CellStatus::Complete,
        );
        assert!(matches!(result, Err(LedgerError::DateOutOfRange { .. })));
    }

    #[test]
    fn test_set_cell_symbol() {
        let registry = test_registry();
        let mut grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();
        let d = date(2024, 2, 10);

        // All four canonical symbols are accepted
        for symbol in ["✓", "✗", "E", "-"] {
            grid.set_cell_symbol("Alice", "Exercise", d, symbol).unwrap();
        }

        let result = grid.set_cell_symbol("Alice", "Exercise", d, "Q");
        assert!(matches!(result, Err(LedgerError::InvalidStatus { .. })));
        // Failed set leaves the previous value in place
        assert_eq!(
            grid.get_cell("Alice", "Exercise", d).unwrap(),
            CellStatus::Empty
        );
    }

    #[test]
    fn test_row_complete_count() {
        let registry = test_registry();
        let mut grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();

        grid.set_cell("Alice", "Read", date(2024, 2, 1), CellStatus::Complete)
            .unwrap();
        grid.set_cell("Alice", "Read", date(2024, 2, 2), CellStatus::Incomplete)
            .unwrap();
        grid.set_cell("Alice", "Read", date(2024, 2, 3), CellStatus::Complete)
            .unwrap();

        assert_eq!(grid.row_complete_count("Alice", "Read").unwrap(), 2);
        // Other rows unaffected
        assert_eq!(grid.row_complete_count("Alice", "Exercise").unwrap(), 0);
        assert!(grid.row_complete_count("Ghost", "Read").is_err());
    }

    #[test]
    fn test_period_store_create_and_duplicate() {
        let registry = test_registry();
        let mut store = PeriodStore::new();

        store.create_period(2024, 2, registry.list_users()).unwrap();
        assert_eq!(store.count(), 1);

        let result = store.create_period(2024, 2, registry.list_users());
        assert!(matches!(result, Err(LedgerError::PeriodExists { .. })));
        assert_eq!(store.count(), 1);

        // A different month is fine
        store.create_period(2024, 3, registry.list_users()).unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_period_store_reset() {
        let registry = test_registry();
        let mut store = PeriodStore::new();
        let d = date(2024, 2, 5);

        store.create_period(2024, 2, registry.list_users()).unwrap();
        store
            .get_mut(2024, 2)
            .unwrap()
            .set_cell("Alice", "Read", d, CellStatus::Complete)
            .unwrap();

        store.reset_period(2024, 2, registry.list_users()).unwrap();

        let grid = store.get(2024, 2).unwrap();
        assert_eq!(grid.get_cell("Alice", "Read", d).unwrap(), CellStatus::Empty);
        assert_eq!(grid.rows().len(), 10);
    }

    #[test]
    fn test_period_store_ordered_iteration() {
        let registry = test_registry();
        let mut store = PeriodStore::new();

        store.create_period(2024, 3, registry.list_users()).unwrap();
        store.create_period(2023, 12, registry.list_users()).unwrap();
        store.create_period(2024, 1, registry.list_users()).unwrap();

        let keys: Vec<(i32, u32)> = store.grids().map(|g| (g.year, g.month)).collect();
        assert_eq!(keys, vec![(2023, 12), (2024, 1), (2024, 3)]);
    }

    #[test]
    fn test_from_rows_validates_cell_count() {
        let rows = vec![GridRow {
            user: "Alice".to_string(),
            habit: "Read".to_string(),
            cells: vec![CellStatus::Empty; 28], // Feb 2024 has 29 days
        }];

        assert!(PeriodGrid::from_rows(2024, 2, rows).is_err());
    }

    #[test]
    fn test_grid_not_resized_for_new_users() {
        let mut registry = test_registry();
        let grid = PeriodGrid::new(2024, 2, registry.list_users()).unwrap();

        registry.register_user("Cara", &test_habits()).unwrap();

        // Snapshot taken at creation; Cara has no rows here
        assert!(!grid.contains_user("Cara"));
        assert_eq!(grid.rows().len(), 10);
    }
}
