// 🗄 Tabular Store - Generic row/column storage capability
//
// The engine never talks to a spreadsheet or database directly; it
// reads and writes plain rows of strings through this capability. The
// SQLite implementation is the production backend, the in-memory one
// backs tests. Sheet codecs translate between engine types and the
// three ranges (users, per-period tracking, summary).

use crate::error::LedgerError;
use crate::period::{days_in_month, period_label, GridRow, PeriodGrid, PeriodStore};
use crate::registry::{HabitRegistry, User, HABITS_PER_USER};
use crate::status::CellStatus;
use crate::summary::SummaryOutcome;
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::path::Path;

/// Range holding one row per user: name, habits, lifetime charge, id
pub const USERS_RANGE: &str = "user_habits";

/// Range holding the rebuilt summary projection
pub const SUMMARY_RANGE: &str = "summary_view";

/// Prefix for per-period tracking ranges, e.g. "tracking_Feb24"
pub const TRACKING_PREFIX: &str = "tracking_";

/// Range id for one period's tracking rows
pub fn tracking_range(year: i32, month: u32) -> Result<String, LedgerError> {
    Ok(format!("{}{}", TRACKING_PREFIX, period_label(year, month)?))
}

// ============================================================================
// TABULAR STORE CAPABILITY
// ============================================================================

/// Generic row/column storage. Implementations must not attach any
/// spreadsheet-specific meaning to the rows.
pub trait TabularStore {
    /// All rows of a range, in row order. A missing range reads as
    /// zero rows.
    fn read_rows(&self, range_id: &str) -> Result<Vec<Vec<String>>>;

    /// Replace the entire range with the given rows
    fn write_rows(&mut self, range_id: &str, rows: &[Vec<String>]) -> Result<()>;

    /// Append one row to the end of a range
    fn append_row(&mut self, table_id: &str, row: &[String]) -> Result<()>;

    /// Range ids starting with the given prefix, sorted
    fn list_ranges(&self, prefix: &str) -> Result<Vec<String>>;
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// SQLite-backed TabularStore: one generic table of
/// (range_id, row_index, cells-as-JSON)
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        Self::setup(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory store")?;
        Self::setup(conn)
    }

    fn setup(conn: Connection) -> Result<Self> {
        // WAL mode for crash recovery
        conn.pragma_update(None, "journal_mode", "WAL")?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS ranges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                range_id TEXT NOT NULL,
                row_index INTEGER NOT NULL,
                cells TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_range_id ON ranges(range_id, row_index)",
            [],
        )?;

        Ok(SqliteStore { conn })
    }

    fn next_row_index(&self, range_id: &str) -> Result<i64> {
        let index = self.conn.query_row(
            "SELECT COALESCE(MAX(row_index) + 1, 0) FROM ranges WHERE range_id = ?1",
            params![range_id],
            |row| row.get(0),
        )?;
        Ok(index)
    }
}

impl TabularStore for SqliteStore {
    fn read_rows(&self, range_id: &str) -> Result<Vec<Vec<String>>> {
        let mut stmt = self
            .conn
            .prepare("SELECT cells FROM ranges WHERE range_id = ?1 ORDER BY row_index")?;

        let mut rows = Vec::new();
        let cells_iter = stmt.query_map(params![range_id], |row| row.get::<_, String>(0))?;

        for cells_json in cells_iter {
            let cells_json = cells_json?;
            let cells: Vec<String> = serde_json::from_str(&cells_json).map_err(|e| {
                anyhow::Error::from(LedgerError::CorruptRow {
                    range_id: range_id.to_string(),
                    reason: format!("bad cell encoding: {}", e),
                })
            })?;
            rows.push(cells);
        }

        Ok(rows)
    }

    fn write_rows(&mut self, range_id: &str, rows: &[Vec<String>]) -> Result<()> {
        self.conn
            .execute("DELETE FROM ranges WHERE range_id = ?1", params![range_id])?;

        for (index, row) in rows.iter().enumerate() {
            let cells_json = serde_json::to_string(row)?;
            self.conn.execute(
                "INSERT INTO ranges (range_id, row_index, cells) VALUES (?1, ?2, ?3)",
                params![range_id, index as i64, cells_json],
            )?;
        }

        Ok(())
    }

    fn append_row(&mut self, table_id: &str, row: &[String]) -> Result<()> {
        let index = self.next_row_index(table_id)?;
        let cells_json = serde_json::to_string(row)?;
        self.conn.execute(
            "INSERT INTO ranges (range_id, row_index, cells) VALUES (?1, ?2, ?3)",
            params![table_id, index, cells_json],
        )?;
        Ok(())
    }

    fn list_ranges(&self, prefix: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT range_id FROM ranges WHERE range_id LIKE ?1 || '%' ORDER BY range_id",
        )?;

        let ids = stmt
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(ids)
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-memory TabularStore for tests and throwaway runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    ranges: BTreeMap<String, Vec<Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            ranges: BTreeMap::new(),
        }
    }
}

impl TabularStore for MemoryStore {
    fn read_rows(&self, range_id: &str) -> Result<Vec<Vec<String>>> {
        Ok(self.ranges.get(range_id).cloned().unwrap_or_default())
    }

    fn write_rows(&mut self, range_id: &str, rows: &[Vec<String>]) -> Result<()> {
        self.ranges.insert(range_id.to_string(), rows.to_vec());
        Ok(())
    }

    fn append_row(&mut self, table_id: &str, row: &[String]) -> Result<()> {
        self.ranges
            .entry(table_id.to_string())
            .or_default()
            .push(row.to_vec());
        Ok(())
    }

    fn list_ranges(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .ranges
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ============================================================================
// SHEET CODECS
// ============================================================================

fn corrupt(range_id: &str, reason: impl Into<String>) -> anyhow::Error {
    anyhow::Error::from(LedgerError::CorruptRow {
        range_id: range_id.to_string(),
        reason: reason.into(),
    })
}

/// Write the registry to the users range:
/// [name, habit1..habit5, lifetime_charge, id]
pub fn save_registry(store: &mut dyn TabularStore, registry: &HabitRegistry) -> Result<()> {
    let rows: Vec<Vec<String>> = registry
        .list_users()
        .iter()
        .map(|user| {
            let mut row = vec![user.name.clone()];
            row.extend(user.habits.iter().cloned());
            row.push(format!("{:.2}", user.lifetime_charge));
            row.push(user.id.clone());
            row
        })
        .collect();

    store.write_rows(USERS_RANGE, &rows)
}

/// Rebuild the registry from the users range
pub fn load_registry(store: &dyn TabularStore) -> Result<HabitRegistry> {
    let mut registry = HabitRegistry::new();

    for row in store.read_rows(USERS_RANGE)? {
        // name + 5 habits + charge; id column is optional for rows
        // written before identities existed
        if row.len() < HABITS_PER_USER + 2 {
            return Err(corrupt(
                USERS_RANGE,
                format!("expected at least {} columns, got {}", HABITS_PER_USER + 2, row.len()),
            ));
        }

        let name = row[0].clone();
        let habits: Vec<String> = row[1..=HABITS_PER_USER].to_vec();
        let charge: f64 = row[HABITS_PER_USER + 1]
            .trim()
            .parse()
            .map_err(|_| {
                corrupt(
                    USERS_RANGE,
                    format!("bad charge value {:?} for user {:?}", row[HABITS_PER_USER + 1], name),
                )
            })?;
        let id = row
            .get(HABITS_PER_USER + 2)
            .cloned()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        registry.restore_user(User {
            id,
            name,
            habits,
            lifetime_charge: charge,
            registered_at: chrono::Utc::now(),
        })?;
    }

    Ok(registry)
}

/// Write one period grid to its tracking range. Row 0 is the period
/// header [label, year, month]; data rows are [user, habit, symbols..].
pub fn save_period(store: &mut dyn TabularStore, grid: &PeriodGrid) -> Result<()> {
    let range_id = tracking_range(grid.year, grid.month)?;

    let mut rows = vec![vec![
        grid.label(),
        grid.year.to_string(),
        grid.month.to_string(),
    ]];

    for row in grid.rows() {
        let mut cells = vec![row.user.clone(), row.habit.clone()];
        cells.extend(row.cells.iter().map(|c| c.symbol().to_string()));
        rows.push(cells);
    }

    store.write_rows(&range_id, &rows)
}

/// Rebuild one period grid from its tracking range
pub fn load_period(store: &dyn TabularStore, range_id: &str) -> Result<PeriodGrid> {
    let rows = store.read_rows(range_id)?;

    let header = rows
        .first()
        .ok_or_else(|| corrupt(range_id, "missing period header row"))?;
    if header.len() < 3 {
        return Err(corrupt(range_id, "period header needs label, year, month"));
    }

    let year: i32 = header[1]
        .parse()
        .map_err(|_| corrupt(range_id, format!("bad year {:?}", header[1])))?;
    let month: u32 = header[2]
        .parse()
        .map_err(|_| corrupt(range_id, format!("bad month {:?}", header[2])))?;
    let days = days_in_month(year, month)? as usize;

    let mut grid_rows = Vec::new();
    for row in &rows[1..] {
        if row.len() != days + 2 {
            return Err(corrupt(
                range_id,
                format!("expected {} columns, got {}", days + 2, row.len()),
            ));
        }

        let mut cells = Vec::with_capacity(days);
        for symbol in &row[2..] {
            let status = CellStatus::from_symbol(symbol).map_err(|_| {
                corrupt(range_id, format!("bad status symbol {:?}", symbol))
            })?;
            cells.push(status);
        }

        grid_rows.push(GridRow {
            user: row[0].clone(),
            habit: row[1].clone(),
            cells,
        });
    }

    Ok(PeriodGrid::from_rows(year, month, grid_rows)?)
}

/// Rebuild every period found under the tracking prefix
pub fn load_all_periods(store: &dyn TabularStore) -> Result<PeriodStore> {
    let mut periods = PeriodStore::new();

    for range_id in store.list_ranges(TRACKING_PREFIX)? {
        let grid = load_period(store, &range_id)?;
        periods.insert(grid)?;
    }

    Ok(periods)
}

/// Full replace of the summary range:
/// [user, period, rate, charge], display-formatted as the sheet shows
pub fn write_summary(store: &mut dyn TabularStore, outcome: &SummaryOutcome) -> Result<()> {
    let rows: Vec<Vec<String>> = outcome
        .records
        .iter()
        .map(|record| {
            vec![
                record.user.clone(),
                record.period.clone(),
                record.rate_display(),
                record.charge_display(),
            ]
        })
        .collect();

    store.write_rows(SUMMARY_RANGE, &rows)
}

// ============================================================================
// TESTS
// ============================================================================
