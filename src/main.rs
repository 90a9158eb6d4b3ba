use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

use habit_ledger::{
    export_summary_to_csv, load_all_periods, load_registry, register_user_interactive,
    save_period, save_registry, write_summary, BillingEngine, CellStatus, SqliteStore,
    SummaryAggregator, UserPrompt,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("demo") => run_demo(),
        Some("register") => run_register(),
        Some("summary") => run_summary(),
        _ => {
            println!("habit-ledger v{}", habit_ledger::VERSION);
            println!();
            println!("Usage:");
            println!("  habit-ledger demo       Seed users, fill a month, run billing + summary");
            println!("  habit-ledger register   Prompt-driven user registration");
            println!("  habit-ledger summary    Rebuild the summary from the stored grids");
            Ok(())
        }
    }
}

fn store_path() -> &'static Path {
    Path::new("habit-ledger.db")
}

fn run_demo() -> Result<()> {
    println!("📒 Habit Ledger demo");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut store = SqliteStore::open(store_path())?;

    // 1. Seed users
    println!("\n👤 Registering users...");
    let mut registry = load_registry(&store)?;
    for (name, habits) in [
        (
            "Alice",
            ["Exercise", "Read", "Meditate", "Sleep by 11pm", "No sugar"],
        ),
        (
            "Ben",
            ["Run", "Journal", "Stretch", "Cook dinner", "No phone in bed"],
        ),
    ] {
        let habits: Vec<String> = habits.iter().map(|h| h.to_string()).collect();
        match registry.register_user(name, &habits) {
            Ok(user) => println!("✓ Registered {} with {} habits", user.name, user.habits.len()),
            Err(e) if e.is_validation() => println!("✓ {} already registered ({})", name, e),
            Err(e) => return Err(e.into()),
        }
    }

    // 2. Create this month's grid and mark a few days
    let today = Utc::now().date_naive();
    let (year, month) = (today.year(), today.month());
    println!("\n📅 Creating grid for {}-{:02}...", year, month);

    let mut periods = load_all_periods(&store)?;
    if let Err(e) = periods.create_period(year, month, registry.list_users()) {
        if e.is_state() {
            println!("✓ Grid already exists, reusing it");
        } else {
            return Err(e.into());
        }
    }
    let grid = periods.get_mut(year, month)?;
    println!(
        "✓ Grid {} has {} days and {} rows",
        grid.label(),
        grid.day_count(),
        grid.rows().len()
    );

    for day in 1..=5 {
        let date = NaiveDate::from_ymd_opt(year, month, day).expect("day 1-5 exists");
        grid.set_cell("Alice", "Read", date, CellStatus::Complete)?;
        grid.set_cell("Ben", "Run", date, CellStatus::Incomplete)?;
    }
    grid.set_cell(
        "Ben",
        "Run",
        NaiveDate::from_ymd_opt(year, month, 6).expect("day 6 exists"),
        CellStatus::Exempt,
    )?;
    println!("✓ Marked sample days for Alice and Ben");

    // 3. Billing for the current grid
    println!("\n💷 Billing for {}:", grid.label());
    let engine = BillingEngine::new();
    for (user, billing) in engine.run_billing(grid) {
        let rate = billing
            .rate
            .map(|r| format!("{:.1}%", r * 100.0))
            .unwrap_or_else(|| "n/a".to_string());
        println!("  {:<8} rate {:>6}  charge £{:.2}", user, rate, billing.charge);
    }

    // 4. Full summary rebuild across every stored period
    println!("\n📊 Rebuilding summary across {} period(s)...", periods.count());
    let outcome = SummaryAggregator::new().run(&periods, &mut registry)?;
    println!("✓ {} summary record(s)", outcome.records.len());
    for (user, total) in &outcome.updated_totals {
        println!("  {:<8} lifetime charges £{:.2}", user, total);
    }
    println!("✓ Fingerprint {}", &outcome.fingerprint()[..16]);

    // 5. Persist everything
    for grid in periods.grids() {
        save_period(&mut store, grid)?;
    }
    save_registry(&mut store, &registry)?;
    write_summary(&mut store, &outcome)?;
    let csv_path = Path::new("summary.csv");
    export_summary_to_csv(&outcome.records, csv_path)?;

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Saved to {} and {}", store_path().display(), csv_path.display());

    Ok(())
}

fn run_register() -> Result<()> {
    let mut store = SqliteStore::open(store_path())?;
    let mut registry = load_registry(&store)?;

    let mut prompt = ConsolePrompt;
    if register_user_interactive(&mut prompt, &mut registry)?.is_some() {
        save_registry(&mut store, &registry)?;
        println!("✓ Registry saved ({} users)", registry.count());
    }

    Ok(())
}

fn run_summary() -> Result<()> {
    let mut store = SqliteStore::open(store_path())?;
    let mut registry = load_registry(&store)?;
    let periods = load_all_periods(&store)?;

    if periods.is_empty() {
        println!("No period grids found. Run: habit-ledger demo");
        return Ok(());
    }

    let outcome = SummaryAggregator::new().run(&periods, &mut registry)?;
    save_registry(&mut store, &registry)?;
    write_summary(&mut store, &outcome)?;

    println!("✅ Summary rebuilt: {} record(s)", outcome.records.len());
    for record in &outcome.records {
        println!(
            "  {:<8} {}  {:>6}  {}",
            record.user,
            record.period,
            record.rate_display(),
            record.charge_display()
        );
    }

    Ok(())
}

/// Console-backed prompt surface for the register flow
struct ConsolePrompt;

impl UserPrompt for ConsolePrompt {
    fn ask_text(&mut self, prompt: &str) -> Option<String> {
        print!("{} ", prompt);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;

        let line = line.trim_end_matches('\n').to_string();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        matches!(
            self.ask_text(&format!("{} [y/N]", prompt)).as_deref(),
            Some("y") | Some("Y") | Some("yes")
        )
    }

    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }
}
