use bloom_core::*;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bloom")]
#[command(about = "Period log and cycle predictions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a period (replaces any entry with the same start date)
    Log {
        /// Start date (YYYY-MM-DD)
        start: NaiveDate,

        /// End date (YYYY-MM-DD); omit while the period is ongoing
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Delete the period starting on the given date
    Delete {
        /// Start date (YYYY-MM-DD)
        start: NaiveDate,
    },

    /// List all logged periods
    List,

    /// Show cycle predictions (default)
    Overview {
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Only average the most recent N periods for cycle length
        #[arg(long)]
        recent: Option<usize>,
    },

    /// Delete all logged periods
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    bloom_core::logging::init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonFileStore::new(Config::periods_path(&data_dir));
    let mut tracker = PeriodTracker::open(store, config.prediction.clone())?;

    match cli.command {
        Some(Commands::Log { start, end }) => cmd_log(&mut tracker, start, end),
        Some(Commands::Delete { start }) => cmd_delete(&mut tracker, start),
        Some(Commands::List) => cmd_list(&tracker),
        Some(Commands::Overview { as_of, recent }) => cmd_overview(&tracker, as_of, recent),
        Some(Commands::Clear { yes }) => cmd_clear(&mut tracker, yes),
        None => cmd_overview(&tracker, None, None),
    }
}

fn cmd_log<S: PeriodStore>(
    tracker: &mut PeriodTracker<S>,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<()> {
    let replaced = tracker.add_period(Period::new(start, end))?;

    if replaced.is_some() {
        println!("✓ Period updated: {}", describe_range(start, end));
    } else {
        println!("✓ Period logged: {}", describe_range(start, end));
    }
    println!("  {} periods on record", tracker.ledger().len());
    Ok(())
}

fn cmd_delete<S: PeriodStore>(tracker: &mut PeriodTracker<S>, start: NaiveDate) -> Result<()> {
    match tracker.delete_starting(start)? {
        Some(removed) => println!(
            "✓ Deleted period: {}",
            describe_range(removed.start_date, removed.end_date)
        ),
        None => println!("No period starting {} - nothing to delete.", fmt_date(start)),
    }
    Ok(())
}

fn cmd_list<S: PeriodStore>(tracker: &PeriodTracker<S>) -> Result<()> {
    let periods = tracker.periods();
    if periods.is_empty() {
        println!("No periods logged yet.");
        return Ok(());
    }

    let ongoing_days = tracker.predictor().settings().ongoing_period_days;
    for period in &periods {
        let days = period.duration_days(ongoing_days);
        let note = if period.is_ongoing() { " (ongoing, assumed)" } else { "" };
        println!(
            "  {}  {} days{}",
            describe_range(period.start_date, period.end_date),
            days,
            note
        );
    }
    Ok(())
}

fn cmd_overview<S: PeriodStore>(
    tracker: &PeriodTracker<S>,
    as_of: Option<NaiveDate>,
    recent: Option<usize>,
) -> Result<()> {
    let as_of = as_of.unwrap_or_else(|| chrono::Local::now().date_naive());
    let recent = recent.or(tracker.predictor().settings().recent_cycles);
    tracing::debug!("Rendering overview as of {} (recent window {:?})", as_of, recent);

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  CYCLE OVERVIEW  {}", fmt_date(as_of));
    println!("╰─────────────────────────────────────────╯");
    println!();

    let last_period = tracker
        .ledger()
        .latest()
        .map(|p| fmt_date(p.start_date))
        .ok_or(Error::NotEnoughData {
            required: 1,
            available: 0,
        });
    print_line("Last period", last_period);
    print_line(
        "Cycle day",
        tracker.cycle_day(as_of).map(|day| format!("Day {}", day)),
    );
    print_line(
        "Next period",
        tracker.predict_next_period(as_of).map(fmt_date),
    );
    print_line("Ovulation", tracker.ovulation_date(as_of).map(fmt_date));
    print_line(
        "Fertile window",
        tracker
            .fertile_window(as_of)
            .map(|w| format!("{} – {}", fmt_date(w.start), fmt_date(w.end))),
    );
    println!(
        "  Average cycle length: {} days",
        tracker.average_cycle_length(recent)
    );
    print_line(
        "Average period duration",
        tracker
            .average_period_length()
            .map(|days| format!("{} days", days)),
    );
    println!();
    Ok(())
}

fn cmd_clear<S: PeriodStore>(tracker: &mut PeriodTracker<S>, yes: bool) -> Result<()> {
    if !yes {
        println!("Refusing to delete {} periods without --yes.", tracker.ledger().len());
        return Ok(());
    }

    let count = tracker.ledger().len();
    tracker.clear()?;
    println!("✓ Deleted {} periods", count);
    Ok(())
}

/// Print one overview line; missing data becomes a prompt instead of an error
fn print_line<T: Display>(label: &str, value: Result<T>) {
    match value {
        Ok(value) => println!("  {}: {}", label, value),
        Err(e) if e.is_not_enough_data() => {
            println!("  {}: not enough data, log more periods", label)
        }
        Err(e) => println!("  {}: unavailable ({})", label, e),
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn describe_range(start: NaiveDate, end: Option<NaiveDate>) -> String {
    match end {
        Some(end) => format!("{} – {}", fmt_date(start), fmt_date(end)),
        None => format!("{} – ongoing", fmt_date(start)),
    }
}
