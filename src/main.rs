use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault_tracker::db::SETTING_LAST_WEEK_ID;
use vault_tracker::import::{locate_export, read_export, reset_weekly_all};
use vault_tracker::report::{attach_notes, write_csv_file};
use vault_tracker::{
    analyze_all, build_report, check_weekly_reset, current_week_id, extract_export, next_reset,
    reset_boundary, run_import, AppConfig, Clock, ConsoleNotifier, FixedClock, ImportOptions,
    ImportOutcome, NotificationLog, RosterStore, SettingsStore, SqliteStore, Status, SystemClock,
    TableParser,
};

#[derive(Parser)]
#[command(name = "vault-tracker")]
#[command(about = "Weekly gear and Great Vault tracker fed by the addon export")]
#[command(version)]
struct Cli {
    /// SQLite database (overrides VAULT_TRACKER_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the addon export into the stored roster
    Import {
        /// Export file; discovered from the game install when omitted
        file: Option<PathBuf>,

        /// Skip unchanged exports and suppress result messages
        #[arg(long)]
        silent: bool,
    },
    /// Print the gear & vault report for an export
    Report {
        file: Option<PathBuf>,

        /// Hide characters that are done for the week
        #[arg(long)]
        hide_done: bool,

        /// Also write the report as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Apply the weekly reset if a new week has started
    Reset {
        /// Zero weekly fields even within the same week
        #[arg(long)]
        force: bool,
    },
    /// Show the week id and reset boundaries
    Week {
        /// Instant to evaluate instead of now (RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },
    /// List the stored roster
    List,
    /// Parse a file and print the resulting value tree
    Dump {
        file: PathBuf,

        /// Print as JSON instead of table text
        #[arg(long)]
        json: bool,
    },
    /// Show notification history
    Notifications {
        #[arg(long)]
        clear: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vault_tracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match cli.command {
        Commands::Import { file, silent } => run_import_command(&config, file.as_deref(), silent),
        Commands::Report { file, hide_done, csv } => {
            run_report(&config, file.as_deref(), hide_done, csv.as_deref())
        }
        Commands::Reset { force } => run_reset(&config, force),
        Commands::Week { at } => show_week(at.as_deref()),
        Commands::List => list_roster(&config),
        Commands::Dump { file, json } => dump_file(&config, &file, json),
        Commands::Notifications { clear } => show_notifications(&config, clear),
    }
}

fn open_store(config: &AppConfig) -> Result<SqliteStore> {
    SqliteStore::open(&config.db_path)
}

fn require_export(config: &AppConfig, store: &SqliteStore, file: Option<&Path>) -> Result<PathBuf> {
    match locate_export(file, config, store)? {
        Some(path) => Ok(path),
        None => bail!(
            "Could not find the addon export; pass a FILE or set VAULT_TRACKER_EXPORT / VAULT_TRACKER_GAME_PATH"
        ),
    }
}

fn run_import_command(config: &AppConfig, file: Option<&Path>, silent: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let clock = SystemClock;

    if check_weekly_reset(&mut store, &clock)? {
        println!("🔄 New week {}: weekly progress reset", current_week_id(&clock));
    }

    let path = require_export(config, &store, file)?;
    if !silent {
        println!("📂 Reading {}", path.display());
    }
    let text = read_export(&path)?;

    let options = ImportOptions {
        silent,
        parser: TableParser::with_max_depth(config.max_depth),
    };
    let mut notifier = ConsoleNotifier;
    match run_import(&mut store, &text, &options, &clock, &mut notifier)? {
        ImportOutcome::Unchanged | ImportOutcome::NoData => {}
        ImportOutcome::Imported { report, .. } => {
            if !silent {
                println!(
                    "✓ Roster: {} characters (week {})",
                    report.roster.len(),
                    report.week
                );
                if report.skipped > 0 {
                    println!("⚠️  Skipped {} entries without a name or realm", report.skipped);
                }
            }
        }
    }

    Ok(())
}

fn run_report(
    config: &AppConfig,
    file: Option<&Path>,
    hide_done: bool,
    csv: Option<&Path>,
) -> Result<()> {
    let store = open_store(config)?;
    let path = require_export(config, &store, file)?;
    let text = read_export(&path)?;

    let document = extract_export(&TableParser::with_max_depth(config.max_depth).parse(&text));
    if document.is_empty() {
        bail!("No character data found in {}", path.display());
    }

    let week = current_week_id(&SystemClock);
    let mut analyses = analyze_all(&document.characters, &week);
    attach_notes(&mut analyses, &store.load_roster()?);
    if hide_done {
        analyses.retain(|a| a.status != Status::Done);
    }

    print!("{}", build_report(&analyses));

    if let Some(csv_path) = csv {
        write_csv_file(&analyses, csv_path)?;
        eprintln!("✓ CSV written to {}", csv_path.display());
    }

    Ok(())
}

fn run_reset(config: &AppConfig, force: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let clock = SystemClock;

    if force {
        let current = current_week_id(&clock);
        let previous = store.get_setting(SETTING_LAST_WEEK_ID)?.unwrap_or_default();
        let count = reset_weekly_all(&mut store, &previous, &current)?;
        println!("🔄 Weekly progress reset for {} characters (week {})", count, current);
    } else if check_weekly_reset(&mut store, &clock)? {
        println!("🔄 New week {}: weekly progress reset", current_week_id(&clock));
    } else {
        println!("✓ Still week {}; nothing to reset", current_week_id(&clock));
    }

    Ok(())
}

fn show_week(at: Option<&str>) -> Result<()> {
    let now = match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid RFC 3339 timestamp: {}", raw))?
            .with_timezone(&Utc),
        None => SystemClock.now(),
    };
    let clock = FixedClock::at(now);

    println!("📅 Week {}", current_week_id(&clock));
    println!("   Started: {}", reset_boundary(now).to_rfc3339());
    println!("   Next reset: {}", next_reset(now).to_rfc3339());
    Ok(())
}

fn list_roster(config: &AppConfig) -> Result<()> {
    let store = open_store(config)?;
    let roster = store.load_roster()?;

    if roster.is_empty() {
        println!("No characters stored yet. Run `vault-tracker import` first.");
        return Ok(());
    }

    println!("📋 {} characters", roster.len());
    for c in &roster {
        println!(
            "  {:<28} {:>6.1} ilvl  delves {}  vault {}  week {}",
            c.full_name(),
            c.item_level,
            c.delves,
            if c.vault_visited { "✓" } else { "-" },
            if c.week_id.is_empty() { "-" } else { c.week_id.as_str() }
        );
        for issue in c.validate() {
            println!("    ⚠️  {}", issue);
        }
    }
    Ok(())
}

fn dump_file(config: &AppConfig, file: &Path, json: bool) -> Result<()> {
    let text = read_export(file)?;
    let value = TableParser::with_max_depth(config.max_depth)
        .try_parse(&text)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn show_notifications(config: &AppConfig, clear: bool) -> Result<()> {
    let mut store = open_store(config)?;

    if clear {
        let removed = store.clear_notifications()?;
        println!("🗑️  Cleared {} notifications", removed);
        return Ok(());
    }

    let list = store.notifications()?;
    if list.is_empty() {
        println!("No notifications.");
    }
    for n in &list {
        println!("{} {}  {}", n.kind.symbol(), n.display_time(), n.message);
    }
    Ok(())
}
