//! Catalog-Ripple main entry point
//!
//! This is the command-line interface for the Catalog-Ripple spec harvester.

use catalog_ripple::config::{load_config_or_default, validate, Config};
use catalog_ripple::crawler::run_harvest;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Catalog-Ripple: a resumable catalog specification harvester
///
/// Catalog-Ripple walks a product catalog (category, series, item), keeps
/// its progress in a SQLite state store, and appends every item's
/// specification table to a CSV log. Re-running picks up where the last
/// run stopped.
#[derive(Parser, Debug)]
#[command(name = "catalog-ripple")]
#[command(version = "1.0.0")]
#[command(about = "A resumable catalog specification harvester", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output CSV log path
    #[arg(long, value_name = "PATH")]
    out: Option<String>,

    /// State store (SQLite) path
    #[arg(long, value_name = "PATH")]
    db: Option<String>,

    /// Session credential file path
    #[arg(long, value_name = "PATH")]
    storage_state: Option<String>,

    /// Run with a visible session (navigations are logged at info level)
    #[arg(long)]
    headful: bool,

    /// Maximum number of items to scrape this run (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_items: Option<usize>,

    /// Skip discovery and only scrape items already in the state store
    #[arg(long)]
    skip_discovery: bool,

    /// Re-attempt items whose last attempt failed
    #[arg(long)]
    retry_errors: bool,

    /// Number of concurrent extraction workers
    #[arg(long, value_name = "N")]
    workers: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show statistics from the state store and exit
    #[arg(long, conflicts_with = "compact_output")]
    stats: bool,

    /// Rewrite the output log keeping only each item's latest attempt, then exit
    #[arg(long, conflicts_with = "stats")]
    compact_output: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(out) = &self.out {
            config.output.csv_path = out.clone();
        }
        if let Some(db) = &self.db {
            config.output.database_path = db.clone();
        }
        if let Some(state) = &self.storage_state {
            config.session.storage_state_path = state.clone();
        }
        if self.headful {
            config.session.headless = false;
        }
        if let Some(max_items) = self.max_items {
            config.run.max_items = max_items;
        }
        if self.skip_discovery {
            config.run.skip_discovery = true;
        }
        if self.retry_errors {
            config.run.retry_errors = true;
        }
        if let Some(workers) = self.workers {
            config.run.workers = workers;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match load_config_or_default(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    cli.apply_to(&mut config);
    validate(&config)?;

    // Handle different modes
    if cli.stats {
        handle_stats(&config)?;
    } else if cli.compact_output {
        handle_compact(&config)?;
    } else {
        handle_run(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_ripple=info,warn"),
            1 => EnvFilter::new("catalog_ripple=debug,info"),
            2 => EnvFilter::new("catalog_ripple=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --stats mode: shows completion counts from the state store
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_ripple::output::{load_statistics, print_statistics};
    use catalog_ripple::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --compact-output mode: deduplicates the output log
fn handle_compact(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_ripple::output::compact_log;
    use std::path::Path;

    let report = compact_log(Path::new(&config.output.csv_path))?;
    println!(
        "Compacted {}: {} -> {} rows ({} items)",
        config.output.csv_path, report.rows_before, report.rows_after, report.items
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Output: {}, state store: {}, credentials: {}",
        config.output.csv_path,
        config.output.database_path,
        config.session.storage_state_path
    );

    match run_harvest(config).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} queued, {} ok, {} errors",
                summary.queued,
                summary.succeeded,
                summary.failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
