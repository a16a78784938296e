//! Statistics generation from the state store
//!
//! The store is the only record of completion; these counts are what a
//! finished (or interrupted) run is summarised by.

use crate::state::OutcomeStatus;
use crate::storage::{OutcomeRecord, Storage};
use crate::RippleError;

/// How many recent failures `--stats` lists
const RECENT_ERROR_LIMIT: usize = 10;

/// Completion statistics summary
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
    /// Number of series listing pages discovered
    pub series: u64,

    /// Number of items discovered
    pub items: u64,

    /// Items whose latest attempt succeeded
    pub ok: u64,

    /// Items whose latest attempt failed
    pub errors: u64,

    /// Most recent failures, newest first
    pub recent_errors: Vec<OutcomeRecord>,
}

impl RunStatistics {
    /// Items never attempted
    pub fn never_attempted(&self) -> u64 {
        self.items.saturating_sub(self.ok + self.errors)
    }

    /// Share of discovered items that are done, in percent
    pub fn completion_percent(&self) -> f64 {
        if self.items == 0 {
            0.0
        } else {
            (self.ok as f64 / self.items as f64) * 100.0
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Successfully loaded statistics
/// * `Err(RippleError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<RunStatistics, RippleError> {
    Ok(RunStatistics {
        series: storage.count_series()?,
        items: storage.count_items()?,
        ok: storage.count_outcomes_by_status(OutcomeStatus::Ok)?,
        errors: storage.count_outcomes_by_status(OutcomeStatus::Error)?,
        recent_errors: storage.get_recent_errors(RECENT_ERROR_LIMIT)?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Discovery:");
    println!("  Series discovered: {}", stats.series);
    println!("  Items discovered: {}", stats.items);
    println!();

    println!("Outcomes:");
    println!("  ok: {}", stats.ok);
    println!("  error: {}", stats.errors);
    println!("  never attempted: {}", stats.never_attempted());
    println!();

    if !stats.recent_errors.is_empty() {
        println!("Recent Errors:");
        for outcome in &stats.recent_errors {
            println!(
                "  - {} at {}: {}",
                outcome.item_id,
                outcome.timestamp,
                outcome.error_detail.as_deref().unwrap_or("(no detail)")
            );
        }
        println!();
    }

    println!(
        "Completion: {:.1}% ({} / {} items)",
        stats.completion_percent(),
        stats.ok,
        stats.items
    );
}
