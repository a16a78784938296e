//! Output module for the specification log and run reports
//!
//! This module handles:
//! - Appending extracted specification rows to the CSV log
//! - Optional compaction of the log to the latest attempt per item
//! - Completion statistics read back from the state store

mod sink;
pub mod stats;

pub use sink::{compact_log, CompactReport, CsvSink, ItemMeta, SpecRow, LOG_HEADER};
pub use stats::{load_statistics, print_statistics, RunStatistics};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
