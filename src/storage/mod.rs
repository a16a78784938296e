//! Storage module for persisting discovery and scrape progress
//!
//! This module handles all state store operations, including:
//! - SQLite database initialization and schema management
//! - Insert-if-absent persistence of discovered series and items
//! - Upsert persistence of per-item scrape outcomes
//! - Read queries backing the work queue and statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::state::OutcomeStatus;
use crate::RippleError;
use chrono::{SecondsFormat, Utc};
use std::path::Path;

/// Initializes or opens a state store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(RippleError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, RippleError> {
    SqliteStorage::new(path)
}

/// Current UTC time as an RFC 3339 timestamp with second precision
///
/// e.g. `2024-05-01T12:00:00+00:00`
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// A series listing page discovered under a category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRecord {
    pub category: String,
    pub family: String,
    pub url: String,
}

/// An item (SKU) discovered in a series table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub id: String,
    pub category: String,
    pub family: String,
    pub detail_url: String,
    pub display_name: Option<String>,
}

/// The latest extraction outcome for an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeRecord {
    pub item_id: String,
    pub timestamp: String,
    pub status: OutcomeStatus,
    pub error_detail: Option<String>,
}

impl OutcomeRecord {
    /// A successful attempt at `timestamp`
    pub fn ok(item_id: &str, timestamp: &str) -> Self {
        Self {
            item_id: item_id.to_string(),
            timestamp: timestamp.to_string(),
            status: OutcomeStatus::Ok,
            error_detail: None,
        }
    }

    /// A failed attempt at `timestamp` with a human-readable detail
    pub fn error(item_id: &str, timestamp: &str, detail: impl Into<String>) -> Self {
        Self {
            item_id: item_id.to_string(),
            timestamp: timestamp.to_string(),
            status: OutcomeStatus::Error,
            error_detail: Some(detail.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = now_timestamp();
        assert!(ts.ends_with("+00:00"), "unexpected timestamp {}", ts);
        assert_eq!(ts.len(), "2024-05-01T12:00:00+00:00".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = OutcomeRecord::ok("123", "t");
        assert_eq!(ok.status, OutcomeStatus::Ok);
        assert!(ok.error_detail.is_none());

        let err = OutcomeRecord::error("123", "t", "timeout");
        assert_eq!(err.status, OutcomeStatus::Error);
        assert_eq!(err.error_detail.as_deref(), Some("timeout"));
    }
}
