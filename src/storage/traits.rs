//! Storage traits and error types
//!
//! This module defines the trait interface for state store backends and
//! associated error types.

use crate::state::OutcomeStatus;
use crate::storage::{ItemRecord, OutcomeRecord, SeriesRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unknown outcome status '{status}' for item {item_id}")]
    UnknownStatus { item_id: String, status: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for state store implementations
///
/// The store is the single source of truth for resumption. Graph nodes are
/// insert-if-absent and never updated; outcomes are upserted per item. Every
/// method commits on its own, so a crash between calls leaves the store
/// consistent.
pub trait Storage {
    // ===== Discovery Graph =====

    /// Inserts series nodes, ignoring URLs that already exist
    ///
    /// # Returns
    ///
    /// The number of series that were new
    fn insert_series(&mut self, series: &[SeriesRecord]) -> StorageResult<usize>;

    /// Inserts item nodes, ignoring ids that already exist
    ///
    /// The first category/family mapping recorded for an id is kept; later
    /// duplicates are dropped silently.
    ///
    /// # Returns
    ///
    /// The number of items that were new
    fn insert_items(&mut self, items: &[ItemRecord]) -> StorageResult<usize>;

    /// Gets all series ordered by URL
    fn get_series(&self) -> StorageResult<Vec<SeriesRecord>>;

    /// Gets all items ordered by id
    fn get_items(&self) -> StorageResult<Vec<ItemRecord>>;

    /// Gets an item by id
    fn get_item(&self, id: &str) -> StorageResult<Option<ItemRecord>>;

    /// Gets every item with the status of its latest outcome, ordered by id
    fn get_items_with_status(&self) -> StorageResult<Vec<(ItemRecord, Option<OutcomeStatus>)>>;

    // ===== Outcomes =====

    /// Records the outcome of an attempt, replacing any previous one
    fn upsert_outcome(&mut self, outcome: &OutcomeRecord) -> StorageResult<()>;

    /// Gets the latest outcome for an item
    fn get_outcome(&self, item_id: &str) -> StorageResult<Option<OutcomeRecord>>;

    /// Gets the most recent failures, newest first
    fn get_recent_errors(&self, limit: usize) -> StorageResult<Vec<OutcomeRecord>>;

    // ===== Statistics =====

    /// Counts discovered series
    fn count_series(&self) -> StorageResult<u64>;

    /// Counts discovered items
    fn count_items(&self) -> StorageResult<u64>;

    /// Counts outcomes with the given status
    fn count_outcomes_by_status(&self, status: OutcomeStatus) -> StorageResult<u64>;
}
