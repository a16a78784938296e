//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::OutcomeStatus;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{ItemRecord, OutcomeRecord, SeriesRecord};
use crate::RippleError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ITEM_COLUMNS: &str = "id, category, family, detail_url, display_name";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(RippleError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, RippleError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, RippleError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ItemRecord> {
    Ok(ItemRecord {
        id: row.get(0)?,
        category: row.get(1)?,
        family: row.get(2)?,
        detail_url: row.get(3)?,
        display_name: row.get(4)?,
    })
}

fn parse_status(item_id: &str, status: String) -> StorageResult<OutcomeStatus> {
    OutcomeStatus::from_db_string(&status).ok_or_else(|| StorageError::UnknownStatus {
        item_id: item_id.to_string(),
        status,
    })
}

/// Raw outcome row before the status string is validated
type RawOutcome = (String, String, String, Option<String>);

fn outcome_from_raw(raw: RawOutcome) -> StorageResult<OutcomeRecord> {
    let (item_id, timestamp, status, error_detail) = raw;
    let status = parse_status(&item_id, status)?;
    Ok(OutcomeRecord {
        item_id,
        timestamp,
        status,
        error_detail,
    })
}

impl Storage for SqliteStorage {
    // ===== Discovery Graph =====

    fn insert_series(&mut self, series: &[SeriesRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO discovered_series (url, category, family) VALUES (?1, ?2, ?3)",
            )?;
            for s in series {
                inserted += stmt.execute(params![s.url, s.category, s.family])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn insert_items(&mut self, items: &[ItemRecord]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO discovered_items (id, category, family, detail_url, display_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for item in items {
                inserted += stmt.execute(params![
                    item.id,
                    item.category,
                    item.family,
                    item.detail_url,
                    item.display_name
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn get_series(&self) -> StorageResult<Vec<SeriesRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, category, family FROM discovered_series ORDER BY url")?;

        let series = stmt
            .query_map([], |row| {
                Ok(SeriesRecord {
                    url: row.get(0)?,
                    category: row.get(1)?,
                    family: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(series)
    }

    fn get_items(&self) -> StorageResult<Vec<ItemRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM discovered_items ORDER BY id",
            ITEM_COLUMNS
        ))?;

        let items = stmt
            .query_map([], item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn get_item(&self, id: &str) -> StorageResult<Option<ItemRecord>> {
        let item = self
            .conn
            .query_row(
                &format!("SELECT {} FROM discovered_items WHERE id = ?1", ITEM_COLUMNS),
                params![id],
                item_from_row,
            )
            .optional()?;

        Ok(item)
    }

    fn get_items_with_status(&self) -> StorageResult<Vec<(ItemRecord, Option<OutcomeStatus>)>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.id, i.category, i.family, i.detail_url, i.display_name, o.status
             FROM discovered_items i
             LEFT JOIN scrape_outcomes o ON o.item_id = i.id
             ORDER BY i.id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let item = item_from_row(row)?;
                let status: Option<String> = row.get(5)?;
                Ok((item, status))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(item, status)| {
                let status = match status {
                    Some(s) => Some(parse_status(&item.id, s)?),
                    None => None,
                };
                Ok((item, status))
            })
            .collect()
    }

    // ===== Outcomes =====

    fn upsert_outcome(&mut self, outcome: &OutcomeRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO scrape_outcomes (item_id, scraped_at, status, last_error)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                outcome.item_id,
                outcome.timestamp,
                outcome.status.to_db_string(),
                outcome.error_detail
            ],
        )?;
        Ok(())
    }

    fn get_outcome(&self, item_id: &str) -> StorageResult<Option<OutcomeRecord>> {
        let raw: Option<RawOutcome> = self
            .conn
            .query_row(
                "SELECT item_id, scraped_at, status, last_error FROM scrape_outcomes WHERE item_id = ?1",
                params![item_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        raw.map(outcome_from_raw).transpose()
    }

    fn get_recent_errors(&self, limit: usize) -> StorageResult<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_id, scraped_at, status, last_error FROM scrape_outcomes
             WHERE status = ?1
             ORDER BY scraped_at DESC, item_id
             LIMIT ?2",
        )?;

        let raws = stmt
            .query_map(
                params![OutcomeStatus::Error.to_db_string(), limit as i64],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?
            .collect::<Result<Vec<RawOutcome>, _>>()?;

        raws.into_iter().map(outcome_from_raw).collect()
    }

    // ===== Statistics =====

    fn count_series(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM discovered_series", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_items(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM discovered_items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_outcomes_by_status(&self, status: OutcomeStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM scrape_outcomes WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
