//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Catalog-Ripple state store.

/// SQL schema for the database
///
/// Graph nodes (`discovered_series`, `discovered_items`) are written with
/// insert-if-absent; `scrape_outcomes` is written with upsert.
pub const SCHEMA_SQL: &str = r#"
-- Series listing pages, one row per distinct URL
CREATE TABLE IF NOT EXISTS discovered_series (
    url TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    family TEXT NOT NULL
);

-- Items (SKUs); the first category/family mapping seen is kept
CREATE TABLE IF NOT EXISTS discovered_items (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    family TEXT NOT NULL,
    detail_url TEXT NOT NULL,
    display_name TEXT
);

-- Latest extraction outcome per item
CREATE TABLE IF NOT EXISTS scrape_outcomes (
    item_id TEXT PRIMARY KEY,
    scraped_at TEXT NOT NULL,
    status TEXT NOT NULL,
    last_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_scrape_outcomes_status ON scrape_outcomes(status);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
