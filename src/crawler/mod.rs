//! Crawler module for catalog discovery and specification extraction
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - Session pacing and credential checkpointing
//! - HTML parsing of catalog pages
//! - The discovery walk, work queue and extraction worker
//! - Overall run coordination

mod coordinator;
mod discovery;
mod extractor;
mod fetcher;
mod governor;
mod parser;
mod queue;

pub use coordinator::{run_harvest, Coordinator, RunSummary};
pub use discovery::{walk, WalkReport};
pub use extractor::{extract, Extraction, ExtractionError};
pub use fetcher::{build_http_client, fetch_once, fetch_with_retry};
pub use governor::{Pacer, Session};
pub use parser::{
    has_spec_panel, normalize_text, parse_categories, parse_item_rows, parse_series_links,
    parse_spec_page, CategoryNode, SpecField, PRODUCT_TABLE_SELECTOR, SPEC_PANEL_SELECTOR,
};
pub use queue::build_work_queue;
