//! Extraction of one item's specification table

use crate::crawler::governor::Session;
use crate::crawler::parser::{has_spec_panel, parse_spec_page, SpecField};
use crate::storage::ItemRecord;
use crate::RippleError;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why an item could not be extracted
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Navigation(#[from] RippleError),

    #[error("Specification panel not found on {url} after {waited_ms} ms")]
    PanelMissing { url: String, waited_ms: u64 },
}

/// The data read from one detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Canonical product title (may be empty)
    pub product_name: String,

    /// Labeled specifications in rendered order
    pub fields: Vec<SpecField>,
}

/// Fetches `item`'s detail page and reads its specifications
///
/// The page is re-fetched every `panel_poll_ms` (plus the item pacing
/// jitter) until the specification panel shows up or `panel_timeout_ms` has
/// elapsed. The last re-fetch happens at the deadline.
pub async fn extract(session: &Session, item: &ItemRecord) -> Result<Extraction, ExtractionError> {
    let timeout = Duration::from_millis(session.retry().panel_timeout_ms);
    let started = Instant::now();

    loop {
        let html = session.navigate(&item.detail_url).await?;

        if has_spec_panel(&html) {
            let (product_name, fields) = parse_spec_page(&html, &item.detail_url)?;
            return Ok(Extraction {
                product_name,
                fields,
            });
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(ExtractionError::PanelMissing {
                url: item.detail_url.clone(),
                waited_ms: waited.as_millis() as u64,
            });
        }

        tracing::debug!("Specification panel not ready on {}, polling again", item.detail_url);
        tokio::time::sleep(session.panel_poll_delay().min(timeout - waited)).await;
    }
}
