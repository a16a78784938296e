//! Discovery walk over the catalog graph (category -> series -> item)
//!
//! Every node found is written straight into the state store with
//! insert-if-absent semantics, so walking the same catalog twice is safe.
//! A page that cannot be fetched or read is logged and its subtree skipped.

use crate::config::CatalogConfig;
use crate::crawler::governor::Session;
use crate::crawler::parser::{parse_categories, parse_item_rows, parse_series_links};
use crate::storage::{SeriesRecord, Storage};
use crate::RippleError;

/// What a discovery walk found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkReport {
    /// Categories read from the root page
    pub categories: usize,

    /// Series links found across all categories (including known ones)
    pub series: usize,

    /// Item rows accepted across all series listings
    pub items_seen: usize,

    /// Items that were not yet in the store
    pub items_new: usize,

    /// Discovery pages (or category panels) skipped after navigation or
    /// parsing failed
    pub pages_failed: usize,
}

/// Walks the catalog and records series and items in `storage`
///
/// Store failures are fatal and propagate; page failures are not.
pub async fn walk(
    session: &Session,
    catalog: &CatalogConfig,
    storage: &mut dyn Storage,
) -> Result<WalkReport, RippleError> {
    let mut report = WalkReport::default();

    let root = session.navigate(&catalog.root_url).await.and_then(|html| {
        let categories = parse_categories(&html, &catalog.root_url, &catalog.panel_key)?;
        Ok((html, categories))
    });
    let (root, categories) = match root {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::error!("Catalog root {} unusable, skipping discovery: {}", catalog.root_url, e);
            report.pages_failed += 1;
            return Ok(report);
        }
    };
    report.categories = categories.len();
    tracing::info!("Found {} categories", categories.len());

    let mut series_found: Vec<SeriesRecord> = Vec::new();
    // Every category's link panel is already in the root document; selecting
    // a category only reveals it.
    for category in &categories {
        let series = match parse_series_links(
            &root,
            &catalog.root_url,
            category,
            session.base_url(),
            &catalog.series_pattern,
        ) {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!("Skipping category '{}': {}", category.name, e);
                report.pages_failed += 1;
                continue;
            }
        };

        let inserted = storage.insert_series(&series)?;
        tracing::info!(
            "Category '{}': {} series ({} new)",
            category.name,
            series.len(),
            inserted
        );
        report.series += series.len();

        for record in series {
            if !series_found.iter().any(|s| s.url == record.url) {
                series_found.push(record);
            }
        }
    }

    for series in &series_found {
        session.pace_discovery().await;

        let items = match session.navigate(&series.url).await.and_then(|html| {
            parse_item_rows(
                &html,
                series,
                session.base_url(),
                &catalog.item_link_pattern,
                &catalog.spec_pattern,
            )
        }) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Skipping series '{}' ({}): {}", series.family, series.url, e);
                report.pages_failed += 1;
                continue;
            }
        };

        let inserted = storage.insert_items(&items)?;
        tracing::debug!(
            "Series '{}': {} items ({} new)",
            series.family,
            items.len(),
            inserted
        );
        report.items_seen += items.len();
        report.items_new += inserted;
    }

    tracing::info!(
        "Discovery finished: {} categories, {} series, {} items ({} new), {} pages failed",
        report.categories,
        report.series,
        report.items_seen,
        report.items_new,
        report.pages_failed
    );

    Ok(report)
}
