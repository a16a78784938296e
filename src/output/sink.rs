//! Append-only CSV log of specification rows
//!
//! The log is a write-once journal: re-scraping an item appends a fresh set
//! of rows and never touches the old ones. `compact_log` is the only code
//! path that rewrites it, and it only runs when explicitly requested.

use crate::crawler::SpecField;
use crate::output::OutputResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Column names of the log, in order
pub const LOG_HEADER: [&str; 9] = [
    "id",
    "product_name",
    "source_url",
    "category",
    "family",
    "spec_group",
    "spec_field",
    "spec_value",
    "scraped_at",
];

/// One extracted (group, field, value) fact, as written to the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRow {
    #[serde(rename = "id")]
    pub item_id: String,
    pub product_name: String,
    pub source_url: String,
    pub category: String,
    pub family: String,
    #[serde(rename = "spec_group")]
    pub group_name: String,
    #[serde(rename = "spec_field")]
    pub field_name: String,
    #[serde(rename = "spec_value")]
    pub field_value: String,
    #[serde(rename = "scraped_at")]
    pub timestamp: String,
}

/// Item-level columns shared by every row of one attempt
#[derive(Debug, Clone, Copy)]
pub struct ItemMeta<'a> {
    pub item_id: &'a str,
    pub product_name: &'a str,
    pub source_url: &'a str,
    pub category: &'a str,
    pub family: &'a str,
}

/// Writer for the append-only specification log
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Creates a sink writing to `path`; nothing is opened until the first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one attempt's rows, all stamped with `timestamp`
    ///
    /// The header is written only when the file is new (absent or empty).
    ///
    /// # Returns
    ///
    /// The number of rows written
    pub fn append(
        &self,
        meta: &ItemMeta<'_>,
        fields: &[SpecField],
        timestamp: &str,
    ) -> OutputResult<usize> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let is_new = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);

        for field in fields {
            writer.serialize(SpecRow {
                item_id: meta.item_id.to_string(),
                product_name: meta.product_name.to_string(),
                source_url: meta.source_url.to_string(),
                category: meta.category.to_string(),
                family: meta.family.to_string(),
                group_name: field.group.clone(),
                field_name: field.field.clone(),
                field_value: field.value.clone(),
                timestamp: timestamp.to_string(),
            })?;
        }

        writer.flush()?;
        Ok(fields.len())
    }

    /// Reads every row currently in the log
    pub fn read_rows(&self) -> OutputResult<Vec<SpecRow>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<SpecRow>, _>>()?;
        Ok(rows)
    }
}

/// Result of a compaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactReport {
    pub rows_before: usize,
    pub rows_after: usize,
    pub items: usize,
}

/// Rewrites the log keeping only each item's latest attempt
///
/// For every item id, rows whose `scraped_at` equals the newest
/// `scraped_at` seen for that id are kept (an attempt writes all of its rows
/// with one timestamp, so ties keep the whole attempt). Row order is
/// preserved. The rewrite goes through a temporary file and a rename.
pub fn compact_log(path: &Path) -> OutputResult<CompactReport> {
    let sink = CsvSink::new(path);
    let rows = sink.read_rows()?;

    let mut latest: HashMap<&str, &str> = HashMap::new();
    for row in &rows {
        let entry = latest.entry(row.item_id.as_str()).or_insert(row.timestamp.as_str());
        if row.timestamp.as_str() > *entry {
            *entry = row.timestamp.as_str();
        }
    }

    let kept: Vec<&SpecRow> = rows
        .iter()
        .filter(|row| latest.get(row.item_id.as_str()) == Some(&row.timestamp.as_str()))
        .collect();

    let report = CompactReport {
        rows_before: rows.len(),
        rows_after: kept.len(),
        items: latest.len(),
    };

    if report.rows_after == report.rows_before {
        return Ok(report);
    }

    let tmp_path = path.with_extension("compact.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp_path)?;
        for row in &kept {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, path)?;

    tracing::info!(
        "Compacted {}: {} -> {} rows across {} items",
        path.display(),
        report.rows_before,
        report.rows_after,
        report.items
    );

    Ok(report)
}
