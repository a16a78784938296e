//! HTML parsing for catalog pages
//!
//! This module reads the four page shapes of the catalog:
//! - the root page's category tiles and their series-link panels
//! - series listing tables (one row per item)
//! - item detail pages with labeled specification sections
//!
//! Parsing is synchronous and returns owned data; the parsed document never
//! outlives the call.

use crate::storage::{ItemRecord, SeriesRecord};
use crate::url::{matches_pattern, resolve_href};
use crate::RippleError;
use scraper::{ElementRef, Html, Node, Selector};
use url::Url;

/// Selector for the specification panel of a detail page
pub const SPEC_PANEL_SELECTOR: &str = "div.tab-pane#specifications section.upe-tech-spec";

/// Selector for the item table of a series page
pub const PRODUCT_TABLE_SELECTOR: &str = "table#product-table";

/// A top-level catalog partition, re-derived on every walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// Display name of the category tile
    pub name: String,

    /// Key of the link panel this tile reveals
    pub panel_key: String,
}

/// One labeled specification value, in page order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecField {
    pub group: String,
    pub field: String,
    pub value: String,
}

/// Collapses whitespace (including non-breaking spaces) and trims
///
/// # Example
///
/// ```
/// use catalog_ripple::crawler::normalize_text;
///
/// assert_eq!(normalize_text(" Max Turbo  Frequency "), "Max Turbo Frequency");
/// assert_eq!(normalize_text("4.70\u{a0}GHz "), "4.70 GHz");
/// ```
pub fn normalize_text(value: &str) -> String {
    value
        .replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Result<Selector, RippleError> {
    Selector::parse(css).map_err(|e| RippleError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Escapes a value for use inside a double-quoted attribute selector
fn quote_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn missing(url: &str, selector: &str) -> RippleError {
    RippleError::MissingElement {
        url: url.to_string(),
        selector: selector.to_string(),
    }
}

/// Rendered text of an element
///
/// Line-breaking elements contribute a space so that `a<br>b` reads as
/// `a b`, the way a browser renders it.
fn element_text(element: &ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(e) if matches!(e.name(), "br" | "p" | "div" | "li" | "tr") => {
                out.push(' ')
            }
            _ => {}
        }
    }
    normalize_text(&out)
}

fn first_text(scope: &ElementRef<'_>, sel: &Selector) -> String {
    scope
        .select(sel)
        .next()
        .map(|e| element_text(&e))
        .unwrap_or_default()
}

/// Reads the category tiles of the root page's `panel_key` panel
///
/// Tiles without a name are skipped; a repeated name keeps its first tile.
/// A tile's `data-panel-key` names the link panel it reveals, defaulting to
/// its display name.
pub fn parse_categories(
    html: &str,
    page_url: &str,
    panel_key: &str,
) -> Result<Vec<CategoryNode>, RippleError> {
    let document = Html::parse_document(html);

    let panel_css = format!(
        "div.product-categories[data-parent-panel-key=\"{}\"]",
        quote_attr(panel_key)
    );
    let panel_sel = selector(&panel_css)?;
    let tile_sel = selector("div.product-category")?;
    let name_sel = selector("span.name")?;

    let panel = document
        .select(&panel_sel)
        .next()
        .ok_or_else(|| missing(page_url, &panel_css))?;

    let mut categories: Vec<CategoryNode> = Vec::new();
    for tile in panel.select(&tile_sel) {
        let name = first_text(&tile, &name_sel);
        if name.is_empty() || categories.iter().any(|c| c.name == name) {
            continue;
        }

        let key = tile
            .value()
            .attr("data-panel-key")
            .map(normalize_text)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| name.clone());

        categories.push(CategoryNode {
            name,
            panel_key: key,
        });
    }

    Ok(categories)
}

/// Reads the series links revealed by selecting `category`
///
/// Links with an empty href or empty text, or whose href does not contain
/// `series_pattern`, are dropped. Hrefs are resolved against `base`.
pub fn parse_series_links(
    html: &str,
    page_url: &str,
    category: &CategoryNode,
    base: &Url,
    series_pattern: &str,
) -> Result<Vec<SeriesRecord>, RippleError> {
    let document = Html::parse_document(html);

    let panel_css = format!(
        "div.products[data-parent-panel-key=\"{}\"]",
        quote_attr(&category.panel_key)
    );
    let panel_sel = selector(&panel_css)?;
    let link_sel = selector("a.ark-accessible-color")?;

    let panel = document
        .select(&panel_sel)
        .next()
        .ok_or_else(|| missing(page_url, &panel_css))?;

    let mut series = Vec::new();
    for link in panel.select(&link_sel) {
        let href = match link.value().attr("href") {
            Some(h) if !h.trim().is_empty() => h,
            _ => continue,
        };
        let text = element_text(&link);
        if text.is_empty() || !matches_pattern(href, series_pattern) {
            continue;
        }

        match resolve_href(base, href) {
            Ok(url) => series.push(SeriesRecord {
                category: category.name.clone(),
                family: text,
                url: url.to_string(),
            }),
            Err(e) => tracing::debug!("Skipping series link {}: {}", href, e),
        }
    }

    Ok(series)
}

/// Reads the item rows of a series listing table
///
/// A row needs a non-empty `data-product-id` and a name-cell link whose href
/// contains `item_link_pattern` and `spec_pattern`; other rows are skipped.
pub fn parse_item_rows(
    html: &str,
    series: &SeriesRecord,
    base: &Url,
    item_link_pattern: &str,
    spec_pattern: &str,
) -> Result<Vec<ItemRecord>, RippleError> {
    let document = Html::parse_document(html);

    let table_sel = selector(PRODUCT_TABLE_SELECTOR)?;
    let row_sel = selector("tr[data-product-id]")?;
    let link_sel = selector("td.ark-product-name a[href]")?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| missing(&series.url, PRODUCT_TABLE_SELECTOR))?;

    let mut items = Vec::new();
    for row in table.select(&row_sel) {
        let id = row
            .value()
            .attr("data-product-id")
            .map(str::trim)
            .unwrap_or_default();
        if id.is_empty() {
            continue;
        }

        let link = row.select(&link_sel).find(|a| {
            a.value()
                .attr("href")
                .is_some_and(|h| matches_pattern(h, item_link_pattern))
        });
        let Some(link) = link else {
            tracing::debug!("Row {} in {} has no item link", id, series.url);
            continue;
        };

        let href = link.value().attr("href").unwrap_or_default();
        if !matches_pattern(href, spec_pattern) {
            continue;
        }

        let detail_url = match resolve_href(base, href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!("Skipping row {} in {}: {}", id, series.url, e);
                continue;
            }
        };

        let name = element_text(&link);
        items.push(ItemRecord {
            id: id.to_string(),
            category: series.category.clone(),
            family: series.family.clone(),
            detail_url,
            display_name: (!name.is_empty()).then_some(name),
        });
    }

    Ok(items)
}

/// Returns true once the specification panel is present
pub fn has_spec_panel(html: &str) -> bool {
    let document = Html::parse_document(html);
    match Selector::parse(SPEC_PANEL_SELECTOR) {
        Ok(sel) => document.select(&sel).next().is_some(),
        Err(_) => false,
    }
}

/// Reads the product title and every labeled specification of a detail page
///
/// The title is the panel's `data-title-start`, falling back to `<title>`;
/// it may be empty. Sections keep their rendered order, and pairs whose
/// label or value is empty after normalization are discarded.
pub fn parse_spec_page(html: &str, page_url: &str) -> Result<(String, Vec<SpecField>), RippleError> {
    let document = Html::parse_document(html);

    let panel_sel = selector(SPEC_PANEL_SELECTOR)?;
    let title_sel = selector("title")?;
    let section_sel = selector("div.tech-section[id^=\"specs-\"]")?;
    let heading_sel = selector("h3")?;
    let row_sel = selector("div.row.tech-section-row")?;
    let label_sel = selector(".tech-label span")?;
    let value_sel = selector(".tech-data")?;

    let panel = document
        .select(&panel_sel)
        .next()
        .ok_or_else(|| missing(page_url, SPEC_PANEL_SELECTOR))?;

    let mut product_name = panel
        .value()
        .attr("data-title-start")
        .map(normalize_text)
        .unwrap_or_default();
    if product_name.is_empty() {
        product_name = document
            .select(&title_sel)
            .next()
            .map(|t| element_text(&t))
            .unwrap_or_default();
    }

    let mut fields = Vec::new();
    for section in document.select(&section_sel) {
        let group = first_text(&section, &heading_sel);
        if group.is_empty() {
            continue;
        }

        for row in section.select(&row_sel) {
            let label = first_text(&row, &label_sel);
            let value = first_text(&row, &value_sel);
            if label.is_empty() || value.is_empty() {
                continue;
            }
            fields.push(SpecField {
                group: group.clone(),
                field: label,
                value,
            });
        }
    }

    Ok((product_name, fields))
}
