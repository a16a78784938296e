//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small mock catalog and run the
//! discovery walk and scrape phase end-to-end.

use catalog_ripple::config::Config;
use catalog_ripple::crawler::{walk, Coordinator, Session};
use catalog_ripple::output::CsvSink;
use catalog_ripple::state::OutcomeStatus;
use catalog_ripple::storage::{SqliteStorage, Storage};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT_PAGE: &str = r#"<html><body>
<div class="product-categories" data-parent-panel-key="Processors">
  <div class="product-category" data-panel-key="PanelDesktop"><span class="name">Desktop Processors</span></div>
  <div class="product-category" data-panel-key="PanelMobile"><span class="name">Mobile Processors</span></div>
  <div class="product-category" data-panel-key="PanelServer"><span class="name">Server Processors</span></div>
</div>
<div class="products" data-parent-panel-key="PanelDesktop">
  <a class="ark-accessible-color" href="/ark/products/series/10/desktop.html">Core Desktop</a>
  <a class="ark-accessible-color" href="/ark/products/compare.html">Compare</a>
</div>
<div class="products" data-parent-panel-key="PanelMobile">
  <a class="ark-accessible-color" href="/ark/products/series/20/mobile.html">Core Mobile</a>
</div>
</body></html>"#;

const DESKTOP_SERIES: &str = r#"<html><body>
<table id="product-table">
  <tr data-product-id="101"><td class="ark-product-name"><a href="/ark/products/sku/101/specifications.html">Core 101</a></td></tr>
  <tr data-product-id="102"><td class="ark-product-name"><a href="/ark/products/sku/102/specifications.html">Core 102</a></td></tr>
  <tr data-product-id="103"><td class="ark-product-name">Announced</td></tr>
  <tr data-product-id=""><td class="ark-product-name"><a href="/ark/products/sku/104/specifications.html">No id</a></td></tr>
</table>
</body></html>"#;

const MOBILE_SERIES: &str = r#"<html><body>
<table id="product-table">
  <tr data-product-id="201"><td class="ark-product-name"><a href="/ark/products/sku/201/specifications.html">Core 201</a></td></tr>
  <tr data-product-id="101"><td class="ark-product-name"><a href="/ark/products/sku/101/specifications.html">Core 101</a></td></tr>
</table>
</body></html>"#;

fn detail_page(title: &str) -> String {
    format!(
        r#"<html><head><title></title></head><body>
        <div class="tab-pane" id="specifications">
          <section class="upe-tech-spec" data-title-start="{}">
            <div class="tech-section" id="specs-1-0">
              <h3>Essentials</h3>
              <div class="row tech-section-row">
                <div class="tech-label"><span>Total Cores</span></div>
                <div class="tech-data">8</div>
              </div>
              <div class="row tech-section-row">
                <div class="tech-label"><span> Max Turbo  Frequency </span></div>
                <div class="tech-data">4.70&nbsp;GHz </div>
              </div>
              <div class="row tech-section-row">
                <div class="tech-label"><span>Launch Date</span></div>
                <div class="tech-data">   </div>
              </div>
            </div>
          </section>
        </div>
        </body></html>"#,
        title
    )
}

/// Creates a test configuration pointing at the mock catalog
fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let mut config = Config::default();
    config.catalog.root_url = format!("{}/ark/products", base_url);
    config.catalog.base_url = base_url.to_string();
    config.pacing.discovery_min_ms = 0;
    config.pacing.discovery_max_ms = 0;
    config.pacing.item_min_ms = 0;
    config.pacing.item_max_ms = 0;
    config.retry.attempts = 1;
    config.retry.backoff_ms = 0;
    config.retry.jitter_ms = 0;
    config.retry.panel_timeout_ms = 0;
    config.output.csv_path = dir.join("specs.csv").to_string_lossy().to_string();
    config.output.database_path = dir.join("state.sqlite").to_string_lossy().to_string();
    config.session.storage_state_path =
        dir.join("storage_state.json").to_string_lossy().to_string();
    config
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts the catalog; item 201 fails once with a 500 before it works
async fn mount_catalog(server: &MockServer) {
    mount_page(server, "/ark/products", ROOT_PAGE.to_string()).await;
    mount_page(server, "/ark/products/series/10/desktop.html", DESKTOP_SERIES.to_string()).await;
    mount_page(server, "/ark/products/series/20/mobile.html", MOBILE_SERIES.to_string()).await;
    mount_page(
        server,
        "/ark/products/sku/101/specifications.html",
        detail_page("Intel Core 101"),
    )
    .await;
    mount_page(
        server,
        "/ark/products/sku/102/specifications.html",
        detail_page(""),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/ark/products/sku/201/specifications.html"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(server)
        .await;
    mount_page(
        server,
        "/ark/products/sku/201/specifications.html",
        detail_page("Intel Core 201"),
    )
    .await;
}

#[tokio::test]
async fn test_full_harvest() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let mut coordinator = Coordinator::new(config.clone()).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Run failed");

    let discovery = summary.discovery.expect("discovery should have run");
    assert_eq!(discovery.categories, 3);
    assert_eq!(discovery.series, 2);
    assert_eq!(discovery.items_seen, 4);
    assert_eq!(discovery.items_new, 3);
    assert_eq!(discovery.pages_failed, 1, "server panel is missing");

    assert_eq!(summary.queued, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);

    let storage = coordinator.storage();
    let storage = storage.lock().await;

    // Item 101 was seen under both series; the first mapping is kept
    let item = storage.get_item("101").unwrap().unwrap();
    assert_eq!(item.category, "Desktop Processors");
    assert_eq!(item.family, "Core Desktop");
    assert!(storage.get_item("103").unwrap().is_none());

    let failed = storage.get_outcome("201").unwrap().unwrap();
    assert_eq!(failed.status, OutcomeStatus::Error);
    assert!(failed.error_detail.unwrap().contains("500"));

    let rows = CsvSink::new(&config.output.csv_path).read_rows().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r.item_id == "101" || r.item_id == "102"));
    assert!(rows.iter().any(|r| r.field_name == "Max Turbo Frequency"
        && r.field_value == "4.70 GHz"
        && r.group_name == "Essentials"));

    // An empty page title falls back to the listing name
    let row_102 = rows.iter().find(|r| r.item_id == "102").unwrap();
    assert_eq!(row_102.product_name, "Core 102");
    let row_101 = rows.iter().find(|r| r.item_id == "101").unwrap();
    assert_eq!(row_101.product_name, "Intel Core 101");

    assert!(Path::new(&config.session.storage_state_path).exists());
}

#[tokio::test]
async fn test_discovery_is_idempotent() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let session = Session::open(&config).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let first = walk(&session, &config.catalog, &mut storage).await.unwrap();
    let series_after_first = storage.get_series().unwrap();
    let items_after_first = storage.get_items().unwrap();

    let second = walk(&session, &config.catalog, &mut storage).await.unwrap();
    assert_eq!(first.items_new, 3);
    assert_eq!(second.items_new, 0);
    assert_eq!(second.items_seen, first.items_seen);

    assert_eq!(storage.get_series().unwrap(), series_after_first);
    assert_eq!(storage.get_items().unwrap(), items_after_first);
    assert_eq!(storage.count_items().unwrap(), 3);
    assert_eq!(storage.count_series().unwrap(), 2);
}

#[tokio::test]
async fn test_root_page_fetched_once_per_walk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ark/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROOT_PAGE))
        .expect(1)
        .mount(&server)
        .await;
    mount_catalog(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let session = Session::open(&config).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = walk(&session, &config.catalog, &mut storage).await.unwrap();
    assert_eq!(report.categories, 3);
    assert_eq!(report.series, 2);
}

#[tokio::test]
async fn test_resume_and_retry_errors() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let first = Coordinator::new(config.clone()).unwrap().run().await.unwrap();
    assert_eq!((first.succeeded, first.failed), (2, 1));

    // Without retry-errors nothing is pending
    let mut resume = config.clone();
    resume.run.skip_discovery = true;
    let second = Coordinator::new(resume.clone()).unwrap().run().await.unwrap();
    assert_eq!(second.queued, 0);
    assert_eq!(second.already_done, 2);

    // With retry-errors the failed item is re-attempted and now succeeds
    resume.run.retry_errors = true;
    let mut coordinator = Coordinator::new(resume).unwrap();
    let third = coordinator.run().await.unwrap();
    assert_eq!(third.queued, 1);
    assert_eq!(third.succeeded, 1);

    let storage = coordinator.storage();
    let storage = storage.lock().await;
    let outcome = storage.get_outcome("201").unwrap().unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Ok);
    assert!(outcome.error_detail.is_none());
    assert_eq!(storage.count_outcomes_by_status(OutcomeStatus::Ok).unwrap(), 3);
    assert_eq!(storage.count_outcomes_by_status(OutcomeStatus::Error).unwrap(), 0);
}

#[tokio::test]
async fn test_max_items_cap() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.run.max_items = 1;

    let mut coordinator = Coordinator::new(config).unwrap();
    let summary = coordinator.run().await.unwrap();
    assert_eq!(summary.queued, 1);

    let storage = coordinator.storage();
    let storage = storage.lock().await;
    assert!(storage.get_outcome("101").unwrap().is_some());
    assert!(storage.get_outcome("102").unwrap().is_none());
}

#[tokio::test]
async fn test_parallel_workers() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.run.workers = 3;

    let summary = Coordinator::new(config.clone()).unwrap().run().await.unwrap();
    assert_eq!(summary.succeeded + summary.failed, 3);

    // Every item's rows are written contiguously
    let rows = CsvSink::new(&config.output.csv_path).read_rows().unwrap();
    for pair in rows.chunks(2) {
        assert_eq!(pair[0].item_id, pair[1].item_id);
    }
}

#[tokio::test]
async fn test_unreachable_root_skips_discovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    let summary = Coordinator::new(config).unwrap().run().await.unwrap();
    let discovery = summary.discovery.unwrap();
    assert_eq!(discovery.categories, 0);
    assert_eq!(discovery.pages_failed, 1);
    assert_eq!(summary.queued, 0);
}

#[tokio::test]
async fn test_failed_series_page_does_not_abort_walk() {
    let server = MockServer::start().await;
    mount_page(&server, "/ark/products", ROOT_PAGE.to_string()).await;
    mount_page(&server, "/ark/products/series/20/mobile.html", MOBILE_SERIES.to_string()).await;
    Mock::given(method("GET"))
        .and(path("/ark/products/series/10/desktop.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let session = Session::open(&config).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = walk(&session, &config.catalog, &mut storage).await.unwrap();
    assert_eq!(report.pages_failed, 2);
    assert_eq!(report.items_new, 2);

    // Without the desktop listing, 101 is first seen under the mobile series
    let item = storage.get_item("101").unwrap().unwrap();
    assert_eq!(item.family, "Core Mobile");
}
