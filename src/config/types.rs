use serde::Deserialize;

/// Main configuration structure for Catalog-Ripple
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// configuration aimed at the Intel ARK processor catalog.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
    pub pacing: PacingConfig,
    pub retry: RetryConfig,
    pub output: OutputConfig,
    pub run: RunConfig,
}

/// Where the catalog lives and how its links are recognised
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CatalogConfig {
    /// Root listing page with the expandable category panels
    pub root_url: String,

    /// Base URL relative hrefs are resolved against
    pub base_url: String,

    /// Key of the top-level panel whose categories are walked
    pub panel_key: String,

    /// Substring identifying series listing links
    pub series_pattern: String,

    /// Substring identifying item links inside a series table
    pub item_link_pattern: String,

    /// Substring identifying item specification pages
    pub spec_pattern: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root_url: "https://www.intel.com/content/www/us/en/ark.html#@Processors".to_string(),
            base_url: "https://www.intel.com".to_string(),
            panel_key: "Processors".to_string(),
            series_pattern: "/ark/products/series/".to_string(),
            item_link_pattern: "/products/sku/".to_string(),
            spec_pattern: "specifications.html".to_string(),
        }
    }
}

/// HTTP session identity and credential persistence
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Cookie jar blob, loaded at start and checkpointed during the run
    pub storage_state_path: String,

    /// When false, every navigation is echoed at info level
    pub headless: bool,

    /// Save session credentials after this many successful items
    pub checkpoint_every: u32,

    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// TCP/TLS connect timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
            storage_state_path: "storage_state.json".to_string(),
            headless: true,
            checkpoint_every: 25,
            request_timeout_secs: 120,
            connect_timeout_secs: 30,
        }
    }
}

/// Politeness delays (milliseconds), drawn uniformly from `[min, max]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    pub discovery_min_ms: u64,
    pub discovery_max_ms: u64,
    pub item_min_ms: u64,
    pub item_max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            discovery_min_ms: 600,
            discovery_max_ms: 1600,
            item_min_ms: 200,
            item_max_ms: 800,
        }
    }
}

/// Retry and wait policy for navigations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Attempts per navigation, including the first
    pub attempts: u32,

    /// Backoff before attempt `n + 1` is `backoff_ms * n`
    pub backoff_ms: u64,

    /// Maximum jitter added to each backoff
    pub jitter_ms: u64,

    /// How long to keep waiting for a specification panel to appear
    pub panel_timeout_ms: u64,

    /// Interval between panel polls; the item pacing jitter is added on top
    pub panel_poll_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 2000,
            jitter_ms: 500,
            panel_timeout_ms: 60_000,
            panel_poll_ms: 15_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the append-only CSV log of specification rows
    pub csv_path: String,

    /// Path to the SQLite state store
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: "intel_specs_long.csv".to_string(),
            database_path: "state.sqlite".to_string(),
        }
    }
}

/// Per-invocation run behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    /// Hard cap on items extracted this run (0 = unlimited)
    pub max_items: usize,

    /// Skip the discovery walk and only scrape items already in the store
    pub skip_discovery: bool,

    /// Re-attempt items whose latest outcome is an error
    pub retry_errors: bool,

    /// Number of concurrent extraction workers
    pub workers: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_items: 0,
            skip_discovery: false,
            retry_errors: false,
            workers: 1,
        }
    }
}
