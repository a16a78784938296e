//! Session governor: the single browsing identity shared by the run
//!
//! This module handles:
//! - Loading and checkpointing persisted session credentials (cookies)
//! - Randomized pacing between navigations
//! - Refusing sub-resource requests (images, media, fonts)
//! - Navigation with retry through the fetcher

use crate::config::{Config, PacingConfig, RetryConfig};
use crate::crawler::fetcher::{build_http_client, fetch_with_retry};
use crate::url::ResourceKind;
use crate::RippleError;
use cookie_store::CookieStore;
use rand::Rng;
use reqwest::Client;
use reqwest_cookie_store::CookieStoreMutex;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// A randomized delay interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    /// Creates a pacer sleeping between `min_ms` and `max_ms` (inclusive)
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    /// Picks the next delay
    pub fn next_delay(&self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::rng().random_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    /// Sleeps for a freshly drawn delay
    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::trace!("Pacing for {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// The shared browsing session
///
/// Every navigation of the run (discovery and item extraction alike) goes
/// through one `Session`, so all requests carry the same identity and the
/// same cookie jar. Credentials are saved every `checkpoint_every` successful
/// items and at the end of the run.
pub struct Session {
    client: Client,
    cookies: Arc<CookieStoreMutex>,
    credential_path: PathBuf,

    /// Serializes credential saves
    save_lock: Mutex<()>,

    successes: AtomicU32,
    checkpoint_every: u32,
    retry: RetryConfig,
    headless: bool,
    base_url: Url,
    discovery_pacer: Pacer,
    item_pacer: Pacer,
}

impl Session {
    /// Opens the session described by `config`
    ///
    /// If the credential file exists it is loaded; a file that exists but
    /// cannot be read or parsed is a fatal `RippleError::Session`. A missing
    /// file starts a fresh session.
    pub fn open(config: &Config) -> Result<Self, RippleError> {
        let credential_path = PathBuf::from(&config.session.storage_state_path);
        let store = load_credentials(&credential_path)?;
        let cookies = Arc::new(CookieStoreMutex::new(store));

        let client = build_http_client(&config.session, Arc::clone(&cookies))?;
        let base_url = Url::parse(&config.catalog.base_url)?;

        let PacingConfig {
            discovery_min_ms,
            discovery_max_ms,
            item_min_ms,
            item_max_ms,
        } = config.pacing;

        Ok(Self {
            client,
            cookies,
            credential_path,
            save_lock: Mutex::new(()),
            successes: AtomicU32::new(0),
            checkpoint_every: config.session.checkpoint_every.max(1),
            retry: config.retry.clone(),
            headless: config.session.headless,
            base_url,
            discovery_pacer: Pacer::new(discovery_min_ms, discovery_max_ms),
            item_pacer: Pacer::new(item_min_ms, item_max_ms),
        })
    }

    /// Base URL relative links are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Retry policy for navigations
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Navigates to `url` and returns the document body
    ///
    /// Image, media and font URLs are refused without a request.
    pub async fn navigate(&self, url: &str) -> Result<String, RippleError> {
        let parsed = Url::parse(url)?;
        if ResourceKind::of(&parsed).is_blocked() {
            tracing::debug!("Refusing sub-resource {}", url);
            return Err(RippleError::Blocked {
                url: url.to_string(),
            });
        }

        if self.headless {
            tracing::debug!("Navigating to {}", url);
        } else {
            tracing::info!("Navigating to {}", url);
        }

        fetch_with_retry(&self.client, url, &self.retry).await
    }

    /// Pauses before a discovery navigation
    pub async fn pace_discovery(&self) {
        self.discovery_pacer.pause().await;
    }

    /// Item pacing interval; each worker paces its own connection
    pub fn item_pacer(&self) -> Pacer {
        self.item_pacer
    }

    /// Delay before re-polling a page for a panel that has not rendered yet
    pub fn panel_poll_delay(&self) -> Duration {
        Duration::from_millis(self.retry.panel_poll_ms.max(1)) + self.item_pacer.next_delay()
    }

    /// Counts a successful item and checkpoints credentials every N successes
    pub async fn record_success(&self) {
        let count = self.successes.fetch_add(1, Ordering::SeqCst) + 1;
        if count % self.checkpoint_every == 0 {
            if let Err(e) = self.save_credentials().await {
                tracing::warn!("Failed to checkpoint session credentials: {}", e);
            }
        }
    }

    /// Number of successful items recorded so far
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Persists the cookie jar to the credential file
    ///
    /// The file is replaced atomically via a temporary file and a rename.
    pub async fn save_credentials(&self) -> Result<(), RippleError> {
        let _guard = self.save_lock.lock().await;

        let mut buffer = Vec::new();
        {
            let store = self
                .cookies
                .lock()
                .map_err(|_| RippleError::Session("cookie store lock poisoned".to_string()))?;
            store
                .save_incl_expired_and_nonpersistent_json(&mut buffer)
                .map_err(|e| RippleError::Session(e.to_string()))?;
        }

        if let Some(parent) = self
            .credential_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.credential_path.with_extension("tmp");
        fs::write(&tmp_path, &buffer)?;
        fs::rename(&tmp_path, &self.credential_path)?;

        tracing::debug!(
            "Saved session credentials to {}",
            self.credential_path.display()
        );
        Ok(())
    }
}

/// Loads the cookie jar from `path`, or an empty one if the file is absent
fn load_credentials(path: &Path) -> Result<CookieStore, RippleError> {
    if !path.exists() {
        tracing::info!(
            "No session credentials at {}, starting a fresh session",
            path.display()
        );
        return Ok(CookieStore::default());
    }

    let file = File::open(path).map_err(|e| {
        RippleError::Session(format!("cannot open {}: {}", path.display(), e))
    })?;
    let store = CookieStore::load_json_all(BufReader::new(file)).map_err(|e| {
        RippleError::Session(format!("cannot parse {}: {}", path.display(), e))
    })?;

    tracing::info!("Loaded session credentials from {}", path.display());
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.session.storage_state_path =
            dir.join("storage_state.json").to_string_lossy().to_string();
        config.session.checkpoint_every = 2;
        config
    }

    #[test]
    fn test_pacer_bounds() {
        let pacer = Pacer::new(10, 20);
        for _ in 0..50 {
            let d = pacer.next_delay();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
    }

    #[test]
    fn test_zero_pacer() {
        assert_eq!(Pacer::new(0, 0).next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_pacer_swapped_bounds() {
        let pacer = Pacer::new(30, 5);
        let d = pacer.next_delay();
        assert!(d >= Duration::from_millis(5) && d <= Duration::from_millis(30));
    }

    #[test]
    fn test_open_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&config_in(dir.path())).unwrap();
        assert_eq!(session.successes(), 0);
        assert_eq!(session.base_url().as_str(), "https://www.intel.com/");
    }

    #[test]
    fn test_corrupt_credentials_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.session.storage_state_path, "{not json").unwrap();

        let result = Session::open(&config);
        assert!(matches!(result, Err(RippleError::Session(_))));
    }

    #[tokio::test]
    async fn test_save_and_reload_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let session = Session::open(&config).unwrap();
        session.save_credentials().await.unwrap();
        assert!(Path::new(&config.session.storage_state_path).exists());
        assert!(!dir.path().join("storage_state.tmp").exists());

        assert!(Session::open(&config).is_ok());
    }

    #[test]
    fn test_panel_poll_delay_adds_item_jitter() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.retry.panel_poll_ms = 1_000;
        config.pacing.item_min_ms = 100;
        config.pacing.item_max_ms = 300;

        let session = Session::open(&config).unwrap();
        for _ in 0..20 {
            let d = session.panel_poll_delay();
            assert!(d >= Duration::from_millis(1_100) && d <= Duration::from_millis(1_300));
        }
    }

    #[tokio::test]
    async fn test_cookies_survive_checkpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", "sid=abc; Path=/")
                    .set_body_string("welcome"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/members"))
            .and(header_exists("cookie"))
            .respond_with(ResponseTemplate::new(200).set_body_string("authed"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/members"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.retry.attempts = 1;

        let fresh = Session::open(&config).unwrap();
        assert!(fresh.navigate(&format!("{}/members", server.uri())).await.is_err());

        fresh.navigate(&format!("{}/login", server.uri())).await.unwrap();
        fresh.save_credentials().await.unwrap();

        let blob = fs::read_to_string(&config.session.storage_state_path).unwrap();
        assert!(blob.contains("sid=abc"));

        let reopened = Session::open(&config).unwrap();
        let body = reopened
            .navigate(&format!("{}/members", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "authed");
    }

    #[tokio::test]
    async fn test_checkpoint_every_n_successes() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let path = PathBuf::from(&config.session.storage_state_path);

        let session = Session::open(&config).unwrap();
        session.record_success().await;
        assert!(!path.exists());
        session.record_success().await;
        assert!(path.exists());
        assert_eq!(session.successes(), 2);
    }

    #[tokio::test]
    async fn test_blocked_resource_not_fetched() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session::open(&config_in(dir.path())).unwrap();

        let result = session.navigate("http://127.0.0.1:9/banner.png").await;
        assert!(matches!(result, Err(RippleError::Blocked { .. })));
    }
}
