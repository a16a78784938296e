//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with the session identity and cookie jar
//! - GET requests for catalog documents
//! - Retry with increasing backoff for transient failures
//! - Error classification

use crate::config::{RetryConfig, SessionConfig};
use crate::RippleError;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use reqwest_cookie_store::CookieStoreMutex;
use std::sync::Arc;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// Cookies set by the catalog are kept in `cookies`, which the session
/// checkpoints to disk.
///
/// # Arguments
///
/// * `config` - The session configuration
/// * `cookies` - Shared cookie jar
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &SessionConfig,
    cookies: Arc<CookieStoreMutex>,
) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.1"),
    );
    if let Ok(language) = HeaderValue::from_str(&config.accept_language) {
        headers.insert(ACCEPT_LANGUAGE, language);
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .cookie_provider(cookies)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs a single GET and returns the body of a successful response
///
/// Non-2xx statuses become `RippleError::HttpStatus`.
pub async fn fetch_once(client: &Client, url: &str) -> Result<String, RippleError> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(RippleError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response.text().await?)
}

/// Fetches a URL, retrying transient failures
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Timeout / connection failure | Retry |
/// | HTTP 5xx, HTTP 429 | Retry |
/// | Other HTTP status | Fail immediately |
///
/// Before attempt `n + 1` the fetcher sleeps `backoff_ms * n` plus up to
/// `jitter_ms` of random jitter. When attempts run out the last error is
/// wrapped in `RippleError::Navigation`.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    retry: &RetryConfig,
) -> Result<String, RippleError> {
    let attempts = retry.attempts.max(1);
    let mut attempt = 1;

    loop {
        match fetch_once(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_transient() && attempt < attempts => {
                let backoff = backoff_delay(retry, attempt);
                tracing::warn!(
                    "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                    attempt,
                    attempts,
                    url,
                    e,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(RippleError::Navigation {
                    url: url.to_string(),
                    attempts: attempt,
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Backoff before the attempt following `attempt`
fn backoff_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let jitter = if retry.jitter_ms > 0 {
        rand::rng().random_range(0..=retry.jitter_ms)
    } else {
        0
    };
    Duration::from_millis(retry.backoff_ms * u64::from(attempt) + jitter)
}
