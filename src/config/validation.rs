use crate::config::types::{
    CatalogConfig, Config, OutputConfig, PacingConfig, RetryConfig, RunConfig, SessionConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_catalog_config(&config.catalog)?;
    validate_session_config(&config.session)?;
    validate_pacing_config(&config.pacing)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    validate_run_config(&config.run)?;
    Ok(())
}

/// Validates catalog location and link patterns
fn validate_catalog_config(config: &CatalogConfig) -> Result<(), ConfigError> {
    validate_http_url("root-url", &config.root_url)?;
    validate_http_url("base-url", &config.base_url)?;

    if config.panel_key.trim().is_empty() {
        return Err(ConfigError::Validation(
            "panel-key cannot be empty".to_string(),
        ));
    }

    for (name, pattern) in [
        ("series-pattern", &config.series_pattern),
        ("item-link-pattern", &config.item_link_pattern),
        ("spec-pattern", &config.spec_pattern),
    ] {
        if pattern.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates session identity and checkpointing
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.storage_state_path.is_empty() {
        return Err(ConfigError::Validation(
            "storage-state-path cannot be empty".to_string(),
        ));
    }

    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint-every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    if config.request_timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every delay interval is well formed
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.discovery_min_ms > config.discovery_max_ms {
        return Err(ConfigError::Validation(format!(
            "discovery-min-ms ({}) exceeds discovery-max-ms ({})",
            config.discovery_min_ms, config.discovery_max_ms
        )));
    }

    if config.item_min_ms > config.item_max_ms {
        return Err(ConfigError::Validation(format!(
            "item-min-ms ({}) exceeds item-max-ms ({})",
            config.item_min_ms, config.item_max_ms
        )));
    }

    Ok(())
}

/// Validates retry bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 || config.attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "attempts must be between 1 and 10, got {}",
            config.attempts
        )));
    }

    if config.panel_timeout_ms > 0 && config.panel_poll_ms == 0 {
        return Err(ConfigError::Validation(
            "panel-poll-ms must be > 0 when panel-timeout-ms is set".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates run behaviour
fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    Ok(())
}

/// Validates that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use an HTTP(S) scheme",
            name, value
        )));
    }

    Ok(())
}
