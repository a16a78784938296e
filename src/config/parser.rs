use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use catalog_ripple::config::load_config;
///
/// let config = load_config(Path::new("ripple.toml")).unwrap();
/// println!("Catalog root: {}", config.catalog.root_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the configuration file if one was given, otherwise the defaults
///
/// Defaults are validated too, so a caller always gets a usable config.
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[catalog]
root-url = "https://catalog.example.com/ark.html"
base-url = "https://catalog.example.com"
panel-key = "Processors"

[session]
storage-state-path = "./cookies.json"
checkpoint-every = 10

[pacing]
discovery-min-ms = 100
discovery-max-ms = 200

[retry]
attempts = 5

[output]
csv-path = "./specs.csv"
database-path = "./state.sqlite"

[run]
max-items = 50
retry-errors = true
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.catalog.root_url, "https://catalog.example.com/ark.html");
        assert_eq!(config.session.checkpoint_every, 10);
        assert_eq!(config.pacing.discovery_max_ms, 200);
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.output.csv_path, "./specs.csv");
        assert_eq!(config.run.max_items, 50);
        assert!(config.run.retry_errors);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let file = create_temp_config("[run]\nworkers = 2\n");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.run.workers, 2);
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.pacing.item_min_ms, 200);
        assert_eq!(config.catalog.series_pattern, "/ark/products/series/");
        assert!(config.session.headless);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.output.database_path, "state.sqlite");
        assert_eq!(config.session.checkpoint_every, 25);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/ripple.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[run]\nworkers = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_or_default_without_path() {
        let config = load_config_or_default(None).unwrap();
        assert_eq!(config.run.workers, 1);
    }
}
