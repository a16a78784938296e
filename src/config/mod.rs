//! Configuration module for Catalog-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; command-line flags override the loaded values.
//!
//! # Example
//!
//! ```no_run
//! use catalog_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Retrying navigations {} times", config.retry.attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CatalogConfig, Config, OutputConfig, PacingConfig, RetryConfig, RunConfig, SessionConfig,
};

// Re-export parser functions
pub use parser::{load_config, load_config_or_default, parse_config};
pub use validation::validate;
