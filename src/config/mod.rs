use std::path::PathBuf;

use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

fn default_hours_per_week() -> f64 {
    40.0
}

fn default_output_dir() -> String {
    "quotes".to_string()
}

/// Configuration for the application, read from `QUOTE_`-prefixed
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Hours assumed per working week when suggesting a delivery estimate
    #[serde(default = "default_hours_per_week")]
    pub hours_per_week: f64,

    /// Directory generated documents are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Directory drafts are stored in; defaults to the platform data dir
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Issuer identity shown in the document header
    #[serde(default)]
    pub company_name: String,

    #[serde(default)]
    pub company_tagline: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize `QUOTE_*` environment variables into Config struct
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Parse environment variables into Config struct
        let config = envy::prefixed("QUOTE_").from_env::<Config>()?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hours_per_week: default_hours_per_week(),
            output_dir: default_output_dir(),
            data_dir: None,
            company_name: String::new(),
            company_tagline: String::new(),
        }
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    // Ensure .env file is loaded
    dotenv().ok();

    // Load the configuration
    let config = Config::load()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_variables() {
        let config = Config::default();
        assert_eq!(config.hours_per_week, 40.0);
        assert_eq!(config.output_dir, "quotes");
        assert!(config.data_dir.is_none());
        assert!(config.company_name.is_empty());
    }
}
