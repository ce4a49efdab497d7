//! Configuration module for the 9anime scraper
//!
//! Handles loading optional environment overrides. Every value has a default,
//! so an empty environment reproduces the standard run.

use std::env;

use url::Url;

use crate::error::{AppError, AppResult};
use crate::scraper::ScraperConfig;

/// Default origin every listing path is resolved against
pub const DEFAULT_BASE_URL: &str = "https://9animetv.to";
/// Default JSON output file
pub const DEFAULT_JSON_OUTPUT: &str = "9anime_anime.json";
/// Default CSV output file
pub const DEFAULT_CSV_OUTPUT: &str = "9anime_anime.csv";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the anime catalog
    pub base_url: String,
    /// Path of the JSON document written after a run
    pub json_output: String,
    /// Path of the CSV file written after a run
    pub csv_output: String,
    /// Fetch policy (retries, delays, timeout)
    pub scraper: ScraperConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            json_output: DEFAULT_JSON_OUTPUT.to_string(),
            csv_output: DEFAULT_CSV_OUTPUT.to_string(),
            scraper: ScraperConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            base_url: env::var("BASE_URL").unwrap_or(defaults.base_url),
            json_output: env::var("OUTPUT_JSON").unwrap_or(defaults.json_output),
            csv_output: env::var("OUTPUT_CSV").unwrap_or(defaults.csv_output),
            scraper: defaults.scraper,
        }
    }

    /// Parse the configured base URL
    pub fn base(&self) -> AppResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("invalid BASE_URL '{}': {}", self.base_url, e)))
    }
}
