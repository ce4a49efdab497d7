//! Global error handling module for the 9anime scraper
//!
//! Fetch failures are absorbed inside the crawler, so the errors that reach
//! this type are configuration and output failures.

use thiserror::Error;

use crate::scraper::ScraperError;

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// Scraping-related errors (network, HTTP, client setup)
    #[error("Scraping error: {0}")]
    Scraping(#[from] ScraperError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors while writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV serialization errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
