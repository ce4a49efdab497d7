//! 9anime Scraper Library
//!
//! This library fetches listing pages from 9animetv.to, extracts anime
//! records from loosely structured markup, deduplicates them and writes
//! them out as JSON and CSV.

pub mod config;
pub mod constants;
pub mod crawler;
pub mod error;
pub mod export;
pub mod models;
pub mod parser;
pub mod report;
pub mod scraper;
