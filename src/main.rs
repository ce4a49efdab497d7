//! 9anime Scraper
//!
//! Scrapes the standard listing sections, writes JSON and CSV output and
//! prints a summary.

use std::future::Future;
use std::io;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nineanime_scraper::config::Config;
use nineanime_scraper::crawler::Crawler;
use nineanime_scraper::error::AppResult;
use nineanime_scraper::export::{save_csv, save_json};
use nineanime_scraper::report::render_summary;
use nineanime_scraper::scraper::Scraper;

async fn run(config: &Config) -> AppResult<()> {
    let base = config.base()?;
    let scraper = Scraper::with_config(config.scraper.clone())?;
    let crawler = Crawler::new(scraper, base);

    let records = crawler.scrape_all().await;
    if records.is_empty() {
        println!("No anime data could be scraped. The site structure might have changed.");
        return Ok(());
    }

    save_json(&config.json_output, &records)?;
    save_csv(&config.csv_output, &records)?;
    print!("{}", render_summary(&records));

    Ok(())
}

/// Drive `work` to completion unless `interrupt` fires first.
///
/// An interrupt future that resolves with an error (handler not installed)
/// disables that branch and the work runs on.
async fn until_interrupted(
    work: impl Future<Output = AppResult<()>>,
    interrupt: impl Future<Output = io::Result<()>>,
) -> AppResult<()> {
    tokio::select! {
        result = work => result,
        Ok(()) = interrupt => {
            info!("Scraping interrupted by user");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Scraping {}", config.base_url);

    match until_interrupted(run(&config), tokio::signal::ctrl_c()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("An error occurred: {}", e);
            ExitCode::FAILURE
        }
    }
}
