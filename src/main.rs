//! # AO3 Tag Scraper
//!
//! Collects the stories of one Archive of Our Own tag that are long enough
//! and written in the wanted language, then hands their links to an external
//! downloader.
//!
//! ## Usage
//!
//! ```sh
//! ao3_tag_scraper --tag "Found Family" --delay 2
//! ```
//!
//! ## Pipeline
//!
//! 1. **Collecting**: walk the tag's works listing page by page, filter each
//!    story, write accepted ones to `<tag>/ao3_stories.txt`
//! 2. **Cleaning**: pull every `https://` link out of the listing into
//!    `<tag>/cleaned.txt`, scheme stripped
//! 3. **Downloading**: run FanFicFare over the cleaned list
//!
//! A failing cleaning or downloading step is reported and the run goes on;
//! only a failure while collecting ends the process with an error.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

mod cli;
mod downloader;
mod models;
mod outputs;
mod pacing;
mod scrapers;
mod utils;

use cli::Cli;
use downloader::clean_and_download;
use models::FilterCriteria;
use outputs::{CLEANED_FILE, LISTING_FILE};
use pacing::TokioPacer;
use scrapers::ao3::{collect_tag, CollectConfig};
use scrapers::source::HttpPageSource;
use utils::{ensure_writable_dir, tag_dir};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ao3_tag_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let tag = args.tag_or_prompt()?;
    let delay = args.delay_or_prompt()?;
    let base_url = Url::parse(&args.base_url)?;

    let dir = tag_dir(&args.output_dir, &tag);
    if let Err(e) = ensure_writable_dir(&dir).await {
        error!(
            path = %dir.display(),
            error = %e,
            "Tag output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }
    let listing_path = dir.join(LISTING_FILE);
    let cleaned_path = dir.join(CLEANED_FILE);

    // ---- Collect ----
    let config = CollectConfig {
        base_url,
        tag: tag.clone(),
        delay: Duration::from_secs(delay),
        criteria: FilterCriteria {
            min_words: args.min_words,
            language: args.language.clone(),
        },
    };
    let summary = collect_tag(&HttpPageSource::new(), &TokioPacer, &config, &listing_path).await?;
    info!(
        path = %listing_path.display(),
        pages = summary.pages,
        stories = summary.accepted,
        skipped = summary.skipped,
        "Results saved"
    );

    // ---- Clean links, then download ----
    let downloader = (!args.skip_download).then_some(args.downloader.as_str());
    let outcome =
        clean_and_download(&listing_path, &cleaned_path, downloader, &args.output_template).await;
    debug!(?outcome, "Downloader step finished");

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
