//! Command-line interface definitions.
//!
//! Every option can also come from the environment. The tag and the delay
//! are asked for interactively when neither a flag nor a variable sets them.

use crate::downloader::{DEFAULT_DOWNLOADER, DEFAULT_OUTPUT_TEMPLATE};
use crate::models::{DEFAULT_LANGUAGE, DEFAULT_MIN_WORDS};
use crate::scrapers::ao3::AO3_BASE_URL;
use clap::Parser;
use dialoguer::Input;

/// Delay offered by the interactive prompt.
pub const DEFAULT_DELAY_SECS: u64 = 2;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Ask for the tag and the delay
/// ao3_tag_scraper
///
/// # Fully scripted, links only
/// ao3_tag_scraper --tag "Found Family" --delay 5 --skip-download
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Tag whose works listing is scraped
    #[arg(short, long, env = "AO3_TAG")]
    pub tag: Option<String>,

    /// Seconds to wait between two page requests
    #[arg(short, long, env = "AO3_DELAY")]
    pub delay: Option<u64>,

    /// Directory under which the per-tag directory is created
    #[arg(short, long, env = "AO3_OUTPUT_DIR", default_value = ".")]
    pub output_dir: String,

    /// Site the listing is fetched from
    #[arg(long, env = "AO3_BASE_URL", default_value = AO3_BASE_URL)]
    pub base_url: String,

    /// Minimum word count for a story to be collected
    #[arg(long, env = "AO3_MIN_WORDS", default_value_t = DEFAULT_MIN_WORDS)]
    pub min_words: u64,

    /// Language a story must be written in (case-insensitive)
    #[arg(long, env = "AO3_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Downloader executable fed with the cleaned link list
    #[arg(long, env = "AO3_DOWNLOADER", default_value = DEFAULT_DOWNLOADER)]
    pub downloader: String,

    /// Output file name template handed to the downloader
    #[arg(long, default_value = DEFAULT_OUTPUT_TEMPLATE)]
    pub output_template: String,

    /// Stop after writing the cleaned link list
    #[arg(long)]
    pub skip_download: bool,
}

impl Cli {
    /// The tag from the arguments, or asked for on the terminal.
    pub fn tag_or_prompt(&self) -> dialoguer::Result<String> {
        match &self.tag {
            Some(tag) => Ok(tag.clone()),
            None => Input::new()
                .with_prompt("Enter the tag you want to scrape")
                .interact_text(),
        }
    }

    /// The delay from the arguments, or asked for on the terminal.
    pub fn delay_or_prompt(&self) -> dialoguer::Result<u64> {
        match self.delay {
            Some(delay) => Ok(delay),
            None => Input::new()
                .with_prompt("Enter the delay between requests (in seconds)")
                .default(DEFAULT_DELAY_SECS)
                .interact_text(),
        }
    }
}
