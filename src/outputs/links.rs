//! Cleaned link list for the downloader.
//!
//! Scans a text file for `https://` tokens and writes each one, scheme
//! stripped, on its own line. A token starts at `https://` and ends right
//! before the first whitespace character. Tokens keep their order and are
//! never de-duplicated.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const SCHEME: &str = "https://";

static HTTPS_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https://\S+").expect("hardcoded regex should be valid"));

/// Every `https://` token in `text`, in order, with the scheme removed.
pub fn https_tokens(text: &str) -> Vec<&str> {
    HTTPS_TOKEN
        .find_iter(text)
        .map(|m| &m.as_str()[SCHEME.len()..])
        .collect()
}

/// Read `source`, write its cleaned links to `destination`, return how many.
///
/// The destination is truncated and its parent directories are created. A
/// missing source comes back as an `io::Error` of kind `NotFound`.
#[instrument(level = "info", skip_all, fields(source = %source.display(), destination = %destination.display()))]
pub async fn extract_links_from_file(
    source: &Path,
    destination: &Path,
) -> Result<usize, Box<dyn Error>> {
    let content = fs::read_to_string(source).await?;
    let links = https_tokens(&content);

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut out = String::with_capacity(content.len());
    for link in &links {
        out.push_str(link);
        out.push('\n');
    }
    fs::write(destination, out).await?;

    info!(count = links.len(), "Extracted HTTPS links");
    Ok(links.len())
}
