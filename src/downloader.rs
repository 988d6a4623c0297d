//! Hand-off to the external story downloader.
//!
//! The cleaned link list is passed to [FanFicFare](https://github.com/JimmXinu/FanFicFare)
//! (or any tool accepting the same flags):
//!
//! ```sh
//! fanficfare -i <tag>/cleaned.txt -p -o 'output_filename=downloaded/${title}-...'
//! ```
//!
//! The tool's success or failure is reported, never retried.

use crate::outputs::links;
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_DOWNLOADER: &str = "fanficfare";

pub const DEFAULT_OUTPUT_TEMPLATE: &str =
    "downloaded/${title}-${siteabbrev}_${authorId}_${storyId}${formatext}";

/// How a downloader run ended, when it could be started at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed,
    Failed(ExitStatus),
}

/// Arguments for reading `list_path` and naming files after `output_template`.
pub fn downloader_args(list_path: &Path, output_template: &str) -> Vec<String> {
    vec![
        "-i".to_string(),
        list_path.display().to_string(),
        "-p".to_string(),
        "-o".to_string(),
        format!("output_filename={output_template}"),
    ]
}

/// Run `program` over the link list and wait for it.
///
/// A missing executable comes back as an `io::Error` of kind `NotFound`.
#[instrument(level = "info", skip_all, fields(%program, list = %list_path.display()))]
pub async fn run_downloader(
    program: &str,
    list_path: &Path,
    output_template: &str,
) -> io::Result<DownloadOutcome> {
    let args = downloader_args(list_path, output_template);
    info!(?args, "Starting downloader");

    let status = Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .status()
        .await?;

    if status.success() {
        Ok(DownloadOutcome::Completed)
    } else {
        Ok(DownloadOutcome::Failed(status))
    }
}

/// Write the cleaned link list, then run the downloader over it.
///
/// Neither step stops the other: a failed extraction is reported and the
/// downloader still runs. `downloader` is `None` when downloading is turned
/// off. Returns the downloader outcome when it could be started.
#[instrument(level = "info", skip_all, fields(listing = %listing.display(), cleaned = %cleaned.display()))]
pub async fn clean_and_download(
    listing: &Path,
    cleaned: &Path,
    downloader: Option<&str>,
    output_template: &str,
) -> Option<DownloadOutcome> {
    match links::extract_links_from_file(listing, cleaned).await {
        Ok(count) => info!(count, path = %cleaned.display(), "URLs extracted"),
        Err(e) => match e.downcast_ref::<io::Error>() {
            Some(io_err) if io_err.kind() == io::ErrorKind::NotFound => error!(
                path = %listing.display(),
                "Listing file was not found; no links extracted"
            ),
            _ => error!(error = %e, "An error occurred while extracting URLs"),
        },
    }

    let Some(program) = downloader else {
        info!("Skipping downloader as requested");
        return None;
    };

    match run_downloader(program, cleaned, output_template).await {
        Ok(outcome @ DownloadOutcome::Completed) => {
            info!(downloader = %program, "Downloader completed successfully");
            Some(outcome)
        }
        Ok(outcome @ DownloadOutcome::Failed(status)) => {
            error!(downloader = %program, %status, "Downloader failed");
            Some(outcome)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(
                downloader = %program,
                "Downloader is not installed or not found in the system PATH"
            );
            None
        }
        Err(e) => {
            error!(downloader = %program, error = %e, "Downloader could not be started");
            None
        }
    }
}
