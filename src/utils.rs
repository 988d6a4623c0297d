//! Utility functions for log formatting and output directories.

use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes, on a character boundary, with
/// an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Directory holding every file written for `tag`.
pub fn tag_dir(output_dir: &str, tag: &str) -> PathBuf {
    Path::new(output_dir).join(tag)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // A sync probe keeps the error surface simple.
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    remove_probe(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

/// Delete a write probe, reporting a leftover file instead of failing.
fn remove_probe(probe_path: &Path) -> bool {
    match stdfs::remove_file(probe_path) {
        Ok(()) => true,
        Err(e) => {
            warn!(probe = %probe_path.display(), error = %e, "Could not remove write probe; delete it by hand");
            false
        }
    }
}
