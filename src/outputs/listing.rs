//! Plain-text listing of collected stories.
//!
//! Each accepted story becomes one block:
//!
//! ```text
//! Story Title: <title>
//! Story URL: <url>
//! Word Count: <n>
//! Tags: <t1, t2, ...>
//! ----------------------------------------
//! ```
//!
//! The file is truncated when the writer is created and every block is
//! flushed as soon as it is written, so a run that dies half-way still leaves
//! the stories it found on disk.

use crate::models::StoryRecord;
use itertools::Itertools;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Width of the dashed line closing every block.
pub const SEPARATOR_WIDTH: usize = 40;

/// Render one story as a listing block, separator line included.
pub fn format_story_block(record: &StoryRecord) -> String {
    format!(
        "Story Title: {}\nStory URL: {}\nWord Count: {}\nTags: {}\n{}\n",
        record.title,
        record.url,
        record.word_count,
        record.tags.iter().join(", "),
        "-".repeat(SEPARATOR_WIDTH),
    )
}

/// Single writer over the listing file for the duration of one run.
#[derive(Debug)]
pub struct ListingWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl ListingWriter {
    /// Create (or truncate) the listing file, creating parent directories.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn create(path: &Path) -> Result<Self, Box<dyn Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;
        info!("Opened listing file");
        Ok(Self {
            path: path.to_path_buf(),
            file,
            written: 0,
        })
    }

    /// Append one story block and flush it.
    pub async fn write_record(&mut self, record: &StoryRecord) -> Result<(), Box<dyn Error>> {
        let block = format_story_block(record);
        self.file.write_all(block.as_bytes()).await?;
        self.file.flush().await?;
        self.written += 1;
        debug!(title = %record.title, url = %record.url, "Wrote story block");
        Ok(())
    }

    /// Number of blocks written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and close the file.
    pub async fn finish(mut self) -> Result<usize, Box<dyn Error>> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        info!(path = %self.path.display(), stories = self.written, "Closed listing file");
        Ok(self.written)
    }
}
