//! Output files written for each tag.
//!
//! # Submodules
//!
//! - [`listing`]: Writes accepted stories as plain-text blocks
//! - [`links`]: Pulls the story links back out of a listing for the downloader
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── <tag>/
//!     ├── ao3_stories.txt   # one block per collected story
//!     └── cleaned.txt       # one scheme-less link per line
//! ```

pub mod links;
pub mod listing;

/// File name of the story listing inside a tag directory.
pub const LISTING_FILE: &str = "ao3_stories.txt";

/// File name of the cleaned link list inside a tag directory.
pub const CLEANED_FILE: &str = "cleaned.txt";
