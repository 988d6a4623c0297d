//! Data models for listing pages, story blocks and accepted stories.
//!
//! This module defines the core data structures used throughout the application:
//! - [`StoryBlock`]: Raw fields lifted out of one work summary on a listing page
//! - [`ListingPage`]: All story blocks of one page plus its pagination link
//! - [`StoryRecord`]: A story that passed every filter, ready to be written
//! - [`SkipReason`]: Why a story block was rejected
//! - [`CollectSummary`]: What a full collection run did and why it stopped

use std::fmt;

/// Word count a story needs to be collected.
pub const DEFAULT_MIN_WORDS: u64 = 4000;

/// Language a story needs to be collected (compared case-insensitively).
pub const DEFAULT_LANGUAGE: &str = "english";

/// One work summary as it appears in the listing HTML.
///
/// Nothing here is validated; every field is exactly what the markup held,
/// trimmed of surrounding whitespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryBlock {
    /// Text of the heading's first anchor.
    pub title: Option<String>,
    /// `href` of the heading's first anchor, usually site-relative.
    pub href: Option<String>,
    /// Text of the word count field, e.g. `"12,345"`.
    pub word_count: Option<String>,
    /// Text of the language field, e.g. `"English"`.
    pub language: Option<String>,
    /// Freeform tag texts in document order.
    pub tags: Vec<String>,
}

/// The parsed representation of one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Story blocks in document order.
    pub blocks: Vec<StoryBlock>,
    /// Raw `href` of the "Next →" control, if the page has one.
    pub next_href: Option<String>,
}

/// A story that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRecord {
    pub title: String,
    /// Absolute story URL.
    pub url: String,
    pub word_count: u64,
    pub language: String,
    pub tags: Vec<String>,
}

/// Thresholds applied to every story block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Inclusive lower bound on the word count.
    pub min_words: u64,
    /// Required language, matched exactly but without regard to case.
    pub language: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            min_words: DEFAULT_MIN_WORDS,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Why a story block was not collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingWordCount,
    InvalidWordCount(String),
    TooShort { words: u64, min: u64 },
    MissingTitle,
    UnresolvableLink(String),
    MissingLanguage,
    WrongLanguage(String),
}

impl SkipReason {
    /// Whether the skip points at broken or unexpected markup rather than a
    /// story that simply does not qualify.
    pub fn is_data_problem(&self) -> bool {
        matches!(
            self,
            SkipReason::MissingWordCount
                | SkipReason::InvalidWordCount(_)
                | SkipReason::MissingTitle
                | SkipReason::UnresolvableLink(_)
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingWordCount => write!(f, "word count not found"),
            SkipReason::InvalidWordCount(raw) => write!(f, "invalid word count '{raw}'"),
            SkipReason::TooShort { words, min } => {
                write!(f, "word count ({words}) is less than {min}")
            }
            SkipReason::MissingTitle => write!(f, "title not found"),
            SkipReason::UnresolvableLink(href) => write!(f, "story link '{href}' cannot be resolved"),
            SkipReason::MissingLanguage => write!(f, "language not found"),
            SkipReason::WrongLanguage(lang) => write!(f, "not in the requested language ({lang})"),
        }
    }
}

/// Why the pagination loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last page had no "Next →" control.
    Exhausted,
    /// A page answered with a non-success status.
    HttpStatus(u16),
}

/// Outcome of one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    pub pages: usize,
    pub accepted: usize,
    pub skipped: usize,
    pub stop: StopReason,
}
