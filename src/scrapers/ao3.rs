//! Archive of Our Own tag listing scraper.
//!
//! Walks the works listing of one tag (`/tags/<tag>/works`) page by page,
//! keeps the stories that pass the word count and language filters, and
//! writes them to the listing file as it goes.
//!
//! # Page Structure
//!
//! Every work summary on a listing page is an `li.work` element:
//!
//! ```html
//! <li class="work blurb group">
//!   <h4 class="heading"><a href="/works/123">Title</a> by <a rel="author" href="...">author</a></h4>
//!   <ul class="tags commas"><li><a class="tag" href="...">Fluff</a></li></ul>
//!   <dl class="stats">
//!     <dd class="language">English</dd>
//!     <dd class="words">12,345</dd>
//!   </dl>
//! </li>
//! ```
//!
//! Pagination is a plain anchor whose text is `Next →`.

use crate::models::{
    CollectSummary, FilterCriteria, ListingPage, SkipReason, StopReason, StoryBlock, StoryRecord,
};
use crate::outputs::listing::ListingWriter;
use crate::pacing::Pacer;
use crate::scrapers::source::PageSource;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Site every relative link is resolved against.
pub const AO3_BASE_URL: &str = "https://archiveofourown.org";

/// Visible text of the pagination control.
pub const NEXT_LABEL: &str = "Next →";

static WORK: Lazy<Selector> = Lazy::new(|| selector("li.work"));
static WORDS: Lazy<Selector> = Lazy::new(|| selector("dd.words"));
static HEADING_LINK: Lazy<Selector> = Lazy::new(|| selector("h4.heading a"));
static LANGUAGE: Lazy<Selector> = Lazy::new(|| selector("dd.language"));
static TAG_LINK: Lazy<Selector> = Lazy::new(|| selector("ul.tags a.tag"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| selector("a"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("hardcoded selector should be valid")
}

/// Everything one collection run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub base_url: Url,
    pub tag: String,
    /// Pause between two page fetches.
    pub delay: Duration,
    pub criteria: FilterCriteria,
}

/// First listing page of `tag`, with the tag encoded as one path segment.
pub fn tag_works_url(base: &Url, tag: &str) -> Result<Url, url::ParseError> {
    base.join(&format!("/tags/{}/works", urlencoding::encode(tag)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

fn story_block(work: ElementRef<'_>) -> StoryBlock {
    let heading_link = work.select(&HEADING_LINK).next();
    StoryBlock {
        title: heading_link.map(element_text),
        href: heading_link
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        word_count: first_text(work, &WORDS),
        language: first_text(work, &LANGUAGE),
        tags: work.select(&TAG_LINK).map(element_text).collect(),
    }
}

/// Lift the story blocks and the "Next →" link out of one listing page.
pub fn parse_listing(html: &str) -> ListingPage {
    let document = Html::parse_document(html);

    let blocks = document.select(&WORK).map(story_block).collect();
    let next_href = document
        .select(&ANCHOR)
        .find(|a| element_text(*a) == NEXT_LABEL)
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string);

    ListingPage { blocks, next_href }
}

/// Parse a displayed word count such as `"12,345"`.
pub fn parse_word_count(text: &str) -> Option<u64> {
    text.replace(',', "").trim().parse().ok()
}

/// Decide whether a story block is collected.
///
/// Filters run in a fixed order and the first failure is reported: word
/// count, then title link, then language. Tags never cause a skip.
pub fn accept_block(
    block: &StoryBlock,
    base: &Url,
    criteria: &FilterCriteria,
) -> Result<StoryRecord, SkipReason> {
    let raw_words = block
        .word_count
        .as_deref()
        .ok_or(SkipReason::MissingWordCount)?;
    let word_count = parse_word_count(raw_words)
        .ok_or_else(|| SkipReason::InvalidWordCount(raw_words.to_string()))?;
    if word_count < criteria.min_words {
        return Err(SkipReason::TooShort {
            words: word_count,
            min: criteria.min_words,
        });
    }

    let (title, href) = match (&block.title, &block.href) {
        (Some(title), Some(href)) => (title, href),
        _ => return Err(SkipReason::MissingTitle),
    };
    let url = base
        .join(href)
        .map_err(|_| SkipReason::UnresolvableLink(href.clone()))?;

    let language = block
        .language
        .as_deref()
        .ok_or(SkipReason::MissingLanguage)?;
    if language.to_lowercase() != criteria.language.to_lowercase() {
        return Err(SkipReason::WrongLanguage(language.to_string()));
    }

    Ok(StoryRecord {
        title: title.clone(),
        url: url.to_string(),
        word_count,
        language: language.to_string(),
        tags: block.tags.clone(),
    })
}

/// Scrape every listing page of `config.tag` into the file at `output`.
///
/// The file is truncated first. A page answering with a non-success status
/// ends the run early but keeps what was written; transport and file errors
/// propagate. `pacer` is asked to wait `config.delay` before every page
/// after the first.
#[instrument(level = "info", skip_all, fields(tag = %config.tag, output = %output.display()))]
pub async fn collect_tag<S, P>(
    source: &S,
    pacer: &P,
    config: &CollectConfig,
    output: &Path,
) -> Result<CollectSummary, Box<dyn Error>>
where
    S: PageSource,
    P: Pacer,
{
    let mut writer = ListingWriter::create(output).await?;
    let mut current = tag_works_url(&config.base_url, &config.tag)?;
    let mut pages = 0usize;
    let mut skipped = 0usize;

    let stop = loop {
        info!(url = %current, "Scraping page");
        let page = source.fetch(&current).await?;
        if !page.status.is_success() {
            warn!(
                url = %current,
                status = page.status.as_u16(),
                body_preview = %truncate_for_log(&page.body, 200),
                "Failed to retrieve the page; stopping pagination"
            );
            break StopReason::HttpStatus(page.status.as_u16());
        }
        pages += 1;

        let listing = parse_listing(&page.body);
        debug!(blocks = listing.blocks.len(), "Parsed listing page");

        for block in &listing.blocks {
            match accept_block(block, &config.base_url, &config.criteria) {
                Ok(record) => {
                    debug!(title = %record.title, words = record.word_count, language = %record.language, "Accepted story");
                    writer.write_record(&record).await?;
                }
                Err(reason) if reason.is_data_problem() => {
                    skipped += 1;
                    warn!(title = ?block.title, %reason, "Skipping story");
                }
                Err(reason) => {
                    skipped += 1;
                    info!(title = ?block.title, %reason, "Skipping story");
                }
            }
        }

        debug!(written = writer.written(), skipped, "Finished page");

        let Some(href) = listing.next_href else {
            info!("No next page; all pages consumed");
            break StopReason::Exhausted;
        };
        let next = match config.base_url.join(&href) {
            Ok(next) => next,
            Err(e) => {
                warn!(%href, error = %e, "Next link cannot be resolved; stopping pagination");
                break StopReason::Exhausted;
            }
        };

        pacer.pause(config.delay).await;
        current = next;
    };

    let accepted = writer.finish().await?;
    let summary = CollectSummary {
        pages,
        accepted,
        skipped,
        stop,
    };
    info!(pages, accepted, skipped, stop = ?summary.stop, "Collection finished");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::testing::RecordingPacer;
    use crate::scrapers::source::{FetchedPage, HttpPageSource};
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn base() -> Url {
        Url::parse(AO3_BASE_URL).unwrap()
    }

    fn work_html(id: u32, words: Option<&str>, language: Option<&str>, tags: &[&str]) -> String {
        let words = words
            .map(|w| format!(r#"<dt class="words">Words:</dt><dd class="words">{w}</dd>"#))
            .unwrap_or_default();
        let language = language
            .map(|l| format!(r#"<dt class="language">Language:</dt><dd class="language">{l}</dd>"#))
            .unwrap_or_default();
        let tags = tags
            .iter()
            .map(|t| format!(r#"<li class="freeforms"><a class="tag" href="/tags/{t}/works">{t}</a></li>"#))
            .collect::<String>();
        format!(
            r#"<li id="work_{id}" class="work blurb group" role="article">
                 <div class="header module">
                   <h4 class="heading">
                     <a href="/works/{id}">Work {id}</a> by <a rel="author" href="/users/someone">someone</a>
                   </h4>
                 </div>
                 <ul class="tags commas">{tags}</ul>
                 <dl class="stats">{language}{words}</dl>
               </li>"#
        )
    }

    fn page_html(works: &[String], next: Option<&str>) -> String {
        let next = next
            .map(|href| format!(r#"<li class="next" title="next"><a rel="next" href="{href}">Next →</a></li>"#))
            .unwrap_or_else(|| r#"<li class="next" title="next"><span class="disabled">Next →</span></li>"#.to_string());
        format!(
            r#"<html><body>
                 <ol class="work index group">{}</ol>
                 <ol class="pagination actions" role="navigation">
                   <li class="previous"><span class="disabled">← Previous</span></li>
                   {next}
                 </ol>
               </body></html>"#,
            works.concat()
        )
    }

    fn block(words: Option<&str>, language: Option<&str>) -> StoryBlock {
        StoryBlock {
            title: Some("A Title".into()),
            href: Some("/works/1".into()),
            word_count: words.map(str::to_string),
            language: language.map(str::to_string),
            tags: vec![],
        }
    }

    #[derive(Default)]
    struct FakeSource {
        pages: HashMap<String, (u16, String)>,
        requested: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn with(mut self, url: &str, status: u16, body: String) -> Self {
            self.pages.insert(url.to_string(), (status, body));
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    impl PageSource for FakeSource {
        async fn fetch(&self, url: &Url) -> Result<FetchedPage, Box<dyn Error>> {
            self.requested.lock().unwrap().push(url.to_string());
            let (status, body) = self
                .pages
                .get(url.as_str())
                .ok_or_else(|| format!("connection refused: {url}"))?;
            Ok(FetchedPage {
                status: StatusCode::from_u16(*status)?,
                body: body.clone(),
            })
        }
    }

    fn config(tag: &str, base_url: Url) -> CollectConfig {
        CollectConfig {
            base_url,
            tag: tag.to_string(),
            delay: Duration::from_secs(2),
            criteria: FilterCriteria::default(),
        }
    }

    #[test]
    fn test_tag_works_url() {
        assert_eq!(
            tag_works_url(&base(), "Fluff").unwrap().as_str(),
            "https://archiveofourown.org/tags/Fluff/works"
        );
        assert_eq!(
            tag_works_url(&base(), "Slow Burn").unwrap().as_str(),
            "https://archiveofourown.org/tags/Slow%20Burn/works"
        );
    }

    #[test]
    fn test_parse_listing_extracts_blocks() {
        let html = page_html(
            &[
                work_html(1, Some("12,345"), Some("English"), &["Fluff", "Hurt/Comfort"]),
                work_html(2, None, None, &[]),
            ],
            Some("/tags/Fluff/works?page=2"),
        );
        let page = parse_listing(&html);

        assert_eq!(page.blocks.len(), 2);
        assert_eq!(
            page.blocks[0],
            StoryBlock {
                title: Some("Work 1".into()),
                href: Some("/works/1".into()),
                word_count: Some("12,345".into()),
                language: Some("English".into()),
                tags: vec!["Fluff".into(), "Hurt/Comfort".into()],
            }
        );
        assert_eq!(page.blocks[1].word_count, None);
        assert_eq!(page.blocks[1].language, None);
        assert!(page.blocks[1].tags.is_empty());
        assert_eq!(page.next_href.as_deref(), Some("/tags/Fluff/works?page=2"));
    }

    #[test]
    fn test_parse_listing_last_page_has_no_next() {
        let page = parse_listing(&page_html(&[work_html(1, Some("5000"), Some("English"), &[])], None));
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.next_href, None);
    }

    #[test]
    fn test_parse_listing_empty_page() {
        let page = parse_listing("<html><body><p>No works found.</p></body></html>");
        assert_eq!(page, ListingPage::default());
    }

    #[test]
    fn test_parse_word_count() {
        assert_eq!(parse_word_count("4000"), Some(4000));
        assert_eq!(parse_word_count("4,000"), Some(4000));
        assert_eq!(parse_word_count("1,234,567"), Some(1_234_567));
        assert_eq!(parse_word_count(" 812 "), Some(812));
        assert_eq!(parse_word_count("four thousand"), None);
        assert_eq!(parse_word_count(""), None);
    }

    #[test]
    fn test_word_count_boundary() {
        let criteria = FilterCriteria::default();
        assert!(accept_block(&block(Some("4000"), Some("English")), &base(), &criteria).is_ok());
        assert!(accept_block(&block(Some("4,000"), Some("English")), &base(), &criteria).is_ok());
        assert_eq!(
            accept_block(&block(Some("3999"), Some("English")), &base(), &criteria),
            Err(SkipReason::TooShort { words: 3999, min: 4000 })
        );
        assert_eq!(
            accept_block(&block(Some("four thousand"), Some("English")), &base(), &criteria),
            Err(SkipReason::InvalidWordCount("four thousand".into()))
        );
        assert_eq!(
            accept_block(&block(None, Some("English")), &base(), &criteria),
            Err(SkipReason::MissingWordCount)
        );
    }

    #[test]
    fn test_language_filter() {
        let criteria = FilterCriteria::default();
        for language in ["English", "ENGLISH", "english"] {
            assert!(accept_block(&block(Some("5000"), Some(language)), &base(), &criteria).is_ok());
        }
        assert_eq!(
            accept_block(&block(Some("5000"), Some("English (US)")), &base(), &criteria),
            Err(SkipReason::WrongLanguage("English (US)".into()))
        );
        assert_eq!(
            accept_block(&block(Some("5000"), Some("Deutsch")), &base(), &criteria),
            Err(SkipReason::WrongLanguage("Deutsch".into()))
        );
        assert_eq!(
            accept_block(&block(Some("5000"), None), &base(), &criteria),
            Err(SkipReason::MissingLanguage)
        );
    }

    #[test]
    fn test_word_count_is_checked_before_language() {
        let criteria = FilterCriteria::default();
        assert_eq!(
            accept_block(&block(Some("10"), None), &base(), &criteria),
            Err(SkipReason::TooShort { words: 10, min: 4000 })
        );
    }

    #[test]
    fn test_missing_title_is_skipped() {
        let mut untitled = block(Some("5000"), Some("English"));
        untitled.title = None;
        untitled.href = None;
        assert_eq!(
            accept_block(&untitled, &base(), &FilterCriteria::default()),
            Err(SkipReason::MissingTitle)
        );
    }

    #[test]
    fn test_accepted_record_has_absolute_url() {
        let mut tagged = block(Some("12,345"), Some("English"));
        tagged.tags = vec!["Fluff".into(), "Angst".into()];
        let record = accept_block(&tagged, &base(), &FilterCriteria::default()).unwrap();
        assert_eq!(record.url, "https://archiveofourown.org/works/1");
        assert_eq!(record.word_count, 12345);
        assert_eq!(record.tags, vec!["Fluff", "Angst"]);
    }

    #[test]
    fn test_custom_criteria() {
        let criteria = FilterCriteria {
            min_words: 100,
            language: "Deutsch".into(),
        };
        assert!(accept_block(&block(Some("100"), Some("deutsch")), &base(), &criteria).is_ok());
        assert!(accept_block(&block(Some("100"), Some("English")), &base(), &criteria).is_err());
    }

    #[tokio::test]
    async fn test_collect_follows_pagination() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("Fluff").join("ao3_stories.txt");
        let source = FakeSource::default()
            .with(
                "https://archiveofourown.org/tags/Fluff/works",
                200,
                page_html(
                    &[
                        work_html(1, Some("5,000"), Some("English"), &["Fluff"]),
                        work_html(2, Some("3999"), Some("English"), &[]),
                        work_html(3, Some("9000"), Some("Français"), &[]),
                    ],
                    Some("/tags/Fluff/works?page=2"),
                ),
            )
            .with(
                "https://archiveofourown.org/tags/Fluff/works?page=2",
                200,
                page_html(&[work_html(4, Some("4000"), Some("ENGLISH"), &[])], None),
            );
        let pacer = RecordingPacer::default();

        let summary = collect_tag(&source, &pacer, &config("Fluff", base()), &output)
            .await
            .unwrap();

        assert_eq!(
            summary,
            CollectSummary {
                pages: 2,
                accepted: 2,
                skipped: 2,
                stop: StopReason::Exhausted,
            }
        );
        assert_eq!(
            source.requested(),
            vec![
                "https://archiveofourown.org/tags/Fluff/works",
                "https://archiveofourown.org/tags/Fluff/works?page=2",
            ]
        );
        assert_eq!(pacer.recorded(), vec![Duration::from_secs(2)]);

        let contents = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            contents,
            format!(
                "Story Title: Work 1\nStory URL: https://archiveofourown.org/works/1\nWord Count: 5000\nTags: Fluff\n{dashes}\n\
                 Story Title: Work 4\nStory URL: https://archiveofourown.org/works/4\nWord Count: 4000\nTags: \n{dashes}\n",
                dashes = "-".repeat(40)
            )
        );
    }

    #[tokio::test]
    async fn test_collect_stops_on_non_success_status() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ao3_stories.txt");
        let source = FakeSource::default()
            .with(
                "https://archiveofourown.org/tags/Angst/works",
                200,
                page_html(
                    &[work_html(7, Some("8000"), Some("English"), &[])],
                    Some("/tags/Angst/works?page=2"),
                ),
            )
            .with(
                "https://archiveofourown.org/tags/Angst/works?page=2",
                503,
                "Service Unavailable".to_string(),
            );
        let pacer = RecordingPacer::default();

        let summary = collect_tag(&source, &pacer, &config("Angst", base()), &output)
            .await
            .unwrap();

        assert_eq!(summary.stop, StopReason::HttpStatus(503));
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.accepted, 1);
        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.contains("Story URL: https://archiveofourown.org/works/7\n"));
    }

    #[tokio::test]
    async fn test_collect_first_page_failure_leaves_empty_listing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ao3_stories.txt");
        std::fs::write(&output, "previous run\n").unwrap();
        let source = FakeSource::default().with(
            "https://archiveofourown.org/tags/Gone/works",
            404,
            String::new(),
        );
        let pacer = RecordingPacer::default();

        let summary = collect_tag(&source, &pacer, &config("Gone", base()), &output)
            .await
            .unwrap();

        assert_eq!(summary.stop, StopReason::HttpStatus(404));
        assert_eq!(summary.pages, 0);
        assert!(pacer.recorded().is_empty());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "");
    }

    #[tokio::test]
    async fn test_collect_transport_error_propagates_and_keeps_written_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ao3_stories.txt");
        // Page 2 is not served at all, which the fake reports as a transport error.
        let source = FakeSource::default().with(
            "https://archiveofourown.org/tags/Drama/works",
            200,
            page_html(
                &[work_html(9, Some("4500"), Some("English"), &[])],
                Some("/tags/Drama/works?page=2"),
            ),
        );
        let pacer = RecordingPacer::default();

        let result = collect_tag(&source, &pacer, &config("Drama", base()), &output).await;

        assert!(result.is_err());
        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.starts_with("Story Title: Work 9\n"));
    }

    #[tokio::test]
    async fn test_collect_over_http() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tags/Found%20Family/works"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_html(
                &[work_html(22, Some("6,100"), Some("English"), &["Found Family"])],
                None,
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tags/Found%20Family/works"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page_html(
                &[work_html(21, Some("4,200"), Some("English"), &[])],
                Some("/tags/Found%20Family/works?page=2"),
            )))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("ao3_stories.txt");
        let base_url = Url::parse(&server.uri()).unwrap();
        let pacer = RecordingPacer::default();

        let summary = collect_tag(
            &HttpPageSource::new(),
            &pacer,
            &config("Found Family", base_url),
            &output,
        )
        .await
        .unwrap();

        assert_eq!(summary.pages, 2);
        assert_eq!(summary.accepted, 2);
        let contents = std::fs::read_to_string(&output).unwrap();
        assert!(contents.contains("/works/21\n"));
        assert!(contents.contains("Tags: Found Family\n"));
    }
}
