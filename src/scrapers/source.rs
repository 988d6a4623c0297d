//! Where listing pages come from.
//!
//! [`PageSource`] is the seam between the collector and the network. The
//! production [`HttpPageSource`] issues one plain GET per page with a default
//! `reqwest` client: no custom headers, no auth, no retry and no timeout.

use reqwest::{Client, StatusCode};
use std::error::Error;
use tracing::{debug, instrument};
use url::Url;

/// A fetched page: its status and its body, whatever the status was.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: StatusCode,
    pub body: String,
}

/// Fetches one page per call.
///
/// A non-success status is a normal [`FetchedPage`]; only transport failures
/// are errors.
pub trait PageSource {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, Box<dyn Error>>;
}

/// [`PageSource`] backed by a `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, Box<dyn Error>> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "Fetched page");
        Ok(FetchedPage { status, body })
    }
}
