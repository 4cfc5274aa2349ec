//! The page conversion seam: URL in, Markdown out.

use std::future::Future;

use tracing::debug;

use docmirror_crawler::{FetchOptions, Fetcher};
use docmirror_shared::Result;

/// Turns one URL into Markdown text.
///
/// The batch pipeline is generic over this trait so it can be driven by
/// deterministic converters in tests and by [`HttpPageConverter`] in production.
pub trait PageConverter {
    /// Fetch and convert `url`. Errors are recorded per page by the caller.
    fn convert(&self, url: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Fetches pages over HTTP and renders their body with `docmirror-markdown`.
#[derive(Debug, Clone)]
pub struct HttpPageConverter {
    fetcher: Fetcher,
}

impl HttpPageConverter {
    /// Build a converter whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let fetcher = Fetcher::new(&FetchOptions { timeout_secs })?;
        Ok(Self { fetcher })
    }
}

impl PageConverter for HttpPageConverter {
    async fn convert(&self, url: &str) -> Result<String> {
        let page = self.fetcher.fetch(url).await?;
        let markdown = docmirror_markdown::html_to_markdown(&page.body)?;
        debug!(
            url,
            status = page.status,
            markdown_len = markdown.len(),
            "page converted"
        );
        Ok(markdown)
    }
}
