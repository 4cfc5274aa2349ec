//! Single-page HTTP fetching.
//!
//! One GET per call, no retries, no custom headers. Non-2xx statuses,
//! connection failures and timeouts all surface as [`DocMirrorError::Fetch`].
//! Bodies are decoded by [`crate::encoding::decode_body`], so a page that
//! only declares its charset in a `<meta>` tag still comes out as proper text.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use docmirror_shared::{DEFAULT_TIMEOUT_SECS, DocMirrorError, Result};

use crate::encoding;

/// Options for building a [`Fetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Whole-request timeout in seconds (connect + headers + body).
    pub timeout_secs: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A fetched page body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested.
    pub url: String,
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
}

/// HTTP client wrapper used to retrieve page HTML.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Build a fetcher with the given options.
    pub fn new(opts: &FetchOptions) -> Result<Self> {
        let timeout = Duration::from_secs(opts.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocMirrorError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, timeout })
    }

    /// GET `url` and return its body. Fails on any non-2xx status.
    #[instrument(skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocMirrorError::fetch(url, describe(&e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocMirrorError::fetch(url, format!("HTTP {status}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let bytes = response.bytes().await.map_err(|e| {
            DocMirrorError::fetch(url, format!("body read failed: {}", describe(&e, self.timeout)))
        })?;
        let (body, used) = encoding::decode_body(content_type.as_deref(), &bytes);

        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            encoding = used.name(),
            "page fetched"
        );

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Human-readable cause for a transport error.
fn describe(err: &reqwest::Error, timeout: Duration) -> String {
    if err.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else if err.is_builder() {
        format!("invalid request: {err}")
    } else {
        err.to_string()
    }
}
