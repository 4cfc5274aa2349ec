//! Core domain types shared by the pipeline crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default URL prefix filter.
pub const DEFAULT_PREFIX: &str = "https://docs.dify.ai/ja-jp";

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "output.md";

// ---------------------------------------------------------------------------
// PageResult
// ---------------------------------------------------------------------------

/// Outcome of converting a single sitemap URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    /// The page was fetched and rendered.
    Success { url: String, markdown: String },
    /// Fetching or converting the page failed; `error` is the stringified cause.
    Failure { url: String, error: String },
}

impl PageResult {
    /// The URL this result belongs to.
    pub fn url(&self) -> &str {
        match self {
            Self::Success { url, .. } | Self::Failure { url, .. } => url,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

// ---------------------------------------------------------------------------
// OutputDocument
// ---------------------------------------------------------------------------

/// The concatenated Markdown document produced by a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDocument {
    content: String,
    fragments: usize,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one rendered fragment.
    pub fn push_fragment(&mut self, fragment: &str) {
        self.content.push_str(fragment);
        self.fragments += 1;
    }

    /// Number of fragments appended so far.
    pub fn fragment_count(&self) -> usize {
        self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments == 0
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn into_string(self) -> String {
        self.content
    }
}

impl std::fmt::Display for OutputDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Per-page status recorded in the JSON run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Ok,
    Error,
}

/// One entry of the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub status: PageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Size of the rendered Markdown body; zero for failed pages.
    pub markdown_bytes: usize,
}

impl From<&PageResult> for PageSummary {
    fn from(result: &PageResult) -> Self {
        match result {
            PageResult::Success { url, markdown } => Self {
                url: url.clone(),
                status: PageStatus::Ok,
                error: None,
                markdown_bytes: markdown.len(),
            },
            PageResult::Failure { url, error } => Self {
                url: url.clone(),
                status: PageStatus::Error,
                error: Some(error.clone()),
                markdown_bytes: 0,
            },
        }
    }
}

/// Machine-readable summary of a batch run (`--report`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Where the sitemap was read from.
    pub sitemap: String,
    /// Prefix filter used.
    pub prefix: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Number of URLs listed in the sitemap.
    pub total_urls: usize,
    /// Number of URLs that matched the prefix.
    pub matched_urls: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Whether the run was interrupted before all matched URLs were processed.
    pub cancelled: bool,
    #[serde(default)]
    pub pages: Vec<PageSummary>,
}
