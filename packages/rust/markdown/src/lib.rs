//! HTML-to-Markdown conversion for mirrored pages.
//!
//! A page is reduced to the direct children of its `<body>` (see
//! [`extract_body_fragment`]) and rendered with `htmd` under a fixed policy:
//! links stay Markdown links, images are dropped entirely, and lines are never
//! wrapped to a width. The rendered text is returned as-is, with no cleanup
//! pass afterwards.

mod extract;

use tracing::{debug, instrument};

use docmirror_shared::{DocMirrorError, Result};

pub use extract::extract_body_fragment;

/// Tags whose content never reaches the Markdown output.
const SKIPPED_TAGS: [&str; 3] = ["script", "style", "img"];

/// Convert a full HTML page to Markdown.
#[instrument(skip_all, fields(html_len = html.len()))]
pub fn html_to_markdown(html: &str) -> Result<String> {
    let fragment = extract_body_fragment(html);
    debug!(fragment_len = fragment.len(), "extracted body fragment");
    render(&fragment)
}

/// Render an HTML fragment to Markdown under the fixed rendering policy.
pub fn render(fragment: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .build();

    converter
        .convert(fragment)
        .map_err(|e| DocMirrorError::conversion(format!("htmd conversion failed: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
