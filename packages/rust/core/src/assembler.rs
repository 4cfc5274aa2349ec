//! Output document assembly.
//!
//! Renders each [`PageResult`] into a fragment, concatenates the fragments in
//! input order, and writes the finished document and run report to disk.

use std::path::Path;

use tracing::{debug, info, instrument};

use docmirror_shared::{
    DocMirrorError, OutputDocument, PageResult, PageSummary, Result, RunSummary,
};

/// Separator closing every fragment.
pub const SEPARATOR: &str = "---";

/// Marker that starts the body line of a failed page.
pub const ERROR_MARKER: &str = ">> Error:";

/// Render a single page result.
///
/// ```text
/// # URL: <url>
///
/// <markdown, or ">> Error: <reason>">
///
/// ---
///
/// ```
pub fn render_fragment(result: &PageResult) -> String {
    match result {
        PageResult::Success { url, markdown } => {
            format!("# URL: {url}\n\n{markdown}\n\n{SEPARATOR}\n\n")
        }
        PageResult::Failure { url, error } => {
            format!("# URL: {url}\n\n{ERROR_MARKER} {error}\n\n{SEPARATOR}\n\n")
        }
    }
}

/// Concatenate one fragment per result, preserving order.
pub fn assemble(results: &[PageResult]) -> OutputDocument {
    let mut document = OutputDocument::new();
    for result in results {
        document.push_fragment(&render_fragment(result));
    }
    debug!(
        fragments = document.fragment_count(),
        bytes = document.as_str().len(),
        "document assembled"
    );
    document
}

/// Build the serializable per-page report entries.
pub fn page_summaries(results: &[PageResult]) -> Vec<PageSummary> {
    results.iter().map(PageSummary::from).collect()
}

/// Write the document to `path` atomically (write to temp, then rename).
#[instrument(skip(document), fields(path = %path.display()))]
pub fn write_document(path: &Path, document: &OutputDocument) -> Result<()> {
    write_atomic(path, document.as_str().as_bytes())?;
    info!(
        fragments = document.fragment_count(),
        bytes = document.as_str().len(),
        "output written"
    );
    Ok(())
}

/// Write the JSON run report (pretty-printed).
pub fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| DocMirrorError::config(format!("JSON serialization failed: {e}")))?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote run report");
    Ok(())
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|e| DocMirrorError::io(&parent, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| DocMirrorError::config(format!("not a file path: {}", path.display())))?;
    let temp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    std::fs::write(&temp, content).map_err(|e| DocMirrorError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| DocMirrorError::io(path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
