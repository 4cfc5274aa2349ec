//! Error types for docmirror.
//!
//! Library crates use [`DocMirrorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docmirror operations.
#[derive(Debug, thiserror::Error)]
pub enum DocMirrorError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The sitemap is not well-formed XML. Fatal for a run.
    #[error("sitemap parse error in {source_name}: {message}")]
    Sitemap {
        source_name: String,
        message: String,
    },

    /// Network failure, timeout, or non-success HTTP status for one page.
    #[error("{url}: {message}")]
    Fetch { url: String, message: String },

    /// HTML-to-Markdown conversion error.
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocMirrorError>;

impl DocMirrorError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a sitemap parse error for the named source (a path or `<memory>`).
    pub fn sitemap(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Sitemap {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }

    /// Create a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: msg.into(),
        }
    }

    /// Create a conversion error from any displayable message.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
