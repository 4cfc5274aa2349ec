//! Shared types, error model, and configuration for docmirror.
//!
//! This crate is the foundation depended on by all other docmirror crates.
//! It provides:
//! - [`DocMirrorError`], the unified error type
//! - Domain types ([`PageResult`], [`OutputDocument`], [`RunSummary`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{DocMirrorError, Result};
pub use types::{
    DEFAULT_OUTPUT, DEFAULT_PREFIX, DEFAULT_TIMEOUT_SECS, OutputDocument, PageResult,
    PageStatus, PageSummary, RunSummary,
};
