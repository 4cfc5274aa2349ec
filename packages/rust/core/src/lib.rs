//! Batch orchestration for docmirror.
//!
//! This crate ties together sitemap discovery, page fetching, and Markdown
//! conversion into one end-to-end run (see [`pipeline::run`]).

pub mod assembler;
pub mod converter;
pub mod pipeline;

pub use assembler::{assemble, render_fragment, write_document, write_report};
pub use converter::{HttpPageConverter, PageConverter};
pub use pipeline::{
    BatchOptions, BatchOutcome, BatchReport, BatchState, CancelFlag, ProgressReporter,
    SilentProgress, filter_by_prefix, fraction, run, run_urls,
};
