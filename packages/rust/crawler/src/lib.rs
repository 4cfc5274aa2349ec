//! Page fetching for docmirror.
//!
//! Pages are fetched strictly one at a time by the caller; this crate only
//! performs a single timed GET and turns the response into text or a
//! classified error.

pub mod encoding;
pub mod fetch;

pub use fetch::{FetchOptions, FetchedPage, Fetcher};
