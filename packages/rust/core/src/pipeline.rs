//! End-to-end batch: sitemap → prefix filter → convert each page → one document.
//!
//! Pages are processed strictly one at a time in sitemap order. A page that
//! fails to fetch or convert becomes an error fragment and the batch moves on;
//! only a sitemap failure aborts the run. Each conversion is bounded by
//! [`BatchOptions::timeout_secs`] whatever the converter's own settings are.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use docmirror_shared::{
    AppConfig, DEFAULT_PREFIX, DEFAULT_TIMEOUT_SECS, DocMirrorError, OutputDocument, PageResult,
    Result, RunSummary,
};

use crate::assembler;
use crate::converter::PageConverter;

/// Parameters for a batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Literal, case-sensitive prefix a URL must start with to be converted.
    pub prefix: String,
    /// Upper bound in seconds on converting one URL. Zero times out every page.
    pub timeout_secs: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl From<&AppConfig> for BatchOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            prefix: config.defaults.prefix.clone(),
            timeout_secs: config.defaults.timeout_secs,
        }
    }
}

/// Where a batch run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    ParsingSitemap,
    Filtering,
    /// Terminal: no URL matched the prefix.
    Empty,
    /// Converting URL `index` (zero-based) of `total`.
    Fetching { index: usize, total: usize },
    Assembling,
    /// Terminal: the document is ready.
    Done,
    /// Terminal: the sitemap could not be read or parsed.
    Failed,
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::ParsingSitemap => f.write_str("Parsing sitemap"),
            Self::Filtering => f.write_str("Filtering URLs"),
            Self::Empty => f.write_str("No matching URLs"),
            Self::Fetching { index, total } => write!(f, "Fetching [{}/{total}]", index + 1),
            Self::Assembling => f.write_str("Assembling document"),
            Self::Done => f.write_str("Done"),
            Self::Failed => f.write_str("Failed"),
        }
    }
}

/// Progress callback for observing a batch run.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition.
    fn state(&self, state: &BatchState);
    /// Called before a URL is converted.
    fn page_started(&self, url: &str, index: usize, total: usize);
    /// Called after each URL with `completed / total` URLs done.
    fn page_finished(&self, result: &PageResult, completed: usize, total: usize);
    /// Polled before each URL; returning `true` stops scheduling further URLs.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _state: &BatchState) {}
    fn page_started(&self, _url: &str, _index: usize, _total: usize) {}
    fn page_finished(&self, _result: &PageResult, _completed: usize, _total: usize) {}
}

/// Fraction of the batch completed, in `0.0..=1.0`.
pub fn fraction(completed: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        completed as f64 / total as f64
    }
}

/// Shared flag a front end sets to stop a run after the in-flight page.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of a batch run that did not fail.
#[derive(Debug)]
pub enum BatchOutcome {
    /// No sitemap URL started with the prefix. Nothing was fetched and the
    /// document is empty.
    NoMatchingUrls { prefix: String, total_urls: usize },
    /// The batch ran (possibly cancelled part-way).
    Completed(BatchReport),
}

impl BatchOutcome {
    /// The assembled document; empty when no URL matched.
    pub fn into_document(self) -> OutputDocument {
        match self {
            Self::NoMatchingUrls { .. } => OutputDocument::new(),
            Self::Completed(report) => report.document,
        }
    }
}

/// Everything a completed batch produced.
#[derive(Debug)]
pub struct BatchReport {
    pub document: OutputDocument,
    /// One result per processed URL, in processing order.
    pub results: Vec<PageResult>,
    /// URLs listed in the sitemap.
    pub total_urls: usize,
    /// URLs that matched the prefix.
    pub matched_urls: usize,
    /// Whether the run stopped before every matched URL was processed.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Build the serializable run summary.
    pub fn summary(&self, sitemap: &str, prefix: &str, started_at: DateTime<Utc>) -> RunSummary {
        RunSummary {
            sitemap: sitemap.to_string(),
            prefix: prefix.to_string(),
            started_at,
            elapsed_ms: u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX),
            total_urls: self.total_urls,
            matched_urls: self.matched_urls,
            succeeded: self.succeeded(),
            failed: self.failed(),
            cancelled: self.cancelled,
            pages: assembler::page_summaries(&self.results),
        }
    }
}

/// Keep the URLs that start with `prefix`, preserving order and duplicates.
pub fn filter_by_prefix(urls: &[String], prefix: &str) -> Vec<String> {
    urls.iter()
        .filter(|u| u.starts_with(prefix))
        .cloned()
        .collect()
}

/// Run the full batch from a sitemap file.
///
/// A sitemap that cannot be read or parsed is returned as an error; every
/// per-page failure is captured in the document instead.
#[instrument(skip_all, fields(sitemap = %sitemap_path.display(), prefix = %opts.prefix))]
pub async fn run<C: PageConverter>(
    sitemap_path: &Path,
    opts: &BatchOptions,
    converter: &C,
    progress: &dyn ProgressReporter,
) -> Result<BatchOutcome> {
    progress.state(&BatchState::ParsingSitemap);

    let urls = match docmirror_discovery::parse_sitemap(sitemap_path) {
        Ok(urls) => urls,
        Err(e) => {
            progress.state(&BatchState::Failed);
            return Err(e);
        }
    };

    Ok(run_urls(&urls, opts, converter, progress).await)
}

/// Run the filter, convert, and assemble steps on an already-parsed URL list.
pub async fn run_urls<C: PageConverter>(
    urls: &[String],
    opts: &BatchOptions,
    converter: &C,
    progress: &dyn ProgressReporter,
) -> BatchOutcome {
    let start = Instant::now();

    progress.state(&BatchState::Filtering);
    let filtered = filter_by_prefix(urls, &opts.prefix);

    if filtered.is_empty() {
        warn!(prefix = %opts.prefix, total_urls = urls.len(), "no URLs match the prefix");
        progress.state(&BatchState::Empty);
        return BatchOutcome::NoMatchingUrls {
            prefix: opts.prefix.clone(),
            total_urls: urls.len(),
        };
    }

    let total = filtered.len();
    let page_timeout = Duration::from_secs(opts.timeout_secs);
    info!(total_urls = urls.len(), matched = total, "starting batch");

    let mut results: Vec<PageResult> = Vec::with_capacity(total);
    let mut cancelled = false;

    for (index, url) in filtered.iter().enumerate() {
        if progress.is_cancelled() {
            info!(processed = index, total, "cancelled, not scheduling further URLs");
            cancelled = true;
            break;
        }

        progress.state(&BatchState::Fetching { index, total });
        progress.page_started(url, index, total);
        info!(%url, "fetching");

        let converted = match tokio::time::timeout(page_timeout, converter.convert(url)).await {
            Ok(converted) => converted,
            Err(_) => Err(DocMirrorError::fetch(
                url.as_str(),
                format!("timed out after {}s", opts.timeout_secs),
            )),
        };

        let result = match converted {
            Ok(markdown) => PageResult::Success {
                url: url.clone(),
                markdown,
            },
            Err(e) => {
                warn!(%url, error = %e, "page failed, continuing");
                PageResult::Failure {
                    url: url.clone(),
                    error: e.to_string(),
                }
            }
        };

        debug!(%url, progress = fraction(index + 1, total), "page done");
        progress.page_finished(&result, index + 1, total);
        results.push(result);
    }

    progress.state(&BatchState::Assembling);
    let document = assembler::assemble(&results);

    let report = BatchReport {
        document,
        results,
        total_urls: urls.len(),
        matched_urls: total,
        cancelled,
        elapsed: start.elapsed(),
    };

    progress.state(&BatchState::Done);
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        cancelled = report.cancelled,
        elapsed_ms = report.elapsed.as_millis(),
        "batch complete"
    );

    BatchOutcome::Completed(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::time::Duration as StdDuration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::assembler::ERROR_MARKER;
    use crate::converter::HttpPageConverter;

    /// Converter answering from a fixed table; unknown URLs fail.
    struct TableConverter {
        pages: HashMap<String, std::result::Result<String, String>>,
        calls: Mutex<Vec<String>>,
    }

    impl TableConverter {
        fn new(entries: &[(&str, std::result::Result<&str, &str>)]) -> Self {
            let pages = entries
                .iter()
                .map(|(url, r)| {
                    (
                        url.to_string(),
                        r.map(str::to_string).map_err(str::to_string),
                    )
                })
                .collect();
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PageConverter for TableConverter {
        async fn convert(&self, url: &str) -> Result<String> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(md)) => Ok(md.clone()),
                Some(Err(msg)) => Err(DocMirrorError::fetch(url, msg.clone())),
                None => Err(DocMirrorError::fetch(url, "HTTP 404 Not Found")),
            }
        }
    }

    /// Records every callback.
    #[derive(Default)]
    struct RecordingProgress {
        states: Mutex<Vec<BatchState>>,
        fractions: Mutex<Vec<f64>>,
        cancel_after: Option<usize>,
        flag: CancelFlag,
    }

    impl ProgressReporter for RecordingProgress {
        fn state(&self, state: &BatchState) {
            self.states.lock().unwrap().push(*state);
        }

        fn page_started(&self, _url: &str, _index: usize, _total: usize) {}

        fn page_finished(&self, _result: &PageResult, completed: usize, total: usize) {
            self.fractions.lock().unwrap().push(fraction(completed, total));
            if self.cancel_after == Some(completed) {
                self.flag.cancel();
            }
        }

        fn is_cancelled(&self) -> bool {
            self.flag.is_cancelled()
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn opts(prefix: &str) -> BatchOptions {
        BatchOptions {
            prefix: prefix.into(),
            timeout_secs: 5,
        }
    }

    fn completed(outcome: BatchOutcome) -> BatchReport {
        match outcome {
            BatchOutcome::Completed(report) => report,
            BatchOutcome::NoMatchingUrls { .. } => panic!("expected Completed, got NoMatchingUrls"),
        }
    }

    fn fixture_path(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("../../../fixtures/sitemaps")
            .join(name)
    }

    // --- Filtering ---

    #[test]
    fn filter_keeps_order_and_duplicates() {
        let list = urls(&[
            "https://a.com/docs/1",
            "https://b.com/docs/2",
            "https://a.com/docs/1",
            "https://a.com/blog/3",
            "https://a.com/docs/4",
        ]);
        assert_eq!(
            filter_by_prefix(&list, "https://a.com/docs"),
            urls(&[
                "https://a.com/docs/1",
                "https://a.com/docs/1",
                "https://a.com/docs/4"
            ])
        );
    }

    #[test]
    fn filter_is_case_sensitive_and_literal() {
        let list = urls(&["https://A.com/docs", "https://a.com/docs", "xhttps://a.com/docs"]);
        assert_eq!(filter_by_prefix(&list, "https://a.com"), urls(&["https://a.com/docs"]));
        assert_eq!(filter_by_prefix(&list, "").len(), 3);
    }

    #[test]
    fn fraction_bounds() {
        assert_eq!(fraction(0, 4), 0.0);
        assert_eq!(fraction(2, 4), 0.5);
        assert_eq!(fraction(4, 4), 1.0);
        assert_eq!(fraction(0, 0), 1.0);
    }

    #[test]
    fn options_from_config() {
        let mut config = AppConfig::default();
        config.defaults.prefix = "https://docs.example.com".into();
        config.defaults.timeout_secs = 3;
        let o = BatchOptions::from(&config);
        assert_eq!(o.prefix, "https://docs.example.com");
        assert_eq!(o.timeout_secs, 3);
    }

    // --- Batch behavior ---

    #[tokio::test]
    async fn no_matching_urls_is_empty_outcome() {
        let converter = TableConverter::new(&[]);
        let progress = RecordingProgress::default();

        let outcome = run_urls(
            &urls(&["https://other.com/a"]),
            &opts("https://docs.example.com"),
            &converter,
            &progress,
        )
        .await;

        match &outcome {
            BatchOutcome::NoMatchingUrls { prefix, total_urls } => {
                assert_eq!(prefix, "https://docs.example.com");
                assert_eq!(*total_urls, 1);
            }
            BatchOutcome::Completed(_) => panic!("expected NoMatchingUrls"),
        }
        assert!(outcome.into_document().is_empty());
        assert!(converter.calls().is_empty());
        assert_eq!(
            *progress.states.lock().unwrap(),
            vec![BatchState::Filtering, BatchState::Empty]
        );
    }

    #[tokio::test]
    async fn middle_failure_does_not_stop_batch() {
        let converter = TableConverter::new(&[
            ("https://e.com/1", Ok("first page")),
            ("https://e.com/2", Err("timed out after 5s")),
            ("https://e.com/3", Ok("third page")),
        ]);
        let progress = RecordingProgress::default();
        let list = urls(&["https://e.com/1", "https://e.com/2", "https://e.com/3"]);

        let report = completed(run_urls(&list, &opts("https://e.com"), &converter, &progress).await);

        assert_eq!(converter.calls(), list);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.document.fragment_count(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.cancelled);

        let fragments: Vec<&str> = report
            .document
            .as_str()
            .split_inclusive("\n---\n\n")
            .collect();
        assert_eq!(fragments.len(), 3);
        assert!(fragments[0].starts_with("# URL: https://e.com/1"));
        assert!(!fragments[0].contains(ERROR_MARKER));
        assert!(fragments[1].starts_with("# URL: https://e.com/2"));
        assert!(fragments[1].contains(">> Error: https://e.com/2: timed out after 5s"));
        assert!(fragments[2].starts_with("# URL: https://e.com/3"));
        assert!(!fragments[2].contains(ERROR_MARKER));

        let fractions = progress.fractions.lock().unwrap().clone();
        assert_eq!(fractions.len(), 3);
        assert!((fractions[0] - 1.0 / 3.0).abs() < 1e-9);
        assert!((fractions[1] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(fractions[2], 1.0);
    }

    #[tokio::test]
    async fn state_transitions_for_completed_run() {
        let converter = TableConverter::new(&[("https://e.com/1", Ok("x")), ("https://e.com/2", Ok("y"))]);
        let progress = RecordingProgress::default();

        let _ = completed(
            run(
                &write_sitemap(&urls(&["https://e.com/1", "https://e.com/2"])),
                &opts("https://e.com"),
                &converter,
                &progress,
            )
            .await
            .unwrap(),
        );

        assert_eq!(
            *progress.states.lock().unwrap(),
            vec![
                BatchState::ParsingSitemap,
                BatchState::Filtering,
                BatchState::Fetching { index: 0, total: 2 },
                BatchState::Fetching { index: 1, total: 2 },
                BatchState::Assembling,
                BatchState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn sitemap_failure_is_fatal() {
        let converter = TableConverter::new(&[]);
        let progress = RecordingProgress::default();

        let err = run(
            &fixture_path("malformed.xml"),
            &opts("https://docs.example.com"),
            &converter,
            &progress,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DocMirrorError::Sitemap { .. }));
        assert!(converter.calls().is_empty());
        assert_eq!(
            *progress.states.lock().unwrap(),
            vec![BatchState::ParsingSitemap, BatchState::Failed]
        );
    }

    #[tokio::test]
    async fn runs_are_idempotent() {
        let converter = TableConverter::new(&[
            ("https://docs.example.com/guide/intro", Ok("# Intro\n\nHello")),
            ("https://docs.example.com/guide/setup", Ok("# Setup\n\nSteps")),
        ]);
        let sitemap = fixture_path("unqualified.xml");
        let o = opts("https://docs.example.com/guide");

        let first = completed(run(&sitemap, &o, &converter, &SilentProgress).await.unwrap());
        let second = completed(run(&sitemap, &o, &converter, &SilentProgress).await.unwrap());

        assert_eq!(first.total_urls, 3);
        assert_eq!(first.matched_urls, 2);
        assert_eq!(first.document.as_str(), second.document.as_str());
        assert_eq!(
            first.document.as_str(),
            "# URL: https://docs.example.com/guide/intro\n\n# Intro\n\nHello\n\n---\n\n\
             # URL: https://docs.example.com/guide/setup\n\n# Setup\n\nSteps\n\n---\n\n"
        );
    }

    #[tokio::test]
    async fn cancellation_stops_after_in_flight_page() {
        let converter = TableConverter::new(&[
            ("https://e.com/1", Ok("one")),
            ("https://e.com/2", Ok("two")),
            ("https://e.com/3", Ok("three")),
        ]);
        let progress = RecordingProgress {
            cancel_after: Some(1),
            ..Default::default()
        };
        let list = urls(&["https://e.com/1", "https://e.com/2", "https://e.com/3"]);

        let report = completed(run_urls(&list, &opts("https://e.com"), &converter, &progress).await);

        assert!(report.cancelled);
        assert_eq!(converter.calls(), urls(&["https://e.com/1"]));
        assert_eq!(report.document.fragment_count(), 1);
        assert_eq!(report.matched_urls, 3);
    }

    #[test]
    fn summary_counts() {
        let report = BatchReport {
            document: OutputDocument::new(),
            results: vec![
                PageResult::Success {
                    url: "https://e.com/1".into(),
                    markdown: "abc".into(),
                },
                PageResult::Failure {
                    url: "https://e.com/2".into(),
                    error: "boom".into(),
                },
            ],
            total_urls: 5,
            matched_urls: 2,
            cancelled: false,
            elapsed: StdDuration::from_millis(42),
        };
        let summary = report.summary("sitemap.xml", "https://e.com", Utc::now());
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.elapsed_ms, 42);
        assert_eq!(summary.total_urls, 5);
        assert_eq!(summary.pages.len(), 2);
    }

    // --- End-to-end over HTTP ---

    fn write_sitemap(locs: &[String]) -> tempfile::TempPath {
        let body: String = locs
            .iter()
            .map(|u| format!("  <url><loc>{u}</loc></url>\n"))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{body}</urlset>\n"
        );
        docmirror_discovery::persist_upload(xml.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn http_batch_with_unreachable_middle_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/docs/one"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><h1>One</h1><p>See <a href="https://x">text</a></p></body></html>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/two"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/three"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><h1>Three</h1><img src="/a.png" alt="diagram"></body></html>"#,
            ))
            .mount(&server)
            .await;

        let base = server.uri();
        let locs = vec![
            format!("{base}/docs/one"),
            format!("{base}/docs/two"),
            format!("{base}/blog/skip"),
            format!("{base}/docs/three"),
        ];
        let sitemap = write_sitemap(&locs);

        let converter = HttpPageConverter::new(5).unwrap();
        let report = completed(
            run(&sitemap, &opts(&format!("{base}/docs")), &converter, &SilentProgress)
                .await
                .unwrap(),
        );

        assert_eq!(report.total_urls, 4);
        assert_eq!(report.matched_urls, 3);
        assert_eq!(report.document.fragment_count(), 3);

        let doc = report.document.as_str();
        let one = doc.find(&format!("# URL: {base}/docs/one")).unwrap();
        let two = doc.find(&format!("# URL: {base}/docs/two")).unwrap();
        let three = doc.find(&format!("# URL: {base}/docs/three")).unwrap();
        assert!(one < two && two < three);
        assert!(!doc.contains("/blog/skip"));

        assert_eq!(doc.matches(ERROR_MARKER).count(), 1);
        let error_line = doc.lines().find(|l| l.starts_with(ERROR_MARKER)).unwrap();
        assert!(error_line.contains("404"));
        assert!(error_line.contains(&format!("{base}/docs/two")));

        assert!(doc.contains("[text](https://x)"));
        assert!(!doc.contains("!["));
        assert!(!doc.contains("diagram"));
    }

    #[tokio::test]
    async fn http_batch_timeout_is_recorded_per_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>late</p></body></html>")
                    .set_delay(StdDuration::from_secs(3)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><body><p>quick</p></body></html>"),
            )
            .mount(&server)
            .await;

        let base = server.uri();
        let list = vec![format!("{base}/slow"), format!("{base}/fast")];
        let converter = HttpPageConverter::new(1).unwrap();

        let report = completed(run_urls(&list, &opts(&base), &converter, &SilentProgress).await);

        assert!(matches!(&report.results[0], PageResult::Failure { error, .. } if error.contains("timed out")));
        assert!(matches!(&report.results[1], PageResult::Success { markdown, .. } if markdown.contains("quick")));
    }

    #[tokio::test]
    async fn options_timeout_bounds_a_lenient_converter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/late"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>late</p></body></html>")
                    .set_delay(StdDuration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let url = format!("{}/late", server.uri());
        let converter = HttpPageConverter::new(10).unwrap();
        let options = BatchOptions {
            prefix: server.uri(),
            timeout_secs: 1,
        };

        let report =
            completed(run_urls(&[url.clone()], &options, &converter, &SilentProgress).await);

        assert_eq!(report.failed(), 1);
        match &report.results[0] {
            PageResult::Failure { url: failed_url, error } => {
                assert_eq!(failed_url, &url);
                assert!(error.contains("timed out after 1s"), "got {error}");
            }
            PageResult::Success { markdown, .. } => panic!("expected a timeout, got {markdown:?}"),
        }
        assert!(report.document.as_str().contains(ERROR_MARKER));
    }
}
