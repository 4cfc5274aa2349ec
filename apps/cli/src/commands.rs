//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docmirror_core::assembler::{write_document, write_report};
use docmirror_core::pipeline::{
    self, BatchOptions, BatchOutcome, BatchState, CancelFlag, ProgressReporter,
};
use docmirror_core::HttpPageConverter;
use docmirror_shared::{AppConfig, PageResult, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::TempPath;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

/// Sitemap or output argument meaning stdin / stdout.
const STDIO_ARG: &str = "-";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docmirror: flatten a documentation site into a single Markdown file.
#[derive(Parser)]
#[command(
    name = "docmirror",
    version,
    about = "Convert the pages listed in a sitemap into one concatenated Markdown document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch every matching sitemap URL and write the combined document.
    Run(RunArgs),

    /// Print the sitemap URLs that match the prefix, one per line.
    Urls {
        /// Sitemap XML file, or `-` to read it from stdin.
        #[arg(long)]
        sitemap: String,

        /// Only URLs starting with this string are listed.
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments for `docmirror run`.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// Sitemap XML file, or `-` to read it from stdin.
    #[arg(long)]
    pub sitemap: String,

    /// Only URLs starting with this string are converted.
    #[arg(long)]
    pub prefix: Option<String>,

    /// Output Markdown file, or `-` for stdout.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Also write a JSON run report to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long)]
    pub no_progress: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so `--output -`
/// keeps stdout clean.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docmirror=info",
        1 => "docmirror=debug",
        _ => "docmirror=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Run(args) => cmd_run(args).await,
        Command::Urls { sitemap, prefix } => cmd_urls(&sitemap, prefix).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Settings resolution
// ---------------------------------------------------------------------------

/// Effective settings for a run: CLI flags over config file over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RunSettings {
    prefix: String,
    output: String,
    timeout_secs: u64,
}

impl RunSettings {
    fn resolve(
        config: &AppConfig,
        prefix: Option<String>,
        output: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            prefix: prefix.unwrap_or_else(|| config.defaults.prefix.clone()),
            output: output.unwrap_or_else(|| config.defaults.output.clone()),
            timeout_secs: timeout_secs.unwrap_or(config.defaults.timeout_secs),
        }
    }

    fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            prefix: self.prefix.clone(),
            timeout_secs: self.timeout_secs,
        }
    }

    fn writes_to_stdout(&self) -> bool {
        self.output == STDIO_ARG
    }
}

/// Where the sitemap bytes come from. An upload is persisted to a temp file
/// that lives as long as this value.
enum SitemapSource {
    File(PathBuf),
    Upload(TempPath),
}

impl SitemapSource {
    async fn open(arg: &str) -> Result<Self> {
        if arg != STDIO_ARG {
            return Ok(Self::File(PathBuf::from(arg)));
        }

        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| eyre!("failed to read sitemap from stdin: {e}"))?;
        info!(bytes = bytes.len(), "read sitemap from stdin");

        Ok(Self::Upload(docmirror_discovery::persist_upload(&bytes)?))
    }

    fn path(&self) -> &Path {
        match self {
            Self::File(path) => path.as_path(),
            Self::Upload(temp) => temp,
        }
    }

    fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Upload(_) => "<stdin>".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(args: RunArgs) -> Result<ExitCode> {
    let config = load_config()?;
    let settings = RunSettings::resolve(&config, args.prefix, args.output, args.timeout);
    let opts = settings.batch_options();

    let source = SitemapSource::open(&args.sitemap).await?;
    let converter = HttpPageConverter::new(opts.timeout_secs)?;

    let cancel = CancelFlag::new();
    cancel_on_ctrl_c(cancel.clone());
    let progress = CliProgress::new(cancel, !args.no_progress)?;

    info!(
        sitemap = %source.label(),
        prefix = %opts.prefix,
        output = %settings.output,
        timeout_secs = opts.timeout_secs,
        "starting run"
    );

    let started_at = Utc::now();
    let outcome = pipeline::run(source.path(), &opts, &converter, &progress).await;
    progress.finish();

    let report = match outcome? {
        BatchOutcome::NoMatchingUrls { prefix, total_urls } => {
            warn!(%prefix, total_urls, "no URLs matched, nothing written");
            eprintln!("No URLs in the sitemap ({total_urls} total) start with '{prefix}'.");
            return Ok(ExitCode::FAILURE);
        }
        BatchOutcome::Completed(report) => report,
    };

    if settings.writes_to_stdout() {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(report.document.as_str().as_bytes())?;
        stdout.flush()?;
    } else {
        write_document(Path::new(&settings.output), &report.document)?;
    }

    if let Some(path) = &args.report {
        let summary = report.summary(&source.label(), &opts.prefix, started_at);
        write_report(path, &summary)?;
        info!(path = %path.display(), "run report written");
    }

    // Keep stdout for the document when it is being streamed there.
    let mut out: Box<dyn Write> = if settings.writes_to_stdout() {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };
    writeln!(out)?;
    if report.cancelled {
        writeln!(out, "  Run interrupted, partial document written.")?;
    } else {
        writeln!(out, "  Document written.")?;
    }
    writeln!(
        out,
        "  Pages:   {} of {} matched ({} ok, {} failed)",
        report.results.len(),
        report.matched_urls,
        report.succeeded(),
        report.failed()
    )?;
    writeln!(out, "  Sitemap: {} URLs", report.total_urls)?;
    writeln!(out, "  Output:  {}", settings.output)?;
    writeln!(out, "  Time:    {:.1}s", report.elapsed.as_secs_f64())?;
    writeln!(out)?;

    Ok(ExitCode::SUCCESS)
}

async fn cmd_urls(sitemap: &str, prefix: Option<String>) -> Result<ExitCode> {
    let config = load_config()?;
    let prefix = prefix.unwrap_or(config.defaults.prefix);

    let source = SitemapSource::open(sitemap).await?;
    let urls = docmirror_discovery::parse_sitemap(source.path())?;
    let matched = pipeline::filter_by_prefix(&urls, &prefix);

    info!(total = urls.len(), matched = matched.len(), %prefix, "filtered sitemap");

    let mut stdout = std::io::stdout().lock();
    for url in &matched {
        writeln!(stdout, "{url}")?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_config_init() -> Result<ExitCode> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(ExitCode::SUCCESS)
}

async fn cmd_config_show() -> Result<ExitCode> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(ExitCode::SUCCESS)
}

/// Exit status for a run aborted by a second Ctrl-C (128 + SIGINT).
const FORCED_EXIT_CODE: i32 = 130;

/// Set `cancel` on the first Ctrl-C so the in-flight page still completes;
/// a second Ctrl-C exits immediately without writing anything.
fn cancel_on_ctrl_c(cancel: CancelFlag) {
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, &cancel).await {
            eprintln!("Interrupted again, exiting without writing output.");
            std::process::exit(FORCED_EXIT_CODE);
        }
    });
}

/// Wait for interrupts from `next`. The first one sets `cancel`; returns
/// `true` once a second one arrives, `false` if the signal source fails.
async fn watch_interrupts<F, Fut>(mut next: F, cancel: &CancelFlag) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if next().await.is_err() {
        return false;
    }
    warn!("interrupt received, stopping after the current page (Ctrl-C again to quit now)");
    cancel.cancel();

    next().await.is_ok()
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
    cancel: CancelFlag,
}

impl CliProgress {
    fn new(cancel: CancelFlag, visible: bool) -> Result<Self> {
        let bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> ")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { bar, cancel })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, state: &BatchState) {
        match state {
            BatchState::Fetching { total, .. } => self.bar.set_length(*total as u64),
            other => self.bar.set_message(other.to_string()),
        }
    }

    fn page_started(&self, url: &str, _index: usize, _total: usize) {
        self.bar.set_message(url.to_string());
    }

    fn page_finished(&self, result: &PageResult, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
        if let PageResult::Failure { url, .. } = result {
            self.bar.println(format!("  failed: {url}"));
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
