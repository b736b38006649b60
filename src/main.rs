use anyhow::{Context, Result};
use clap::Parser;
use leetcode_archive::transport::DEFAULT_ENDPOINT;
use leetcode_archive::{
    run, write_index, CancelToken, ClientConfigBuilder, Language, LeetCodeClient, RetryConfig,
    SyncOptionsBuilder, SyncReport,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Archive your accepted LeetCode submissions into a directory tree.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Output directory
    #[arg(long, default_value = "leetcode")]
    output: PathBuf,

    /// Skip problems that already have a directory in the output
    #[arg(long)]
    sync: bool,

    /// Maximum number of submissions to fetch
    #[arg(long, default_value_t = 50)]
    limit: usize,

    /// Keep only accepted submissions (the default)
    #[arg(long, overrides_with = "no_only_accepted")]
    only_accepted: bool,

    /// Keep submissions of every status, not only accepted ones
    #[arg(long, overrides_with = "only_accepted")]
    no_only_accepted: bool,

    /// Languages to include, e.g. `cpp python3`
    #[arg(long, num_args = 1.., default_values_t = [Language::Python3])]
    languages: Vec<Language>,

    /// Include every known language
    #[arg(long, conflicts_with = "languages")]
    all_languages: bool,

    /// Value of the LEETCODE_SESSION cookie
    #[arg(long, env = "LEETCODE_SESSION", hide_env_values = true)]
    session: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Problems processed at the same time
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Requests allowed in flight at once
    #[arg(long, default_value_t = 1)]
    max_in_flight: usize,

    #[arg(long)]
    requests_per_second: Option<u32>,

    /// Retries for network failures (never for rejected requests)
    #[arg(long, default_value_t = 2)]
    max_retries: usize,

    /// Stop starting new problems after this many seconds
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let languages = if cli.all_languages {
        Language::all_keys()
    } else {
        cli.languages.iter().map(|l| l.to_string()).collect()
    };

    let client_config = ClientConfigBuilder::default()
        .endpoint(cli.endpoint.clone())
        .max_in_flight(cli.max_in_flight)
        .requests_per_second(cli.requests_per_second)
        .retry(RetryConfig {
            max_retries: cli.max_retries,
            ..RetryConfig::default()
        })
        .build()?;
    let client = LeetCodeClient::new(&client_config)?;

    let options = SyncOptionsBuilder::default()
        .base_dir(cli.output.clone())
        .max_submissions(cli.limit)
        .only_accepted(cli.only_accepted())
        .languages(languages.clone())
        .incremental(cli.sync)
        .concurrency(cli.concurrency)
        .timeout(cli.timeout.map(Duration::from_secs))
        .build()?;

    let cancel = CancelToken::new();
    install_ctrl_c(cancel.clone());

    println!("Fetching last {} submissions...", cli.limit);
    let report = run(&client, &cli.session, &options, &cancel)
        .await
        .context("failed to list submissions")?;

    finish(&mut std::io::stdout(), &report, &options.base_dir, &languages).await
}

impl Cli {
    fn only_accepted(&self) -> bool {
        self.only_accepted || !self.no_only_accepted
    }
}

/// Rewrite the index unless an interrupted run saved nothing, then report.
/// The report is printed even when the index cannot be written.
async fn finish(
    out: &mut impl Write,
    report: &SyncReport,
    base_dir: &Path,
    languages: &[String],
) -> Result<()> {
    let index = if report.should_write_index() {
        Some(write_index(base_dir, &report.summary, languages).await)
    } else {
        None
    };

    print_report(out, report)?;
    if let Some(index) = index {
        index.context("failed to write index")?;
    }
    Ok(())
}

/// First Ctrl+C lets in-flight problems finish; a second one exits at once.
fn install_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\nStopping after the problems in progress. Press Ctrl+C again to force quit.");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn print_report(out: &mut impl Write, report: &SyncReport) -> std::io::Result<()> {
    writeln!(out, "Retrieved {} submissions", report.retrieved)?;
    if !report.skipped_existing.is_empty() {
        writeln!(
            out,
            "Skipped {} problems already archived",
            report.skipped_existing.len()
        )?;
    }
    for failure in &report.failures {
        writeln!(out, "  {}: {}", failure.slug, failure.error)?;
    }
    for (slug, failure) in &report.submission_failures {
        writeln!(
            out,
            "  {} (submission {}): {}",
            slug, failure.submission_id, failure.error
        )?;
    }
    if let Some(reason) = report.interrupted {
        writeln!(
            out,
            "Run {reason}; {} problems not started",
            report.not_started.len()
        )?;
    }

    writeln!(out, "\nFinished. {} problems saved.", report.summary.len())?;
    if !report.failures.is_empty() {
        writeln!(out, "{} problems failed.", report.failures.len())?;
    }
    writeln!(out, "Total submissions downloaded: {}", report.submissions_written)
}
