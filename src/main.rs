//! Site-Probe main entry point
//!
//! This is the command-line interface for the Site-Probe crawler.

use clap::{CommandFactory, Parser};
use site_probe::config::{load_config, validate, Config};
use site_probe::crawler::probe;
use site_probe::output::print_report;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Site-Probe: a concurrent same-origin site crawler
///
/// Site-Probe visits every page of a site reachable from the start URL,
/// collects navigation, script, console and request errors, and exits
/// non-zero if any were found.
#[derive(Parser, Debug)]
#[command(name = "site-probe")]
#[command(version)]
#[command(about = "Crawl a site and report page errors", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "START_URL")]
    start_url: Option<String>,

    /// Maximum link depth from the start URL
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Maximum number of pages visited at once
    #[arg(long, value_name = "N")]
    concurrency: Option<usize>,

    /// Run the fetcher without a visible window
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    headless: Option<bool>,

    /// Verbose logging; also reports failed sub-resource requests
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    verbose: Option<bool>,

    /// Log every link that was not followed, grouped by reason
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    log_skipped: Option<bool>,

    /// Visit only the start URL
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    single_page: Option<bool>,

    /// Log one status line per visited page
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    show_probe: Option<bool>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write per-page results as JSON to this file
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line flags on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(max_depth) = self.max_depth {
            config.crawler.max_depth = max_depth;
        }
        if let Some(concurrency) = self.concurrency {
            config.crawler.concurrency = concurrency;
        }
        if let Some(headless) = self.headless {
            config.browser.headless = headless;
        }
        if let Some(verbose) = self.verbose {
            config.reporting.verbose = verbose;
        }
        if let Some(log_skipped) = self.log_skipped {
            config.crawler.log_skipped = log_skipped;
        }
        if let Some(single_page) = self.single_page {
            config.crawler.single_page = single_page;
        }
        if let Some(show_probe) = self.show_probe {
            config.browser.show_probe = show_probe;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(start_url) = cli.start_url.clone() else {
        // Help goes to stdout; a failed write leaves nothing else to do
        let _ = Cli::command().print_help();
        return ExitCode::FAILURE;
    };

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load configuration from {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };
    cli.apply(&mut config);

    setup_logging(config.reporting.verbose);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    let report = match probe(config, &start_url).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    print_report(&report);

    if let Some(path) = &cli.output {
        match report.write_json(path) {
            Ok(()) => tracing::info!("Results written to {}", path.display()),
            Err(e) => {
                tracing::error!("Failed to write results to {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Sets up the logging/tracing subscriber
fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("site_probe=debug,info")
    } else {
        EnvFilter::new("site_probe=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
