//! Site-Mirror main entry point
//!
//! This is the command-line interface for Site-Mirror: single-file downloads,
//! batch downloads from a URL list, and recursive website mirroring.

use anyhow::Context;
use clap::Parser;
use site_mirror::config::{
    load_config, split_list, validate_download_config, DownloadConfig, FileConfig, MirrorConfig,
};
use site_mirror::crawler::mirror;
use site_mirror::download::{download_file, download_from_file};
use site_mirror::output::print_summary;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file used in background mode
const LOG_FILE: &str = "wget-log";

/// Site-Mirror: download files and mirror websites for offline browsing
///
/// Without `--mirror` the URL is downloaded as a single file. With `-i` every
/// URL listed in the file is downloaded concurrently. With `--mirror` the
/// site is crawled level by level and saved under a directory named after
/// its host.
#[derive(Parser, Debug)]
#[command(name = "site-mirror")]
#[command(version)]
#[command(about = "Download files and mirror websites for offline browsing", long_about = None)]
struct Cli {
    /// URL to download or mirror
    #[arg(value_name = "URL", required_unless_present = "input_file")]
    url: Option<String>,

    /// Save the file under a different name
    #[arg(short = 'O', value_name = "NAME")]
    output_name: Option<String>,

    /// Save into this directory (`~/` is expanded)
    #[arg(short = 'P', value_name = "DIR")]
    output_path: Option<PathBuf>,

    /// Limit the download rate, e.g. 400k or 2M
    #[arg(long, value_name = "RATE")]
    rate_limit: Option<String>,

    /// Write all output to wget-log instead of the terminal
    #[arg(short = 'B')]
    background: bool,

    /// Download every URL listed in FILE
    #[arg(short = 'i', value_name = "FILE", conflicts_with = "url")]
    input_file: Option<PathBuf>,

    /// Mirror the whole website
    #[arg(long)]
    mirror: bool,

    /// Reject URLs containing any of these comma-separated substrings
    #[arg(short = 'R', long, value_name = "LIST", requires = "mirror")]
    reject: Option<String>,

    /// Exclude URLs containing any of these comma-separated paths
    #[arg(short = 'X', long, value_name = "LIST", requires = "mirror")]
    exclude: Option<String>,

    /// Convert links for offline viewing after mirroring
    #[arg(long, requires = "mirror")]
    convert_links: bool,

    /// Number of depth levels to mirror
    #[arg(long, value_name = "N", requires = "mirror")]
    max_depth: Option<usize>,

    /// Maximum number of files to save when mirroring
    #[arg(long, value_name = "N", requires = "mirror")]
    max_files: Option<usize>,

    /// Concurrent fetches within a depth level
    #[arg(long, value_name = "N", requires = "mirror")]
    concurrency: Option<usize>,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity and background mode
    setup_logging(cli.verbose, cli.quiet, cli.background)?;

    let file_config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    if let Some(input_file) = &cli.input_file {
        handle_batch(&cli, input_file, file_config.download).await
    } else if cli.mirror {
        handle_mirror(&cli, file_config.mirror).await
    } else {
        handle_download(&cli, file_config.download).await
    }
}

/// Sets up the logging/tracing subscriber
///
/// `RUST_LOG` takes precedence over the verbosity flags. In background mode
/// everything goes to `wget-log` (appended) after a one-line notice.
fn setup_logging(verbose: u8, quiet: bool, background: bool) -> anyhow::Result<()> {
    let default_filter = if quiet {
        // Only show errors
        "error"
    } else {
        match verbose {
            0 => "site_mirror=info,warn",
            1 => "site_mirror=debug,info",
            2 => "site_mirror=trace,debug",
            _ => "trace",
        }
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    if background {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_FILE)
            .with_context(|| format!("failed to open log file {}", LOG_FILE))?;

        println!("Output will be written to \"{}\".", LOG_FILE);
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else {
        builder.init();
    }

    Ok(())
}

fn required_url(cli: &Cli) -> anyhow::Result<&str> {
    cli.url
        .as_deref()
        .context("a URL or an input file (-i) is required")
}

/// Applies command-line overrides to the file's mirror settings
fn mirror_config(cli: &Cli, mut config: MirrorConfig) -> MirrorConfig {
    if let Some(reject) = &cli.reject {
        config.reject = split_list(reject);
    }
    if let Some(exclude) = &cli.exclude {
        config.exclude = split_list(exclude);
    }
    if cli.convert_links {
        config.convert_links = true;
    }
    if let Some(path) = &cli.output_path {
        config.output_path = Some(path.clone());
    }
    if let Some(rate) = &cli.rate_limit {
        config.rate_limit = rate.clone();
    }
    if let Some(max_depth) = cli.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(max_files) = cli.max_files {
        config.max_files = max_files;
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    config
}

/// Applies command-line overrides to the file's download settings
fn download_config(cli: &Cli, mut config: DownloadConfig) -> anyhow::Result<DownloadConfig> {
    if let Some(name) = &cli.output_name {
        config.output_name = Some(name.clone());
    }
    if let Some(path) = &cli.output_path {
        config.output_path = Some(path.clone());
    }
    if let Some(rate) = &cli.rate_limit {
        config.rate_limit = rate.clone();
    }
    config.show_progress = !cli.background && !cli.quiet;

    validate_download_config(&config)?;
    Ok(config)
}

/// Handles `--mirror`
async fn handle_mirror(cli: &Cli, config: MirrorConfig) -> anyhow::Result<()> {
    let url = required_url(cli)?;
    let config = mirror_config(cli, config);

    tracing::info!(
        "Max depth: {}, max files: {}, concurrency: {}",
        config.max_depth,
        config.max_files,
        config.concurrency
    );

    let summary = mirror(url, config)
        .await
        .with_context(|| format!("failed to mirror {}", url))?;

    if !cli.background && !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Handles `-i FILE`
async fn handle_batch(
    cli: &Cli,
    input_file: &std::path::Path,
    config: DownloadConfig,
) -> anyhow::Result<()> {
    let config = download_config(cli, config)?;
    if config.output_name.is_some() {
        tracing::warn!("-O is ignored for batch downloads");
    }

    download_from_file(input_file, &config).await?;
    Ok(())
}

/// Handles a plain single-file download
async fn handle_download(cli: &Cli, config: DownloadConfig) -> anyhow::Result<()> {
    let url = required_url(cli)?;
    let config = download_config(cli, config)?;

    download_file(url, &config).await?;
    Ok(())
}
