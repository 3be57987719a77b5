use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use githubbackup::{Archiver, BackupEngine, Credentials, GitHubClient};

/// Log file written next to wherever the tool is run from, mirroring the
/// console output.
const LOG_FILE_NAME: &str = "githubbackup.log";

#[derive(Parser)]
#[command(name = "githubbackup")]
#[command(version)]
#[command(about = "Clones all the repositories from a GitHub account. \
Restricted to public ones if no password is given; uses the credentials \
file ~/.githubbackup_creds.yaml when no user/password is provided.")]
struct Cli {
    /// GitHub username
    username: Option<String>,

    /// GitHub password or personal access token
    password: Option<String>,

    /// Destination of the copy (defaults to the current directory)
    #[arg(short = 'd', long = "dest", value_name = "PATH")]
    dest: Option<String>,

    /// Directory the finished archive is moved to
    #[arg(long, value_name = "PATH")]
    archive_dir: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose)?;
    info!("Starting githubbackup v{}", env!("CARGO_PKG_VERSION"));

    // Configuration errors abort before any work begins.
    let credentials = Credentials::resolve(cli.username, cli.password)?;

    let dest = match cli.dest {
        Some(dest) => expand_path(&dest)?,
        None => std::env::current_dir().context("Failed to get current working directory")?,
    };
    let archive_dir = match cli.archive_dir {
        Some(dir) => expand_path(&dir)?,
        None => default_archive_dir(),
    };

    std::fs::create_dir_all(&dest)
        .with_context(|| format!("Failed to create destination directory: {:?}", dest))?;

    info!(
        "Creating backup at {}, with github user {}",
        dest.display(),
        credentials.username
    );

    // Enumeration failure is fatal for the run.
    let client = GitHubClient::new(&credentials)?;
    let repos = client.list_repositories().await?;

    let engine = BackupEngine::new(credentials, dest.clone());
    let summary = engine.run(&repos).await;

    info!(
        "Backed up {} repositories in {:.2}s: {} cloned, {} updated, {} failed",
        summary.total,
        summary.duration.as_secs_f64(),
        summary.cloned,
        summary.updated,
        summary.failed
    );
    for failure in &summary.failures {
        warn!("  failed: {}: {}", failure.repo, failure.reason);
    }

    // Archival failures are logged inside; the run completes regardless and
    // the process still exits 0, matching the documented contract.
    let archiver = Archiver::new(archive_dir);
    archiver.run(&dest);

    Ok(())
}

/// Initialize logging: console plus the line-structured log file, both
/// carrying the same records. The returned guard must stay alive for the
/// file writer to flush.
fn init_logging(verbose: bool) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let file_appender = tracing_appender::rolling::never(".", LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

/// Expand `~` and environment variables in a user-supplied path.
fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(raw)
        .with_context(|| format!("Failed to expand path: {}", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Fixed archive storage location used when none is given on the command
/// line.
fn default_archive_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("githubbackup").join("archives"))
        .unwrap_or_else(|| PathBuf::from("archives"))
}
