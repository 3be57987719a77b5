//! Error types for the backup workflow.
//!
//! Each stage of the run has its own error type derived with `thiserror`.
//! Which of them are fatal is a caller decision: configuration and
//! enumeration errors abort the run before or at the listing stage, while
//! per-repository and archival errors are logged and the run continues.

use std::path::PathBuf;

use thiserror::Error;

/// Errors resolving account credentials. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither CLI arguments nor a credentials file could supply a username.
    #[error("no credentials file found: checked ~/.githubbackup_creds.yaml and $GITHUBBACKUP_CREDS")]
    NotFound,

    #[error("failed to read credentials file '{path}'")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credentials file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// CLI arguments and the credentials file together left no username.
    #[error("github username missing: pass it on the command line or set github_username in the credentials file")]
    MissingUsername,
}

/// Errors listing the repositories visible to an account. Fatal for the run.
#[derive(Debug, Error)]
pub enum EnumerationError {
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),
}

/// Per-repository synchronization errors. Logged and skipped, never fatal.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A git subcommand exited with a non-zero status.
    #[error("git {operation} failed for repository '{repo}': {stderr}")]
    Git {
        repo: String,
        operation: &'static str,
        stderr: String,
    },

    /// The git binary could not be executed at all.
    #[error("could not run git for repository '{repo}': {source}")]
    Spawn {
        repo: String,
        #[source]
        source: std::io::Error,
    },

    /// The local working copy could not be entered.
    #[error("could not enter working copy of repository '{repo}': {source}")]
    EnterWorkdir {
        repo: String,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Name of the repository the error belongs to.
    pub fn repo(&self) -> &str {
        match self {
            SyncError::Git { repo, .. }
            | SyncError::Spawn { repo, .. }
            | SyncError::EnterWorkdir { repo, .. } => repo,
        }
    }
}

/// Errors producing or relocating the archive artifact. Logged, never fatal.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to compress '{source_dir}' into an archive")]
    Compress {
        source_dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move backup archive to '{dest}'")]
    Relocate {
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
