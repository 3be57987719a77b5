//! Backup engine - sequences repository synchronization.
//!
//! Repositories are processed strictly one at a time, in enumeration order.
//! A failure in one repository is logged and counted but never aborts the
//! run; the only shared state between iterations is the process working
//! directory, which the git layer guards.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::config::Credentials;
use crate::git::{effective_clone_url, GitClient};
use crate::github::RepoDescriptor;

/// One repository that could not be synchronized.
#[derive(Debug, Clone)]
pub struct RepoFailure {
    pub repo: String,
    pub reason: String,
}

/// Outcome of a complete backup run.
#[derive(Debug)]
pub struct BackupSummary {
    pub total: usize,
    pub cloned: usize,
    pub updated: usize,
    pub failed: usize,
    pub failures: Vec<RepoFailure>,
    pub duration: Duration,
}

impl BackupSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Sequences the per-repository synchronization steps.
pub struct BackupEngine {
    credentials: Credentials,
    git: GitClient,
}

impl BackupEngine {
    pub fn new(credentials: Credentials, destination: PathBuf) -> Self {
        Self {
            credentials,
            git: GitClient::new(destination),
        }
    }

    /// Mirror every repository into the destination directory.
    ///
    /// Existing working copies are updated (stash, then pull); missing ones
    /// are cloned and get a tracking branch per remote branch. Failures are
    /// logged, counted and skipped.
    pub async fn run(&self, repos: &[RepoDescriptor]) -> BackupSummary {
        let start = Instant::now();

        let mut cloned = 0;
        let mut updated = 0;
        let mut failures = Vec::new();

        for repo in repos {
            info!("Backing up repository {}", repo.name);

            let path = self.git.repo_path(&repo.name);
            if path.exists() {
                info!(
                    "The repository {} already exists on destination. Pulling all branches",
                    repo.name
                );

                match self.git.update_repository(repo).await {
                    Ok(()) => {
                        updated += 1;
                        info!("Finished copying repo {}", repo.name);
                    }
                    Err(e) => {
                        error!(
                            "There was an error fetching the branches from the repository {}, skipping it",
                            repo.name
                        );
                        failures.push(RepoFailure {
                            repo: repo.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            } else {
                info!(
                    "The repository {} isn't cloned at {}, cloning instead of updating...",
                    repo.name,
                    path.display()
                );

                let source = effective_clone_url(repo, &self.credentials);
                let mut failure: Option<RepoFailure> = None;

                if let Err(e) = self.git.clone_repository(repo, &source).await {
                    error!("Problem cloning repository {}, skipping it", repo.name);
                    failure = Some(RepoFailure {
                        repo: repo.name.clone(),
                        reason: e.to_string(),
                    });
                }

                // The clone may have partially succeeded on an earlier run;
                // branch tracking is attempted either way.
                if let Err(e) = self.git.track_remote_branches(repo).await {
                    error!(
                        "Problem fetching branches for repository {}, skipping it",
                        repo.name
                    );
                    failure.get_or_insert(RepoFailure {
                        repo: repo.name.clone(),
                        reason: e.to_string(),
                    });
                }

                match failure {
                    Some(failure) => failures.push(failure),
                    None => {
                        cloned += 1;
                        info!("Finished copying repo {}", repo.name);
                    }
                }
            }
        }

        BackupSummary {
            total: repos.len(),
            cloned,
            updated,
            failed: failures.len(),
            failures,
            duration: start.elapsed(),
        }
    }
}
