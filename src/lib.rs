//! githubbackup - GitHub account backup and archival tool
//!
//! Mirrors every repository visible to a GitHub account into a destination
//! directory and bundles the result into a timestamped tar.gz archive.
//! Synchronization is idempotent: existing working copies are updated,
//! missing ones are cloned with a tracking branch per remote branch, and a
//! second run against a partially populated destination converges instead
//! of duplicating work.
//!
//! ## Core Features
//!
//! - **Repository enumeration**: authenticated listing of all repositories,
//!   with fallback to the public listing when no credentials work
//! - **Forgiving synchronization**: one repository's failure never aborts
//!   the run; failures are logged, counted and reported in a final summary
//! - **Archival**: the destination directory becomes a single timestamped
//!   compressed artifact, relocated to a fixed archive directory
//! - **Credentials**: CLI arguments merged with a YAML credentials file
//!
//! The crate also carries the companion `snic-checker` binary, which
//! verifies project PI emails against the SNIC account registry and writes
//! the verdicts back into statusdb.
//!
//! ## Modules
//!
//! - [`config`]: credentials and checker configuration
//! - [`github`]: repository enumeration
//! - [`git`]: per-repository git operations
//! - [`sync`]: the sequential backup engine
//! - [`archive`]: archive creation and relocation
//! - [`workdir`]: scoped working-directory changes

pub mod archive;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod snic;
pub mod statusdb;
pub mod sync;
pub mod workdir;

pub use archive::Archiver;
pub use config::{CheckerConfig, Credentials};
pub use error::{ArchiveError, ConfigError, EnumerationError, SyncError};
pub use git::GitClient;
pub use github::{GitHubClient, RepoDescriptor};
pub use snic::AccountRegistry;
pub use statusdb::StatusDbClient;
pub use sync::{BackupEngine, BackupSummary};
pub use workdir::ScopedDir;
