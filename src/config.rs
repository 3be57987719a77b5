//! Credential and configuration handling.
//!
//! The backup tool takes its GitHub credentials from the command line first
//! and falls back to a YAML credentials file for any field the command line
//! left out. The companion checker reads a separate YAML file with the
//! statusdb and SNIC account-registry credentials.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ConfigError;

/// File looked up under `$HOME` before `$GITHUBBACKUP_CREDS` is consulted.
pub const CREDENTIALS_FILE_NAME: &str = ".githubbackup_creds.yaml";

/// Environment variable naming an alternative credentials file path.
pub const CREDENTIALS_PATH_ENV: &str = "GITHUBBACKUP_CREDS";

/// Effective GitHub account credentials for one run.
///
/// A missing password restricts the run to public repositories; private
/// ones will fail to clone, which is expected rather than an error.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

/// On-disk shape of the credentials file.
#[derive(Debug, Default, Clone, Deserialize)]
struct CredentialsFile {
    github_username: Option<String>,
    github_password: Option<String>,
}

impl Credentials {
    /// Resolve effective credentials from CLI arguments, filling missing
    /// fields from the credentials file.
    ///
    /// The file is only required when the username cannot be resolved any
    /// other way; a parse error in an existing file is always fatal.
    pub fn resolve(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Self {
                username,
                password: Some(password),
            }),
            (username, password) => {
                let file = match Self::locate_file() {
                    Some(path) => Some(Self::parse_file(&path)?),
                    None => None,
                };

                Self::merge(username, password, file)
            }
        }
    }

    /// Merge CLI-supplied fields with the file contents. CLI always wins.
    fn merge(
        username: Option<String>,
        password: Option<String>,
        file: Option<CredentialsFile>,
    ) -> Result<Self, ConfigError> {
        match file {
            Some(file) => {
                let username = username
                    .or(file.github_username)
                    .ok_or(ConfigError::MissingUsername)?;
                Ok(Self {
                    username,
                    password: password.or(file.github_password),
                })
            }
            None => match username {
                Some(username) => Ok(Self { username, password }),
                None => Err(ConfigError::NotFound),
            },
        }
    }

    /// Find the credentials file: the fixed home-directory path first, then
    /// the path named by `$GITHUBBACKUP_CREDS`.
    fn locate_file() -> Option<PathBuf> {
        if let Some(home) = dirs::home_dir() {
            let candidate = home.join(CREDENTIALS_FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        env::var_os(CREDENTIALS_PATH_ENV).map(PathBuf::from)
    }

    fn parse_file(path: &Path) -> Result<CredentialsFile, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Configuration for the statusdb/SNIC checker.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckerConfig {
    pub statusdb: StatusDbConfig,
    #[serde(rename = "SNIC")]
    pub snic: RegistryConfig,
}

/// Connection settings for the statusdb CouchDB instance.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusDbConfig {
    pub username: String,
    pub password: String,
    pub url: String,
    pub port: u16,
}

/// Credentials for the SNIC account-registry API.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub username: String,
    pub password: String,
}

impl CheckerConfig {
    /// Load checker configuration from a specific file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
