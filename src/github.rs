//! GitHub repository enumeration.
//!
//! With a password the listing is authenticated and covers every repository
//! visible to the account, private ones included. Without a password, or
//! when the authenticated listing comes back empty, the enumerator falls
//! back to the unauthenticated per-user listing of public repositories.

use octocrab::models::Repository;
use octocrab::{Octocrab, Page};
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::EnumerationError;

/// Everything the synchronizer needs to know about one repository.
///
/// Produced transiently from the remote listing and consumed per iteration;
/// never stored.
#[derive(Debug, Clone)]
pub struct RepoDescriptor {
    pub name: String,
    pub clone_url: String,
    pub private: bool,
    pub default_branch: Option<String>,
}

/// GitHub client wrapper around the account listing endpoints.
pub struct GitHubClient {
    client: Octocrab,
    credentials: Credentials,
}

impl GitHubClient {
    /// Create a client for the given credentials. Basic auth is attached
    /// only when a password is present.
    pub fn new(credentials: &Credentials) -> Result<Self, EnumerationError> {
        let mut builder = Octocrab::builder();

        if let Some(password) = &credentials.password {
            builder = builder.basic_auth(credentials.username.clone(), password.clone());
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            credentials: credentials.clone(),
        })
    }

    /// Like [`GitHubClient::new`] but pointed at an alternative API root.
    pub fn with_base_uri(
        credentials: &Credentials,
        base_uri: &str,
    ) -> Result<Self, EnumerationError> {
        let mut builder = Octocrab::builder().base_uri(base_uri)?;

        if let Some(password) = &credentials.password {
            builder = builder.basic_auth(credentials.username.clone(), password.clone());
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            credentials: credentials.clone(),
        })
    }

    /// List the repositories visible to the account, in API order.
    ///
    /// Any listing failure is fatal for the run; there is no per-page
    /// recovery.
    pub async fn list_repositories(&self) -> Result<Vec<RepoDescriptor>, EnumerationError> {
        if self.credentials.password.is_some() {
            let repos = self.list_authenticated().await?;
            if !repos.is_empty() {
                info!(
                    "Listed {} repositories for authenticated user {}",
                    repos.len(),
                    self.credentials.username
                );
                return Ok(repos.into_iter().map(to_descriptor).collect());
            }
        }

        info!("No valid github credentials provided. Private repos will not be copied!");
        let repos = self.list_public().await?;
        info!(
            "Listed {} public repositories for user {}",
            repos.len(),
            self.credentials.username
        );

        Ok(repos.into_iter().map(to_descriptor).collect())
    }

    /// Authenticated listing: everything the account can see.
    async fn list_authenticated(&self) -> Result<Vec<Repository>, EnumerationError> {
        debug!(
            "Fetching repositories for authenticated user: {}",
            self.credentials.username
        );

        let mut repositories = Vec::new();
        let mut page = 1u8;

        loop {
            let page_repos = self
                .client
                .current()
                .list_repos_for_authenticated_user()
                .per_page(100)
                .page(page)
                .send()
                .await?;

            let items = page_repos.items;
            if items.is_empty() {
                break;
            }

            repositories.extend(items);

            // GitHub API pagination limit for u8
            if page == u8::MAX {
                warn!("Reached maximum pagination limit (255 pages)");
                break;
            }
            page += 1;
        }

        Ok(repositories)
    }

    /// Unauthenticated listing scoped to the username: public repos only.
    async fn list_public(&self) -> Result<Vec<Repository>, EnumerationError> {
        debug!(
            "Fetching public repositories for user: {}",
            self.credentials.username
        );

        let route = format!("/users/{}/repos?per_page=100", self.credentials.username);
        let mut page: Page<Repository> = self.client.get(&route, None::<&()>).await?;

        let mut repositories = page.take_items();
        while let Some(mut next) = self.client.get_page::<Repository>(&page.next).await? {
            repositories.extend(next.take_items());
            page = next;
        }

        Ok(repositories)
    }
}

/// Convert an API repository into the descriptor the synchronizer consumes.
fn to_descriptor(repo: Repository) -> RepoDescriptor {
    let clone_url = repo
        .clone_url
        .as_ref()
        .map(|url| url.to_string())
        .unwrap_or_else(|| {
            format!(
                "https://github.com/{}.git",
                repo.full_name.as_deref().unwrap_or(&repo.name)
            )
        });

    RepoDescriptor {
        clone_url,
        private: repo.private.unwrap_or(false),
        default_branch: repo.default_branch.clone(),
        name: repo.name,
    }
}
