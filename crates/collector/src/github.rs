//! GitHub REST API collector

use crate::transport::{ReqwestTransport, Transport};
use crate::{endpoint, CollectorConfig, Result};
use devpulse_model::{OrgMembership, Profile, RepoSummary};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// GitHub API client for account-level data
pub struct GithubCollector {
    transport: Arc<dyn Transport>,
    config: CollectorConfig,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    login: String,
    name: Option<String>,
    avatar_url: Option<String>,
    public_repos: u64,
    followers: u64,
    #[serde(default)]
    following: u64,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    #[serde(default)]
    name: String,
    stargazers_count: u64,
    forks_count: u64,
    fork: bool,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrgResponse {
    login: String,
    id: u64,
    #[serde(default)]
    avatar_url: String,
}

impl From<RepoResponse> for RepoSummary {
    fn from(repo: RepoResponse) -> Self {
        Self {
            name: repo.name,
            stargazers_count: repo.stargazers_count,
            forks_count: repo.forks_count,
            fork: repo.fork,
            language: repo.language.filter(|l| !l.is_empty()),
        }
    }
}

impl From<OrgResponse> for OrgMembership {
    fn from(org: OrgResponse) -> Self {
        Self {
            login: org.login,
            id: org.id,
            avatar_url: org.avatar_url,
        }
    }
}

impl GithubCollector {
    /// Create a new GitHub collector backed by `reqwest`
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: CollectorConfig, transport: Arc<dyn Transport>) -> Self {
        Self { transport, config }
    }

    /// Fetch account counters; `None` when the request or payload fails
    pub async fn load_profile(&self, account: &str) -> Option<Profile> {
        match self.fetch_profile(account).await {
            Ok(profile) => {
                debug!(account = account, repos = profile.public_repos, "Loaded profile");
                Some(profile)
            }
            Err(e) => {
                warn!(account = account, error = %e, "Failed to load profile");
                None
            }
        }
    }

    /// Fetch organization memberships; empty on failure
    pub async fn load_organizations(&self, account: &str) -> Vec<OrgMembership> {
        match self.fetch_organizations(account).await {
            Ok(orgs) => orgs,
            Err(e) => {
                warn!(account = account, error = %e, "Failed to load organizations");
                Vec::new()
            }
        }
    }

    /// Fetch every repository page by page.
    ///
    /// Stops at the first short or empty page, on the first failed page
    /// (keeping what was already collected), or after `max_pages` pages.
    pub async fn load_all_repositories(&self, account: &str) -> Vec<RepoSummary> {
        let mut repos = Vec::new();

        for page in 1..=self.config.max_pages {
            let batch = match self.fetch_repo_page(account, page).await {
                Ok(batch) => batch,
                Err(e) => {
                    warn!(
                        account = account,
                        page = page,
                        collected = repos.len(),
                        error = %e,
                        "Repository page failed, keeping partial list"
                    );
                    return repos;
                }
            };

            let received = batch.len();
            repos.extend(batch);

            if received < self.config.page_size {
                info!(account = account, pages = page, count = repos.len(), "Loaded repositories");
                return repos;
            }
        }

        warn!(
            account = account,
            max_pages = self.config.max_pages,
            count = repos.len(),
            "Repository pagination reached page cap"
        );
        repos
    }

    async fn fetch_profile(&self, account: &str) -> Result<Profile> {
        let url = endpoint(&self.config.api_base, &["users", account])?;
        let body = self.transport.get(url.as_str(), self.config.valid_token()).await?;
        let profile: ProfileResponse = serde_json::from_str(&body)?;

        Ok(Profile {
            login: if profile.login.is_empty() {
                account.to_string()
            } else {
                profile.login
            },
            name: profile.name,
            avatar_url: profile.avatar_url,
            public_repos: profile.public_repos,
            followers: profile.followers,
            following: profile.following,
        })
    }

    async fn fetch_organizations(&self, account: &str) -> Result<Vec<OrgMembership>> {
        let url = endpoint(&self.config.api_base, &["users", account, "orgs"])?;
        let body = self.transport.get(url.as_str(), self.config.valid_token()).await?;
        let orgs: Vec<OrgResponse> = serde_json::from_str(&body)?;
        Ok(orgs.into_iter().map(OrgMembership::from).collect())
    }

    async fn fetch_repo_page(&self, account: &str, page: usize) -> Result<Vec<RepoSummary>> {
        let mut url = endpoint(&self.config.api_base, &["users", account, "repos"])?;
        url.query_pairs_mut()
            .append_pair("per_page", &self.config.page_size.to_string())
            .append_pair("page", &page.to_string());
        let body = self.transport.get(url.as_str(), self.config.valid_token()).await?;
        let repos: Vec<RepoResponse> = serde_json::from_str(&body)?;
        Ok(repos.into_iter().map(RepoSummary::from).collect())
    }
}
