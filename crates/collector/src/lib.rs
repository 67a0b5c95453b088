//! DevPulse Data Collectors
//!
//! Fetches profile, repository, organization and contribution data from
//! GitHub and its public contribution mirror.

pub mod contributions;
pub mod github;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod transport;

use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CollectorError>;

/// Prefixes of personal access tokens GitHub issues
pub const TOKEN_PREFIXES: [&str; 2] = ["ghp_", "github_pat_"];

/// Whether a credential looks like a GitHub personal access token
pub fn is_valid_token(token: &str) -> bool {
    TOKEN_PREFIXES.iter().any(|prefix| token.starts_with(prefix))
}

/// Append `segments` to `base` as percent-encoded path segments
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url =
        Url::parse(base).map_err(|e| CollectorError::Config(format!("{}: {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| CollectorError::Config(format!("{} cannot take a path", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Configuration for collectors
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub github_token: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
    pub page_size: usize,
    pub max_pages: usize,
    pub api_base: String,
    pub graphql_url: String,
    pub fallback_base: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            github_token: std::env::var("GITHUB_TOKEN").ok(),
            user_agent: "DevPulse/0.1 (https://github.com/devpulse/devpulse)".to_string(),
            timeout: Duration::from_secs(10),
            page_size: 100,
            max_pages: 50,
            api_base: "https://api.github.com".to_string(),
            graphql_url: "https://api.github.com/graphql".to_string(),
            fallback_base: "https://github-contributions-api.jogruber.de/v4".to_string(),
        }
    }
}

impl CollectorConfig {
    /// Config with no token and the public endpoints
    pub fn anonymous() -> Self {
        Self {
            github_token: None,
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.github_token = token;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Point every endpoint at one base URL (used against local stubs)
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.api_base = base.to_string();
        self.graphql_url = format!("{}/graphql", base);
        self.fallback_base = format!("{}/contributions", base);
        self
    }

    /// The configured token, if it is one GitHub would accept
    pub fn valid_token(&self) -> Option<&str> {
        self.github_token
            .as_deref()
            .map(str::trim)
            .filter(|token| is_valid_token(token))
    }
}
