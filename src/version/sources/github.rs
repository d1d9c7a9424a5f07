//! GitHub Releases API source implementation

use std::time::Duration;

use crate::config::FETCH_TIMEOUT;
use crate::version::error::SourceError;
use crate::version::release::Release;
use crate::version::source::ReleaseSource;
use tracing::{debug, warn};

/// Release source backed by the GitHub Releases API
pub struct GitHubSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubSource {
    /// Creates a new GitHubSource with a custom base URL
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self::with_timeout(base_url, token, FETCH_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("version-exporter")
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }
}

#[async_trait::async_trait]
impl ReleaseSource for GitHubSource {
    async fn fetch_releases(&self, repository: &str) -> Result<Vec<Release>, SourceError> {
        let url = format!("{}/repos/{}/releases", self.base_url, repository);
        debug!("Fetching releases from {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("token {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::fetch_failed(repository, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GitHub API returned status {}: {}", status, url);
            return Err(SourceError::fetch_failed(
                repository,
                format!("unexpected status: {}", status),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::fetch_failed(repository, e))?;

        serde_json::from_slice(&body).map_err(|e| {
            warn!("Failed to parse GitHub releases response: {}", e);
            SourceError::fetch_failed(repository, format!("invalid response body: {}", e))
        })
    }
}
