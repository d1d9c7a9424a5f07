//! Release source trait for fetching a repository's releases

#[cfg(test)]
use mockall::automock;

use crate::version::error::SourceError;
use crate::version::release::Release;

/// Trait for fetching the releases of a repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches all releases for a repository
    ///
    /// # Arguments
    /// * `repository` - The repository identifier (e.g., "prometheus/prometheus")
    ///
    /// # Returns
    /// * `Ok(Vec<Release>)` - Releases, ordered from newest to oldest
    /// * `Err(SourceError)` - If the fetch fails or the response cannot be parsed
    async fn fetch_releases(&self, repository: &str) -> Result<Vec<Release>, SourceError>;
}
