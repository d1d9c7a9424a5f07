//! Collection pass over all configured repositories

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::ConfigWatch;
use crate::version::cache::FreshnessCache;
use crate::version::constraint::Constraint;

/// Freshness of one repository's latest release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryStatus {
    pub repository: String,
    /// Constraint as written in the configuration
    pub constraint: String,
    /// Latest qualifying version, e.g. "0.1.1"
    pub latest: String,
    pub up_to_date: bool,
}

/// Snapshot produced by one collection pass
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionResult {
    /// One entry per repository with a qualifying release, in configuration order
    pub repositories: Vec<RepositoryStatus>,
    /// False if any repository failed during the pass
    pub success: bool,
    pub failed: usize,
    pub duration: Duration,
}

impl CollectionResult {
    pub fn status(&self, repository: &str) -> Option<&RepositoryStatus> {
        self.repositories.iter().find(|s| s.repository == repository)
    }
}

/// Runs collection passes against the current configuration.
///
/// Passes are serialized; a configuration reload does not wait for a pass in
/// progress, so that pass may still observe the previous configuration.
pub struct Collector {
    config: Arc<ConfigWatch>,
    cache: Arc<FreshnessCache>,
    pass: Mutex<()>,
}

impl Collector {
    pub fn new(config: Arc<ConfigWatch>, cache: Arc<FreshnessCache>) -> Self {
        Self {
            config,
            cache,
            pass: Mutex::new(()),
        }
    }

    /// Evaluate every configured repository once.
    ///
    /// Never fails: a repository whose constraint does not parse or whose
    /// releases cannot be fetched is logged and counted, and the remaining
    /// repositories are still evaluated.
    pub async fn collect(&self) -> CollectionResult {
        let _pass = self.pass.lock().await;
        let start = Instant::now();
        let config = self.config.snapshot();

        let mut repositories = Vec::with_capacity(config.repositories.len());
        let mut failed = 0;

        for (repository, expression) in &config.repositories {
            debug!(repository = %repository, "collecting");

            let constraint = match Constraint::parse(expression) {
                Ok(constraint) => constraint,
                Err(e) => {
                    error!(repository = %repository, "failed to collect: {}", e);
                    failed += 1;
                    continue;
                }
            };

            let latest = match self.cache.get_or_fetch(repository).await {
                Ok(Some(latest)) => latest,
                Ok(None) => {
                    debug!(repository = %repository, "no qualifying release");
                    continue;
                }
                Err(e) => {
                    error!(repository = %repository, "failed to collect: {}", e);
                    failed += 1;
                    continue;
                }
            };

            let up_to_date = constraint.check(&latest);
            debug!(
                repository = %repository,
                constraint = %constraint,
                latest = %latest,
                up_to_date,
                "checked"
            );

            repositories.push(RepositoryStatus {
                repository: repository.clone(),
                constraint: constraint.to_string(),
                latest: latest.to_string(),
                up_to_date,
            });
        }

        let duration = start.elapsed();
        info!(
            "Collected {} repositories ({} failed) in {:?}",
            config.repositories.len(),
            failed,
            duration
        );

        CollectionResult {
            repositories,
            success: failed == 0,
            failed,
            duration,
        }
    }
}
