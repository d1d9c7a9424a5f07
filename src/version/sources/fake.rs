//! In-memory release source for tests and dry runs

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::version::error::SourceError;
use crate::version::release::Release;
use crate::version::source::ReleaseSource;

#[derive(Debug, Clone)]
enum FakeResponse {
    Releases(Vec<Release>),
    Error(String),
}

#[derive(Debug, Default)]
struct FakeState {
    responses: HashMap<String, FakeResponse>,
    calls: HashMap<String, usize>,
}

/// Release source serving canned responses per repository.
///
/// Unknown repositories fail with a fetch error. Every call is counted so tests
/// can assert how often the upstream would have been hit.
#[derive(Debug, Default)]
pub struct FakeSource {
    state: Mutex<FakeState>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_releases(self, repository: &str, releases: Vec<Release>) -> Self {
        self.set_releases(repository, releases);
        self
    }

    pub fn with_error(self, repository: &str, reason: &str) -> Self {
        self.set_error(repository, reason);
        self
    }

    /// Replace the releases served for a repository
    pub fn set_releases(&self, repository: &str, releases: Vec<Release>) {
        self.lock()
            .responses
            .insert(repository.to_string(), FakeResponse::Releases(releases));
    }

    /// Make every subsequent fetch for a repository fail
    pub fn set_error(&self, repository: &str, reason: &str) {
        self.lock()
            .responses
            .insert(repository.to_string(), FakeResponse::Error(reason.to_string()));
    }

    /// Total number of fetches across all repositories
    pub fn calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Number of fetches for one repository
    pub fn calls_for(&self, repository: &str) -> usize {
        self.lock().calls.get(repository).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl ReleaseSource for FakeSource {
    async fn fetch_releases(&self, repository: &str) -> Result<Vec<Release>, SourceError> {
        let mut state = self.lock();
        *state.calls.entry(repository.to_string()).or_default() += 1;

        match state.responses.get(repository) {
            Some(FakeResponse::Releases(releases)) => Ok(releases.clone()),
            Some(FakeResponse::Error(reason)) => Err(SourceError::fetch_failed(repository, reason)),
            None => Err(SourceError::fetch_failed(repository, "repository not found")),
        }
    }
}
