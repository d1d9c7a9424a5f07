use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use semver::Version;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::version::error::SourceError;
use crate::version::resolver::resolve_latest;
use crate::version::source::ReleaseSource;

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Resolved latest version; `None` records that no release qualified
    latest: Option<Version>,
    inserted_at: Instant,
}

/// Time-bounded memoization of the latest qualifying version per repository.
///
/// Bounds upstream calls to one per TTL window per repository regardless of
/// how often metrics are scraped.
pub struct FreshnessCache {
    source: Arc<dyn ReleaseSource>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Bumped on every flush; fetches started under an older generation are not stored
    generation: AtomicU64,
}

impl FreshnessCache {
    pub fn new(source: Arc<dyn ReleaseSource>, ttl: Duration) -> Self {
        info!("Initializing release cache with ttl {:?}", ttl);
        Self {
            source,
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Return the latest qualifying version for a repository, fetching on miss or expiry.
    ///
    /// `Ok(None)` means the repository has no qualifying release; that outcome is
    /// cached like any other. Fetch errors are returned and never cached.
    pub async fn get_or_fetch(&self, repository: &str) -> Result<Option<Version>, SourceError> {
        if let Some(latest) = self.lookup(repository) {
            debug!(repository, "using result from cache");
            return Ok(latest);
        }

        let generation = self.generation.load(Ordering::Acquire);
        info!(repository, "refreshing");
        let releases = self.source.fetch_releases(repository).await?;
        let latest = resolve_latest(&releases);
        debug!(
            repository,
            releases = releases.len(),
            latest = ?latest.as_ref().map(|v| v.to_string()),
            "resolved latest release"
        );

        self.store(repository, latest.clone(), generation);
        Ok(latest)
    }

    /// Discard every entry; the next lookup for any repository re-fetches.
    pub fn flush(&self) {
        let mut entries = self.write_entries();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let flushed = entries.len();
        entries.clear();
        info!("Flushed {} cached entries", flushed);
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, repository: &str) -> Option<Option<Version>> {
        let entries = self.read_entries();
        let entry = entries.get(repository)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            debug!(repository, "cache entry expired");
            return None;
        }
        Some(entry.latest.clone())
    }

    fn store(&self, repository: &str, latest: Option<Version>, generation: u64) {
        let mut entries = self.write_entries();
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(repository, "cache flushed during fetch, not storing result");
            return;
        }
        entries.insert(
            repository.to_string(),
            CacheEntry {
                latest,
                inserted_at: Instant::now(),
            },
        );
    }

    // Entries are plain values, so a poisoned lock still guards consistent data.
    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
