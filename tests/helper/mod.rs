//! Shared setup for end-to-end tests

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tempfile::TempDir;
use tower::ServiceExt;

use version_exporter::collector::Collector;
use version_exporter::config::ConfigWatch;
use version_exporter::server::{AppState, create_router};
use version_exporter::version::cache::FreshnessCache;
use version_exporter::version::sources::FakeSource;

/// Exporter wired against a fake source and a config file in a temp dir
pub struct TestExporter {
    pub dir: TempDir,
    pub config_path: PathBuf,
    pub source: Arc<FakeSource>,
    pub watch: Arc<ConfigWatch>,
    pub cache: Arc<FreshnessCache>,
    pub state: AppState,
}

impl TestExporter {
    pub fn new(config_yaml: &str, source: FakeSource) -> Self {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, config_yaml).unwrap();

        let source = Arc::new(source);
        let watch = Arc::new(ConfigWatch::load(&config_path).unwrap());
        let cache = Arc::new(FreshnessCache::new(source.clone(), Duration::from_secs(900)));
        watch.on_reload({
            let cache = cache.clone();
            move || cache.flush()
        });
        let collector = Arc::new(Collector::new(watch.clone(), cache.clone()));

        Self {
            dir,
            config_path,
            source,
            watch,
            cache,
            state: AppState { collector },
        }
    }

    pub fn rewrite_config(&self, config_yaml: &str) {
        std::fs::write(&self.config_path, config_yaml).unwrap();
    }

    /// Scrape /metrics and return status and body
    pub async fn scrape(&self) -> (StatusCode, String) {
        let response = create_router(self.state.clone())
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }
}

/// Expected `version_up_to_date` sample line
pub fn up_to_date(repository: &str, constraint: &str, latest: &str, value: u8) -> String {
    format!(
        "version_up_to_date{{constraint=\"{constraint}\",latest=\"{latest}\",repository=\"{repository}\"}} {value}"
    )
}
