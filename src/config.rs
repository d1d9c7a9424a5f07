use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info};

// =============================================================================
// Defaults
// =============================================================================

/// Default listen address for the metrics server
pub const DEFAULT_BIND: &str = "0.0.0.0:9333";

/// Default configuration file path
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default time between refreshes with the GitHub API, in `parse_duration` syntax
pub const DEFAULT_REFRESH_INTERVAL: &str = "15m";

/// Timeout for a single release fetch (30 seconds)
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default base URL for the GitHub API
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("Failed to listen for reload signal: {0}")]
    Signal(#[source] std::io::Error),
}

/// Exporter configuration file
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Repository identifier -> version constraint, in file order
    pub repositories: IndexMap<String, String>,
}

impl ExporterConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }
}

type ReloadCallback = Box<dyn Fn() + Send + Sync>;

/// Owns the current configuration snapshot and reloads it on demand.
///
/// Readers take an `Arc` snapshot; a reload swaps the whole snapshot and then
/// notifies every registered callback.
pub struct ConfigWatch {
    path: PathBuf,
    current: RwLock<Arc<ExporterConfig>>,
    callbacks: Mutex<Vec<ReloadCallback>>,
}

impl ConfigWatch {
    pub fn new(path: impl Into<PathBuf>, initial: ExporterConfig) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(initial)),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    /// Load the configuration file for the first time
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = ExporterConfig::load(&path)?;
        info!(
            "Loaded {} repositories from {:?}",
            config.repositories.len(),
            path
        );
        Ok(Self::new(path, config))
    }

    /// Current configuration snapshot
    pub fn snapshot(&self) -> Arc<ExporterConfig> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a callback invoked after every successful reload
    pub fn on_reload(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Re-read the configuration file, swap the snapshot and notify callbacks.
    ///
    /// On error the previous snapshot stays in place and no callback runs.
    pub fn reload(&self) -> Result<(), ConfigError> {
        debug!("reloading config from {:?}", self.path);
        let config = ExporterConfig::load(&self.path)?;
        let repositories = config.repositories.len();

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(config);

        for callback in self
            .callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            callback();
        }

        info!("config reloaded with {} repositories", repositories);
        Ok(())
    }

    /// Reload on every SIGHUP until a reload fails.
    ///
    /// A failed reload is returned so the caller can stop the process instead
    /// of serving a configuration it could not read.
    #[cfg(unix)]
    pub async fn watch_signals(self: Arc<Self>) -> Result<(), ConfigError> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut hangup = signal(SignalKind::hangup()).map_err(ConfigError::Signal)?;
        while hangup.recv().await.is_some() {
            info!("received SIGHUP, reloading config");
            self.reload()
                .inspect_err(|e| error!("failed to reload config: {}", e))?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn watch_signals(self: Arc<Self>) -> Result<(), ConfigError> {
        std::future::pending().await
    }
}

/// Parse a Go-style duration such as "15m", "1h30m", "30s" or "500ms".
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid());
    }
    if rest == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = match &rest[..unit_len] {
            "ms" => Duration::from_millis(1),
            "s" => Duration::from_secs(1),
            "m" => Duration::from_secs(60),
            "h" => Duration::from_secs(60 * 60),
            _ => return Err(invalid()),
        };
        rest = &rest[unit_len..];

        let value = u32::try_from(value).map_err(|_| invalid())?;
        total = unit
            .checked_mul(value)
            .and_then(|d| total.checked_add(d))
            .ok_or_else(invalid)?;
    }

    Ok(total)
}

/// Accept Go-style ":9333" listen addresses by binding on all interfaces.
pub fn normalize_bind(bind: &str) -> String {
    match bind.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => bind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn from_yaml_preserves_repository_order() {
        let config = ExporterConfig::from_yaml(
            r#"
repositories:
  prometheus/prometheus: "^2.0.0"
  caarlos0/version_exporter: ">= 1.0.0, < 2.0.0"
  goreleaser/goreleaser: v0.1.1
"#,
        )
        .unwrap();

        let repos: Vec<_> = config
            .repositories
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            repos,
            vec![
                ("prometheus/prometheus", "^2.0.0"),
                ("caarlos0/version_exporter", ">= 1.0.0, < 2.0.0"),
                ("goreleaser/goreleaser", "v0.1.1"),
            ]
        );
    }

    #[rstest]
    #[case("")]
    #[case("repositories: {}")]
    #[case("other: value")]
    fn from_yaml_defaults_to_no_repositories(#[case] contents: &str) {
        assert_eq!(
            ExporterConfig::from_yaml(contents).unwrap(),
            ExporterConfig::default()
        );
    }

    #[test]
    fn from_yaml_rejects_malformed_document() {
        assert!(ExporterConfig::from_yaml("repositories: [a, b").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = ExporterConfig::load(&dir.path().join("missing.yaml"));

        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn reload_swaps_snapshot_and_notifies() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "repositories:\n  foo: v0.1.1\n");
        let watch = ConfigWatch::load(&path).unwrap();
        let reloads = Arc::new(AtomicUsize::new(0));
        watch.on_reload({
            let reloads = reloads.clone();
            move || {
                reloads.fetch_add(1, Ordering::SeqCst);
            }
        });

        let before = watch.snapshot();
        write_config(&dir, "repositories:\n  bar: ^1.0.0\n");
        watch.reload().unwrap();

        assert_eq!(reloads.load(Ordering::SeqCst), 1);
        assert_eq!(before.repositories.get("foo").map(String::as_str), Some("v0.1.1"));
        let after = watch.snapshot();
        assert!(after.repositories.get("foo").is_none());
        assert_eq!(after.repositories.get("bar").map(String::as_str), Some("^1.0.0"));
    }

    #[test]
    fn failed_reload_keeps_snapshot_and_skips_callbacks() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "repositories:\n  foo: v0.1.1\n");
        let watch = ConfigWatch::load(&path).unwrap();
        let reloads = Arc::new(AtomicUsize::new(0));
        watch.on_reload({
            let reloads = reloads.clone();
            move || {
                reloads.fetch_add(1, Ordering::SeqCst);
            }
        });

        write_config(&dir, "repositories: [broken");
        let result = watch.reload();

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        assert_eq!(reloads.load(Ordering::SeqCst), 0);
        assert_eq!(
            watch.snapshot().repositories.get("foo").map(String::as_str),
            Some("v0.1.1")
        );
    }

    #[rstest]
    #[case("15m", Duration::from_secs(900))]
    #[case("30s", Duration::from_secs(30))]
    #[case("500ms", Duration::from_millis(500))]
    #[case("1h30m", Duration::from_secs(5400))]
    #[case("2h", Duration::from_secs(7200))]
    #[case("0", Duration::ZERO)]
    fn parse_duration_accepts_go_durations(#[case] input: &str, #[case] expected: Duration) {
        assert_eq!(parse_duration(input).unwrap(), expected);
    }

    #[test]
    fn default_refresh_interval_is_fifteen_minutes() {
        assert_eq!(
            parse_duration(DEFAULT_REFRESH_INTERVAL).unwrap(),
            Duration::from_secs(15 * 60)
        );
    }

    #[rstest]
    #[case("")]
    #[case("15")]
    #[case("m")]
    #[case("15x")]
    #[case("-5m")]
    #[case("1.5h")]
    fn parse_duration_rejects_invalid_input(#[case] input: &str) {
        assert!(matches!(
            parse_duration(input),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[rstest]
    #[case(":9333", "0.0.0.0:9333")]
    #[case("127.0.0.1:9333", "127.0.0.1:9333")]
    #[case("[::1]:9333", "[::1]:9333")]
    fn normalize_bind_handles_go_style_addresses(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_bind(input), expected);
    }
}
