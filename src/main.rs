use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use version_exporter::collector::Collector;
use version_exporter::config::{
    ConfigWatch, DEFAULT_BIND, DEFAULT_CONFIG_FILE, DEFAULT_GITHUB_API_URL,
    DEFAULT_REFRESH_INTERVAL, normalize_bind, parse_duration,
};
use version_exporter::logging::{self, LogFormat};
use version_exporter::server::{self, AppState};
use version_exporter::version::cache::FreshnessCache;
use version_exporter::version::sources::GitHubSource;

#[derive(Parser)]
#[command(name = "version_exporter")]
#[command(
    version,
    about = "Exports whether repositories' latest releases satisfy a version constraint"
)]
struct Cli {
    /// Address to bind the server
    #[arg(long, default_value = DEFAULT_BIND)]
    bind: String,

    /// Show debug logs
    #[arg(long)]
    debug: bool,

    /// GitHub token
    #[arg(long = "github.token", env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// GitHub API base URL
    #[arg(long = "github.url", default_value = DEFAULT_GITHUB_API_URL)]
    github_url: String,

    /// Config file
    #[arg(long = "config.file", default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Time between refreshes with the GitHub API
    #[arg(
        long = "refresh.interval",
        default_value = DEFAULT_REFRESH_INTERVAL,
        value_parser = parse_duration
    )]
    refresh_interval: Duration,

    /// Log output format
    #[arg(long = "log.format", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long = "log.file")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.debug, cli.log_format, cli.log_file.as_deref())?;

    info!("starting version_exporter {}", env!("CARGO_PKG_VERSION"));
    debug!("enabled debug mode");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let watch = Arc::new(
        ConfigWatch::load(&cli.config_file).context("failed to load config")?,
    );

    let source = Arc::new(GitHubSource::new(&cli.github_url, cli.github_token));
    let cache = Arc::new(FreshnessCache::new(source, cli.refresh_interval));
    watch.on_reload({
        let cache = cache.clone();
        move || cache.flush()
    });

    let collector = Arc::new(Collector::new(watch.clone(), cache));
    let bind = normalize_bind(&cli.bind);

    tokio::select! {
        result = server::serve(&bind, AppState { collector }) => {
            result.context("metrics server failed")?;
        }
        result = watch.clone().watch_signals() => {
            result.context("failed to reload config")?;
        }
    }

    Ok(())
}
