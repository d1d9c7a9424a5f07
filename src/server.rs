//! HTTP server exposing the metrics endpoint

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use tokio::net::TcpListener;
use tracing::info;

use crate::collector::Collector;
use crate::metrics;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<Collector>,
}

const INDEX_HTML: &str = r#"<html>
<head><title>Version Exporter</title></head>
<body>
<h1>Version Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// GET / - Landing page
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /metrics - Run one collection pass and expose it
async fn scrape(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.collector.collect().await;
    (
        [(header::CONTENT_TYPE, metrics::CONTENT_TYPE)],
        metrics::render(&result),
    )
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(scrape))
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(bind: &str, state: AppState) -> Result<(), ServerError> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind.to_string(),
            source,
        })?;
    info!("listening on {}", bind);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
        .map_err(ServerError::Serve)
}
