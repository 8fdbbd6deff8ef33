pub mod config;
pub mod error;
pub mod grading;
pub mod logging;
pub mod subjects;

use anyhow::Context;
use attain_core::engine::BatchProcessor;
use attain_core::providers::extractor::{Extractor, GeminiExtractor, ReplayExtractor};
use attain_core::storage::{ResultStore, SqliteResultStore};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use config::{ExtractorKind, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ResultStore>,
    pub processor: Arc<BatchProcessor>,
}

impl AppState {
    pub fn from_config(cfg: &ServerConfig) -> anyhow::Result<Self> {
        let store = SqliteResultStore::open(&cfg.results_dir).with_context(|| {
            format!("failed to open results dir {}", cfg.results_dir.display())
        })?;
        let store: Arc<dyn ResultStore> = Arc::new(store);

        let extractor: Arc<dyn Extractor> = match cfg.extractor {
            ExtractorKind::Gemini => {
                let key = cfg
                    .gemini_api_key
                    .clone()
                    .context("the gemini extractor needs an API key")?;
                Arc::new(GeminiExtractor::new(cfg.gemini_model.clone(), key))
            }
            ExtractorKind::Replay => {
                let dir = cfg
                    .replay_dir
                    .clone()
                    .context("the replay extractor needs a replay directory")?;
                Arc::new(ReplayExtractor::from_dir(dir))
            }
        };

        let processor =
            BatchProcessor::new(extractor, store.clone()).with_policy(cfg.extraction_policy());
        Ok(Self {
            store,
            processor: Arc::new(processor),
        })
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(event = "cors_origin_invalid", origin = %o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

pub fn build_router(state: AppState, cfg: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(grading::router())
        .merge(subjects::router())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(cfg.max_upload_bytes))
        .layer(cors_layer(&cfg.cors_origins))
        .with_state(state)
}

pub async fn run(cfg: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&cfg)?;
    let app = build_router(state, &cfg);

    let addr: SocketAddr = cfg
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", cfg.bind_addr()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(event = "listening", %addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!(event = "server_stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(event = "signal_handler_failed", error = %e);
        std::future::pending::<()>().await;
    }
}
