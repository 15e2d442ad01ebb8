//! API server: HTML lookup pages, the JSON API and the metrics exporter.

use crate::rest::{self, AppState};
use crate::ui;
use anyhow::Context;
use axum::routing::get;
use axum::Router;
use shopper_core::config::AppConfig;
use shopper_personalization::RecommendationEngine;
use shopper_storage::load_similarity;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Read-only server over a similarity table loaded once at startup.
pub struct ApiServer {
    config: AppConfig,
    engine: Arc<RecommendationEngine>,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<RecommendationEngine>) -> Self {
        Self { config, engine }
    }

    /// Load the persisted similarity table named in the config. A missing
    /// table is an error; the server does not start without one.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let path = config.data.similarity_path.clone();
        let table = load_similarity(&path).with_context(|| {
            format!("failed to load similarity table from {path}; run the pipeline first")
        })?;
        info!(path = %path, products = table.len(), "Similarity table loaded");
        let engine = Arc::new(RecommendationEngine::new(Arc::new(table)));
        Ok(Self::new(config, engine))
    }

    pub fn engine(&self) -> &Arc<RecommendationEngine> {
        &self.engine
    }

    /// Build the application router with all routes and middleware.
    pub fn router(&self) -> Router {
        let state = AppState {
            engine: self.engine.clone(),
            default_count: self.config.recommend.default_count,
            max_count: self.config.recommend.max_count,
            start_time: Instant::now(),
        };

        Router::new()
            // HTML pages
            .route("/", get(ui::index))
            .route("/recommendations", get(ui::recommendations_page))
            // JSON API
            .route("/v1/products", get(rest::list_products))
            .route("/v1/recommendations", get(rest::recommendations))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Start the HTTP server and serve until the process exits.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = self.router();

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Install the Prometheus recorder and its scrape listener on the
    /// metrics port. Must be called from inside the tokio runtime.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}
