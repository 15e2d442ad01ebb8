//! JSON handlers for product lookup plus the operational endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Deserializer, Serialize};
use shopper_personalization::{RecommendationEngine, RecommendationResponse};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub default_count: usize,
    pub max_count: usize,
    pub start_time: Instant,
}

impl AppState {
    /// Requested count, falling back to the default and capped at the maximum.
    pub fn resolve_count(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_count).min(self.max_count)
    }

    /// Run a lookup and record it in the lookup counters.
    pub fn lookup(&self, product: &str, n: Option<usize>) -> RecommendationResponse {
        let count = self.resolve_count(n);
        let response = self.engine.respond(product, count);

        metrics::counter!("ui.lookups").increment(1);
        if !response.found {
            metrics::counter!("ui.lookups_not_found").increment(1);
        }
        debug!(
            product,
            count,
            found = response.found,
            results = response.recommendations.len(),
            "Recommendation lookup"
        );
        response
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendQuery {
    #[serde(default)]
    pub product: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub n: Option<usize>,
}

/// A blank or non-numeric count (an emptied form field sends `n=`) falls
/// back to the default instead of rejecting the request.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().parse().ok()))
}

/// GET /v1/products: known product names in catalog order.
pub async fn list_products(State(state): State<AppState>) -> Json<ProductsResponse> {
    let products = state.engine.products().to_vec();
    Json(ProductsResponse {
        count: products.len(),
        products,
    })
}

/// GET /v1/recommendations: ranked similar products. An unknown product is
/// reported through `found`, never as an HTTP error.
pub async fn recommendations(
    State(state): State<AppState>,
    Query(query): Query<RecommendQuery>,
) -> Json<RecommendationResponse> {
    Json(state.lookup(&query.product, query.n))
}

/// GET /health: Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        products: state.engine.products().len(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready: ready once a non-empty similarity table is loaded.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.engine.products().is_empty() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

/// GET /live: Liveness check.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub count: usize,
    pub products: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub products: usize,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use shopper_core::types::SimilarityTable;

    fn state(products: &[&str]) -> AppState {
        let n = products.len();
        let mut scores = vec![0.5; n * n];
        for i in 0..n {
            scores[i * n + i] = 1.0;
        }
        let names = products.iter().map(|p| p.to_string()).collect();
        let table = SimilarityTable::from_parts(names, scores).unwrap();
        AppState {
            engine: Arc::new(RecommendationEngine::new(Arc::new(table))),
            default_count: 5,
            max_count: 50,
            start_time: Instant::now(),
        }
    }

    #[test]
    fn not_found_counter_tracks_unknown_products_only() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let multi = state(&["MUG", "PLATE"]);
        let single = state(&["MUG"]);

        metrics::with_local_recorder(&recorder, || {
            multi.lookup("MUG", None);
            multi.lookup("MUG", Some(0));
            single.lookup("MUG", None);
            multi.lookup("GARDEN GNOME", None);
        });

        let rendered = handle.render();
        assert!(rendered.contains("ui_lookups 4"), "{rendered}");
        assert!(rendered.contains("ui_lookups_not_found 1"), "{rendered}");
    }
}
