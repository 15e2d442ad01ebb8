use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use shopper_api::rest::{HealthResponse, ProductsResponse};
use shopper_api::ui::NOT_FOUND_MESSAGE;
use shopper_api::ApiServer;
use shopper_core::types::SimilarityTable;
use shopper_core::AppConfig;
use shopper_personalization::{RecommendationEngine, RecommendationResponse};
use std::sync::Arc;
use tower::ServiceExt;

fn table() -> SimilarityTable {
    let products = vec![
        "CAKE STAND".to_string(),
        "JAM JAR".into(),
        "T-LIGHT <HOLDER>".into(),
        "TEA CUP".into(),
    ];
    #[rustfmt::skip]
    let scores = vec![
        1.0, 0.2, 0.1, 0.8,
        0.2, 1.0, 0.0, 0.5,
        0.1, 0.0, 1.0, 0.3,
        0.8, 0.5, 0.3, 1.0,
    ];
    SimilarityTable::from_parts(products, scores).unwrap()
}

fn app_with(table: SimilarityTable) -> Router {
    let engine = Arc::new(RecommendationEngine::new(Arc::new(table)));
    ApiServer::new(AppConfig::default(), engine).router()
}

fn app() -> Router {
    app_with(table())
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn index_lists_every_product() {
    let (status, body) = get(app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<select"));
    assert!(body.contains("Get Recommendations"));
    assert!(body.contains("<option value=\"CAKE STAND\">CAKE STAND</option>"));
    assert!(body.contains("T-LIGHT &lt;HOLDER&gt;"));
    assert!(!body.contains("<HOLDER>"));
}

#[tokio::test]
async fn known_product_renders_numbered_list() {
    let (status, body) = get(app(), "/recommendations?product=CAKE%20STAND&n=2").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Top 2 Recommended Products:"));
    assert!(body.contains("<ol>\n<li>TEA CUP</li>\n<li>JAM JAR</li>\n</ol>"));
    assert!(!body.contains(NOT_FOUND_MESSAGE));
}

#[tokio::test]
async fn blank_count_falls_back_to_default() {
    let (status, body) = get(app(), "/recommendations?product=CAKE%20STAND&n=").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Top 3 Recommended Products:"));
    assert!(body.contains("<li>TEA CUP</li>"));

    let (status, body) = get(app(), "/v1/recommendations?product=TEA%20CUP&n=").await;
    assert_eq!(status, StatusCode::OK);
    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.recommendations.len(), 3);

    let (status, _) = get(app(), "/v1/recommendations?product=TEA%20CUP&n=many").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_product_renders_warning() {
    let (status, body) = get(app(), "/recommendations?product=GARDEN%20GNOME").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(NOT_FOUND_MESSAGE));
    assert!(!body.contains("<ol>"));
}

#[tokio::test]
async fn single_product_catalog_has_insufficient_data() {
    let only = SimilarityTable::from_parts(vec!["TEA CUP".to_string()], vec![1.0]).unwrap();
    let (_, body) = get(app_with(only), "/recommendations?product=TEA%20CUP").await;
    assert!(body.contains(NOT_FOUND_MESSAGE));
}

#[tokio::test]
async fn json_recommendations_default_to_five() {
    let (status, body) = get(app(), "/v1/recommendations?product=TEA%20CUP").await;
    assert_eq!(status, StatusCode::OK);
    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    assert!(response.found);
    let names: Vec<_> = response.recommendations.iter().map(|r| r.product.as_str()).collect();
    assert_eq!(names, vec!["CAKE STAND", "JAM JAR", "T-LIGHT <HOLDER>"]);
    assert_eq!(response.recommendations[0].rank, 1);
    assert_eq!(response.recommendations[0].score, 0.8);
}

#[tokio::test]
async fn json_unknown_product_is_not_an_error() {
    let (status, body) = get(app(), "/v1/recommendations?product=NOPE&n=3").await;
    assert_eq!(status, StatusCode::OK);
    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    assert!(!response.found);
    assert!(response.recommendations.is_empty());
}

#[tokio::test]
async fn count_is_capped_at_configured_maximum() {
    let products: Vec<String> = (0..80).map(|i| format!("ITEM {i:03}")).collect();
    let mut scores = vec![0.5; 80 * 80];
    for i in 0..80 {
        scores[i * 80 + i] = 1.0;
    }
    let big = SimilarityTable::from_parts(products, scores).unwrap();
    let (_, body) = get(app_with(big), "/v1/recommendations?product=ITEM%20000&n=500").await;
    let response: RecommendationResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.recommendations.len(), AppConfig::default().recommend.max_count);
}

#[tokio::test]
async fn products_endpoint_lists_catalog() {
    let (status, body) = get(app(), "/v1/products").await;
    assert_eq!(status, StatusCode::OK);
    let response: ProductsResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(response.count, 4);
    assert_eq!(response.products[0], "CAKE STAND");
}

#[tokio::test]
async fn operational_endpoints() {
    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: HealthResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.products, 4);

    assert_eq!(get(app(), "/live").await.0, StatusCode::OK);
    assert_eq!(get(app(), "/ready").await.0, StatusCode::OK);
    assert_eq!(
        get(app_with(SimilarityTable::empty()), "/ready").await.0,
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[test]
fn missing_similarity_table_refuses_to_start() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.data.similarity_path = dir.path().join("absent.bin").display().to_string();
    let err = ApiServer::from_config(config).err().unwrap();
    assert!(err.to_string().contains("similarity table"));
}
