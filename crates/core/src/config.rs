use serde::Deserialize;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `SHOPPER_SPECTRUM__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Locations of the raw transaction log and the two persisted tables.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_input_path")]
    pub input_path: String,
    #[serde(default = "default_rfm_path")]
    pub rfm_path: String,
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,
}

/// Clustering parameters. Fixed here so that reruns are reproducible.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    #[serde(default = "default_n_clusters")]
    pub n_clusters: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    #[serde(default = "default_n_init")]
    pub n_init: usize,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub thresholds: LabelThresholds,
}

/// Heuristic cut-offs applied to cluster mean RFM values when naming
/// segments. Rules are evaluated high-value, regular, at-risk, in that order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelThresholds {
    #[serde(default = "default_high_value_max_recency")]
    pub high_value_max_recency: f64,
    #[serde(default = "default_high_value_min_frequency")]
    pub high_value_min_frequency: f64,
    #[serde(default = "default_high_value_min_monetary")]
    pub high_value_min_monetary: f64,
    #[serde(default = "default_regular_max_recency")]
    pub regular_max_recency: f64,
    #[serde(default = "default_regular_min_frequency")]
    pub regular_min_frequency: f64,
    #[serde(default = "default_at_risk_min_recency")]
    pub at_risk_min_recency: f64,
    #[serde(default = "default_at_risk_max_frequency")]
    pub at_risk_max_frequency: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendConfig {
    #[serde(default = "default_recommendation_count")]
    pub default_count: usize,
    #[serde(default = "default_max_count")]
    pub max_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_k_min")]
    pub k_min: usize,
    #[serde(default = "default_k_max")]
    pub k_max: usize,
    #[serde(default = "default_dbscan_eps")]
    pub dbscan_eps: f64,
    #[serde(default = "default_dbscan_min_samples")]
    pub dbscan_min_samples: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_input_path() -> String {
    "online_retail.csv".to_string()
}
fn default_rfm_path() -> String {
    "rfm.csv".to_string()
}
fn default_similarity_path() -> String {
    "product_similarity.bin".to_string()
}
fn default_n_clusters() -> usize {
    4
}
fn default_seed() -> u64 {
    42
}
fn default_max_iter() -> usize {
    300
}
fn default_n_init() -> usize {
    10
}
fn default_tolerance() -> f64 {
    1e-4
}
fn default_high_value_max_recency() -> f64 {
    50.0
}
fn default_high_value_min_frequency() -> f64 {
    10.0
}
fn default_high_value_min_monetary() -> f64 {
    3000.0
}
fn default_regular_max_recency() -> f64 {
    100.0
}
fn default_regular_min_frequency() -> f64 {
    2.0
}
fn default_at_risk_min_recency() -> f64 {
    200.0
}
fn default_at_risk_max_frequency() -> f64 {
    1.0
}
fn default_recommendation_count() -> usize {
    5
}
fn default_max_count() -> usize {
    50
}
fn default_k_min() -> usize {
    1
}
fn default_k_max() -> usize {
    10
}
fn default_dbscan_eps() -> f64 {
    1.2
}
fn default_dbscan_min_samples() -> usize {
    5
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    8501
}
fn default_metrics_enabled() -> bool {
    false
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            rfm_path: default_rfm_path(),
            similarity_path: default_similarity_path(),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            n_clusters: default_n_clusters(),
            seed: default_seed(),
            max_iter: default_max_iter(),
            n_init: default_n_init(),
            tolerance: default_tolerance(),
            thresholds: LabelThresholds::default(),
        }
    }
}

impl Default for LabelThresholds {
    fn default() -> Self {
        Self {
            high_value_max_recency: default_high_value_max_recency(),
            high_value_min_frequency: default_high_value_min_frequency(),
            high_value_min_monetary: default_high_value_min_monetary(),
            regular_max_recency: default_regular_max_recency(),
            regular_min_frequency: default_regular_min_frequency(),
            at_risk_min_recency: default_at_risk_min_recency(),
            at_risk_max_frequency: default_at_risk_max_frequency(),
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            default_count: default_recommendation_count(),
            max_count: default_max_count(),
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            k_min: default_k_min(),
            k_max: default_k_max(),
            dbscan_eps: default_dbscan_eps(),
            dbscan_min_samples: default_dbscan_min_samples(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            segmentation: SegmentationConfig::default(),
            recommend: RecommendConfig::default(),
            evaluation: EvaluationConfig::default(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Default config file looked up next to the working directory.
    pub const DEFAULT_FILE: &'static str = "shopper-spectrum";

    /// Load configuration from environment variables and the default config file.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(Self::DEFAULT_FILE)
    }

    /// Load configuration from environment variables and an optional config
    /// file (any extension the `config` crate understands). A missing file
    /// is not an error.
    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("SHOPPER_SPECTRUM")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.segmentation.n_clusters == 0 {
            return Err("segmentation.n_clusters must be at least 1".to_string());
        }
        if self.segmentation.max_iter == 0 {
            return Err("segmentation.max_iter must be at least 1".to_string());
        }
        if self.segmentation.n_init == 0 {
            return Err("segmentation.n_init must be at least 1".to_string());
        }
        if self.evaluation.k_min == 0 || self.evaluation.k_min > self.evaluation.k_max {
            return Err("evaluation.k_min must be in 1..=k_max".to_string());
        }
        if self.evaluation.dbscan_eps <= 0.0 {
            return Err("evaluation.dbscan_eps must be positive".to_string());
        }
        Ok(())
    }
}
