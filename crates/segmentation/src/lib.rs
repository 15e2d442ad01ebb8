//! Customer segmentation: RFM features, standardized k-means clustering,
//! threshold-based segment labels and clustering evaluation.

pub mod dbscan;
pub mod engine;
pub mod evaluation;
pub mod kmeans;
pub mod labeling;
pub mod rfm;
pub mod scaler;

pub use engine::{ClusterProfile, SegmentationEngine, SegmentationResult};
pub use evaluation::{evaluate, ClusteringScores, EvaluationReport};
pub use kmeans::{KMeans, KMeansModel, KMeansParams};
pub use labeling::{RfmMeans, SegmentRules};
pub use rfm::{build_rfm, build_rfm_with_reference, reference_date};
pub use scaler::StandardScaler;
