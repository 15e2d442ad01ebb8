//! Personalization: item-item similarity over purchase history and the
//! product recommendation lookup served to the UI.

pub mod recommendations;
pub mod similarity;

pub use recommendations::{
    Recommendation, RecommendationEngine, RecommendationResponse, DEFAULT_RECOMMENDATION_COUNT,
};
pub use similarity::{build_item_matrix, build_similarity, cosine_similarity, ItemMatrix};
