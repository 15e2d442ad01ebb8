//! Product recommendation lookup. Ranks catalog products by item-item
//! cosine similarity to a queried product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopper_core::types::SimilarityTable;
use std::sync::Arc;

/// Number of recommendations returned when the caller does not ask for a
/// specific count.
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub product: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub product: String,
    /// False when the product is not in the similarity table.
    pub found: bool,
    pub recommendations: Vec<Recommendation>,
    pub generated_at: DateTime<Utc>,
}

/// Read-only lookup over a similarity table handed in by the caller.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    table: Arc<SimilarityTable>,
}

impl RecommendationEngine {
    pub fn new(table: Arc<SimilarityTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &SimilarityTable {
        &self.table
    }

    /// Known product names in catalog order.
    pub fn products(&self) -> &[String] {
        self.table.products()
    }

    pub fn contains(&self, product: &str) -> bool {
        self.table.contains(product)
    }

    /// Names of the `n` products most similar to `product`, best first. An
    /// unknown product yields an empty list.
    pub fn similar_products(&self, product: &str, n: usize) -> Vec<String> {
        self.ranked(product, n)
            .into_iter()
            .map(|(idx, _)| self.table.products()[idx].clone())
            .collect()
    }

    /// Same ranking as [`similar_products`](Self::similar_products) with scores.
    pub fn recommend(&self, product: &str, n: usize) -> Vec<Recommendation> {
        self.ranked(product, n)
            .into_iter()
            .enumerate()
            .map(|(i, (idx, score))| Recommendation {
                rank: i + 1,
                product: self.table.products()[idx].clone(),
                score,
            })
            .collect()
    }

    pub fn respond(&self, product: &str, n: usize) -> RecommendationResponse {
        RecommendationResponse {
            product: product.to_string(),
            found: self.contains(product),
            recommendations: self.recommend(product, n),
            generated_at: Utc::now(),
        }
    }

    /// Stable descending sort of every other product by similarity, so ties
    /// keep catalog order.
    fn ranked(&self, product: &str, n: usize) -> Vec<(usize, f64)> {
        let Some(query) = self.table.index_of(product) else {
            return Vec::new();
        };
        if n == 0 {
            return Vec::new();
        }

        let row = self.table.row(query);
        let mut candidates: Vec<(usize, f64)> = row
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != query)
            .map(|(idx, score)| (idx, *score))
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(n);
        candidates
    }
}
