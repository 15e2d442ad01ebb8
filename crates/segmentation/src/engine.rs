//! Segmentation engine: standardizes RFM features, clusters customers and
//! names each cluster with the labeling rules.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use shopper_core::config::SegmentationConfig;
use shopper_core::types::{CustomerRfm, CustomerSegment, SegmentLabel};
use tracing::info;

use crate::kmeans::{KMeans, KMeansParams};
use crate::labeling::{RfmMeans, SegmentRules};
use crate::scaler::StandardScaler;

/// Size and mean RFM values of one realized cluster, with its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    pub mean_recency: f64,
    pub mean_frequency: f64,
    pub mean_monetary: f64,
    pub segment: SegmentLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationResult {
    /// One entry per input customer, in input order.
    pub customers: Vec<CustomerSegment>,
    /// One entry per cluster that received members, ordered by cluster id.
    pub profiles: Vec<ClusterProfile>,
    pub inertia: f64,
    pub iterations: usize,
}

impl SegmentationResult {
    fn empty() -> Self {
        Self {
            customers: Vec::new(),
            profiles: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        }
    }
}

/// Recency, frequency and monetary as a `customers x 3` matrix.
pub fn rfm_matrix(records: &[CustomerRfm]) -> Array2<f64> {
    let mut matrix = Array2::zeros((records.len(), 3));
    for (mut row, record) in matrix.rows_mut().into_iter().zip(records) {
        row[0] = record.recency as f64;
        row[1] = record.frequency as f64;
        row[2] = record.monetary;
    }
    matrix
}

pub struct SegmentationEngine {
    kmeans: KMeans,
    rules: SegmentRules,
}

impl SegmentationEngine {
    pub fn new(params: KMeansParams, rules: SegmentRules) -> Self {
        Self {
            kmeans: KMeans::new(params),
            rules,
        }
    }

    pub fn from_config(config: &SegmentationConfig) -> Self {
        Self::new(KMeansParams::from(config), SegmentRules::from(&config.thresholds))
    }

    pub fn params(&self) -> &KMeansParams {
        self.kmeans.params()
    }

    pub fn rules(&self) -> &SegmentRules {
        &self.rules
    }

    /// Cluster customers on standardized RFM features and label each
    /// cluster from its unscaled mean values.
    pub fn segment(&self, records: &[CustomerRfm]) -> SegmentationResult {
        if records.is_empty() {
            return SegmentationResult::empty();
        }

        let features = rfm_matrix(records);
        let (_, scaled) = StandardScaler::fit_transform(features.view());
        let model = self.kmeans.fit(scaled.view());

        let profiles = self.profile(records, &model.labels, model.centroids.nrows());
        let mut labels_by_cluster = vec![SegmentLabel::Occasional; model.centroids.nrows()];
        for profile in &profiles {
            labels_by_cluster[profile.cluster] = profile.segment;
        }

        let customers = records
            .iter()
            .zip(&model.labels)
            .map(|(record, &cluster)| CustomerSegment {
                customer_id: record.customer_id.clone(),
                recency: record.recency,
                frequency: record.frequency,
                monetary: record.monetary,
                cluster,
                segment: labels_by_cluster[cluster],
            })
            .collect();

        info!(
            customers = records.len(),
            requested_clusters = self.params().n_clusters,
            realized_clusters = profiles.len(),
            inertia = model.inertia,
            iterations = model.iterations,
            "Customers segmented"
        );

        SegmentationResult {
            customers,
            profiles,
            inertia: model.inertia,
            iterations: model.iterations,
        }
    }

    fn profile(&self, records: &[CustomerRfm], labels: &[usize], k: usize) -> Vec<ClusterProfile> {
        let mut sums = vec![(0usize, 0.0f64, 0.0f64, 0.0f64); k];
        for (record, &cluster) in records.iter().zip(labels) {
            let entry = &mut sums[cluster];
            entry.0 += 1;
            entry.1 += record.recency as f64;
            entry.2 += record.frequency as f64;
            entry.3 += record.monetary;
        }

        sums.into_iter()
            .enumerate()
            .filter(|(_, (size, ..))| *size > 0)
            .map(|(cluster, (size, recency, frequency, monetary))| {
                let n = size as f64;
                let means = RfmMeans {
                    recency: recency / n,
                    frequency: frequency / n,
                    monetary: monetary / n,
                };
                ClusterProfile {
                    cluster,
                    size,
                    mean_recency: means.recency,
                    mean_frequency: means.frequency,
                    mean_monetary: means.monetary,
                    segment: self.rules.label(&means),
                }
            })
            .collect()
    }
}

impl Default for SegmentationEngine {
    fn default() -> Self {
        Self::from_config(&SegmentationConfig::default())
    }
}
