//! Clustering quality checks: elbow curve plus silhouette, Calinski-Harabasz
//! and Davies-Bouldin scores for k-means and DBSCAN on standardized RFM.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use shopper_core::config::EvaluationConfig;
use shopper_core::types::CustomerRfm;
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;
use tracing::info;

use crate::dbscan::{cluster_distribution, dbscan, signed_labels};
use crate::engine::rfm_matrix;
use crate::kmeans::{KMeans, KMeansParams};
use crate::scaler::StandardScaler;

/// Scores for one clustering. `None` when the labels do not form a valid
/// clustering (a single group, or as many groups as samples).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringScores {
    pub name: String,
    pub n_labels: usize,
    pub silhouette: Option<f64>,
    pub calinski_harabasz: Option<f64>,
    pub davies_bouldin: Option<f64>,
}

impl ClusteringScores {
    pub fn compute(name: impl Into<String>, data: ArrayView2<'_, f64>, labels: &[i64]) -> Self {
        Self {
            name: name.into(),
            n_labels: distinct_labels(labels).len(),
            silhouette: silhouette_score(data, labels),
            calinski_harabasz: calinski_harabasz_score(data, labels),
            davies_bouldin: davies_bouldin_score(data, labels),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.silhouette.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// `(k, inertia)` for each k in the configured range.
    pub elbow: Vec<(usize, f64)>,
    pub kmeans: ClusteringScores,
    pub dbscan: ClusteringScores,
    /// Members per DBSCAN label; noise is `-1`.
    pub dbscan_distribution: BTreeMap<i64, usize>,
}

/// Run the full evaluation on a set of RFM records.
pub fn evaluate(
    records: &[CustomerRfm],
    config: &EvaluationConfig,
    params: &KMeansParams,
) -> EvaluationReport {
    let features = rfm_matrix(records);
    let (_, scaled) = StandardScaler::fit_transform(features.view());

    let elbow = elbow_curve(scaled.view(), config.k_min..=config.k_max, params);

    let kmeans_labels: Vec<i64> = KMeans::new(*params)
        .fit(scaled.view())
        .labels
        .into_iter()
        .map(|l| l as i64)
        .collect();
    let kmeans = ClusteringScores::compute(
        format!("KMeans (k={})", params.n_clusters),
        scaled.view(),
        &kmeans_labels,
    );

    let dbscan_labels = signed_labels(&dbscan(
        scaled.view(),
        config.dbscan_eps,
        config.dbscan_min_samples,
    ));
    let dbscan_scores = ClusteringScores::compute("DBSCAN", scaled.view(), &dbscan_labels);
    let dbscan_distribution = cluster_distribution(&dbscan_labels);

    info!(
        customers = records.len(),
        kmeans_silhouette = ?kmeans.silhouette,
        dbscan_labels = dbscan_scores.n_labels,
        "Clustering evaluation finished"
    );

    EvaluationReport {
        elbow,
        kmeans,
        dbscan: dbscan_scores,
        dbscan_distribution,
    }
}

/// Inertia for every k in `k_range`, all other parameters unchanged.
pub fn elbow_curve(
    data: ArrayView2<'_, f64>,
    k_range: RangeInclusive<usize>,
    params: &KMeansParams,
) -> Vec<(usize, f64)> {
    k_range
        .map(|k| {
            let model = KMeans::new(params.with_clusters(k)).fit(data);
            (k, model.inertia)
        })
        .collect()
}

fn distinct_labels(labels: &[i64]) -> Vec<i64> {
    let mut distinct: Vec<i64> = labels.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    distinct
}

fn valid_label_count(n_samples: usize, labels: &[i64]) -> Option<usize> {
    let k = distinct_labels(labels).len();
    (k >= 2 && k < n_samples).then_some(k)
}

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Group sample indices and centroids by label.
fn centroids_by_label(
    data: ArrayView2<'_, f64>,
    labels: &[i64],
) -> (Vec<i64>, Vec<Vec<usize>>, Array2<f64>) {
    let distinct = distinct_labels(labels);
    let position: HashMap<i64, usize> = distinct.iter().enumerate().map(|(i, l)| (*l, i)).collect();

    let mut members = vec![Vec::new(); distinct.len()];
    for (idx, label) in labels.iter().enumerate() {
        members[position[label]].push(idx);
    }

    let mut centroids = Array2::zeros((distinct.len(), data.ncols()));
    for (c, idxs) in members.iter().enumerate() {
        let group = data.select(Axis(0), idxs);
        if let Some(mean) = group.mean_axis(Axis(0)) {
            centroids.row_mut(c).assign(&mean);
        }
    }

    (distinct, members, centroids)
}

/// Mean silhouette coefficient over all samples.
pub fn silhouette_score(data: ArrayView2<'_, f64>, labels: &[i64]) -> Option<f64> {
    let n = data.nrows();
    valid_label_count(n, labels)?;
    let (_, members, _) = centroids_by_label(data, labels);
    let cluster_of: HashMap<usize, usize> = members
        .iter()
        .enumerate()
        .flat_map(|(c, idxs)| idxs.iter().map(move |i| (*i, c)))
        .collect();

    let mut total = 0.0;
    for i in 0..n {
        let own = cluster_of[&i];
        if members[own].len() <= 1 {
            continue;
        }
        let mut mean_dist = vec![0.0; members.len()];
        for (c, idxs) in members.iter().enumerate() {
            let sum: f64 = idxs.iter().map(|&j| euclidean(data.row(i), data.row(j))).sum();
            let denom = if c == own { idxs.len() - 1 } else { idxs.len() };
            mean_dist[c] = sum / denom as f64;
        }
        let a = mean_dist[own];
        let b = mean_dist
            .iter()
            .enumerate()
            .filter(|(c, _)| *c != own)
            .map(|(_, d)| *d)
            .fold(f64::INFINITY, f64::min);
        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }
    Some(total / n as f64)
}

/// Ratio of between-cluster to within-cluster dispersion.
pub fn calinski_harabasz_score(data: ArrayView2<'_, f64>, labels: &[i64]) -> Option<f64> {
    let n = data.nrows();
    let k = valid_label_count(n, labels)?;
    let (_, members, centroids) = centroids_by_label(data, labels);
    let overall: Array1<f64> = data.mean_axis(Axis(0))?;

    let mut between = 0.0;
    let mut within = 0.0;
    for (c, idxs) in members.iter().enumerate() {
        let centroid = centroids.row(c);
        between += idxs.len() as f64 * euclidean(centroid, overall.view()).powi(2);
        within += idxs
            .iter()
            .map(|&i| euclidean(data.row(i), centroid).powi(2))
            .sum::<f64>();
    }

    if within == 0.0 {
        return Some(1.0);
    }
    Some(between * (n - k) as f64 / (within * (k - 1) as f64))
}

/// Average similarity of each cluster with its most similar cluster; lower
/// is better.
pub fn davies_bouldin_score(data: ArrayView2<'_, f64>, labels: &[i64]) -> Option<f64> {
    let k = valid_label_count(data.nrows(), labels)?;
    let (_, members, centroids) = centroids_by_label(data, labels);

    let intra: Vec<f64> = members
        .iter()
        .enumerate()
        .map(|(c, idxs)| {
            idxs.iter()
                .map(|&i| euclidean(data.row(i), centroids.row(c)))
                .sum::<f64>()
                / idxs.len() as f64
        })
        .collect();

    let mut total = 0.0;
    for i in 0..k {
        let worst = (0..k)
            .filter(|&j| j != i)
            .map(|j| {
                let separation = euclidean(centroids.row(i), centroids.row(j));
                if separation == 0.0 {
                    0.0
                } else {
                    (intra[i] + intra[j]) / separation
                }
            })
            .fold(0.0, f64::max);
        total += worst;
    }
    Some(total / k as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_blobs() -> (Array2<f64>, Vec<i64>) {
        let data = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [10.0, 10.0],
            [10.0, 11.0],
            [11.0, 10.0],
        ];
        (data, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn well_separated_clusters_score_well() {
        let (data, labels) = two_blobs();
        let sil = silhouette_score(data.view(), &labels).unwrap();
        assert!(sil > 0.8, "silhouette {sil}");
        let ch = calinski_harabasz_score(data.view(), &labels).unwrap();
        assert!(ch > 100.0, "calinski-harabasz {ch}");
        let db = davies_bouldin_score(data.view(), &labels).unwrap();
        assert!(db < 0.2, "davies-bouldin {db}");
    }

    #[test]
    fn swapped_assignment_scores_worse() {
        let (data, labels) = two_blobs();
        let mixed = vec![0, 1, 0, 1, 0, 1];
        let good = silhouette_score(data.view(), &labels).unwrap();
        let bad = silhouette_score(data.view(), &mixed).unwrap();
        assert!(bad < good);
        let good_db = davies_bouldin_score(data.view(), &labels).unwrap();
        let bad_db = davies_bouldin_score(data.view(), &mixed).unwrap();
        assert!(bad_db > good_db);
    }

    #[test]
    fn single_cluster_is_not_valid() {
        let (data, _) = two_blobs();
        let labels = vec![0; 6];
        assert_eq!(silhouette_score(data.view(), &labels), None);
        assert_eq!(calinski_harabasz_score(data.view(), &labels), None);
        assert_eq!(davies_bouldin_score(data.view(), &labels), None);
        let scores = ClusteringScores::compute("one", data.view(), &labels);
        assert!(!scores.is_valid());
        assert_eq!(scores.n_labels, 1);
    }

    #[test]
    fn elbow_inertia_is_non_increasing_on_blobs() {
        let (data, _) = two_blobs();
        let curve = elbow_curve(data.view(), 1..=4, &KMeansParams::default());
        assert_eq!(curve.len(), 4);
        assert_eq!(curve[0].0, 1);
        assert!(curve[1].1 < curve[0].1);
        assert!(curve[3].1 <= curve[1].1);
    }

    #[test]
    fn evaluate_reports_all_sections() {
        let records: Vec<CustomerRfm> = (0..30)
            .map(|i| CustomerRfm {
                customer_id: format!("c{i}"),
                recency: if i < 15 { 5 + i % 3 } else { 300 + i % 5 },
                frequency: if i < 15 { 20 } else { 1 },
                monetary: if i < 15 { 5000.0 } else { 50.0 },
            })
            .collect();
        let config = EvaluationConfig {
            k_max: 5,
            ..EvaluationConfig::default()
        };
        let report = evaluate(&records, &config, &KMeansParams::default());
        assert_eq!(report.elbow.len(), 5);
        assert_eq!(report.kmeans.name, "KMeans (k=4)");
        assert!(report.kmeans.is_valid());
        let counted: usize = report.dbscan_distribution.values().sum();
        assert_eq!(counted, 30);
    }
}
