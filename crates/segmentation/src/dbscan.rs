//! Density-based clustering used to cross-check the k-means segmentation.

use ndarray::{ArrayView1, ArrayView2, Axis};
use std::collections::{BTreeMap, VecDeque};

/// Label used for noise points when reporting distributions.
pub const NOISE: i64 = -1;

fn distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Cluster rows with DBSCAN (Euclidean distance). A point is a core point
/// when at least `min_samples` points, itself included, lie within `eps`.
/// Returns `None` for noise.
pub fn dbscan(data: ArrayView2<'_, f64>, eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n = data.nrows();
    let neighbors: Vec<Vec<usize>> = data
        .axis_iter(Axis(0))
        .map(|p| {
            data.axis_iter(Axis(0))
                .enumerate()
                .filter(|(_, q)| distance(p, *q) <= eps)
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    let is_core: Vec<bool> = neighbors.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut next_cluster = 0;

    for start in 0..n {
        if labels[start].is_some() || !is_core[start] {
            continue;
        }
        let cluster = next_cluster;
        next_cluster += 1;
        labels[start] = Some(cluster);

        let mut queue: VecDeque<usize> = VecDeque::from([start]);
        while let Some(point) = queue.pop_front() {
            if !is_core[point] {
                continue;
            }
            for &nb in &neighbors[point] {
                if labels[nb].is_none() {
                    labels[nb] = Some(cluster);
                    queue.push_back(nb);
                }
            }
        }
    }

    labels
}

/// Map DBSCAN output to signed labels with noise as [`NOISE`].
pub fn signed_labels(labels: &[Option<usize>]) -> Vec<i64> {
    labels
        .iter()
        .map(|l| l.map_or(NOISE, |c| c as i64))
        .collect()
}

/// Member count per label, noise included.
pub fn cluster_distribution(labels: &[i64]) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}
