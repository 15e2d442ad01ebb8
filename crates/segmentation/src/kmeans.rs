//! Seeded k-means clustering.
//!
//! Lloyd iterations with k-means++ initialization. Every run draws from a
//! single `StdRng` seeded from [`KMeansParams::seed`], so identical input
//! and parameters always produce identical labels. Several initializations
//! are tried and the one with the lowest inertia is kept.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shopper_core::config::SegmentationConfig;
use tracing::debug;

/// Explicit clustering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub n_clusters: usize,
    pub seed: u64,
    /// Iteration cap for a single run.
    pub max_iter: usize,
    /// Number of independent initializations.
    pub n_init: usize,
    /// Convergence threshold on the squared centroid shift, relative to the
    /// mean feature variance of the data.
    pub tolerance: f64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self::from(&SegmentationConfig::default())
    }
}

impl From<&SegmentationConfig> for KMeansParams {
    fn from(config: &SegmentationConfig) -> Self {
        Self {
            n_clusters: config.n_clusters,
            seed: config.seed,
            max_iter: config.max_iter,
            n_init: config.n_init,
            tolerance: config.tolerance,
        }
    }
}

impl KMeansParams {
    pub fn with_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }
}

/// Fitted clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansModel {
    /// One row per cluster. May hold fewer rows than requested when there
    /// are fewer samples than clusters.
    pub centroids: Array2<f64>,
    /// Cluster id per sample, in input order.
    pub labels: Vec<usize>,
    /// Sum of squared distances of samples to their assigned centroid.
    pub inertia: f64,
    /// Lloyd iterations performed by the winning run.
    pub iterations: usize,
}

impl KMeansModel {
    /// Number of clusters that actually received members.
    pub fn realized_clusters(&self) -> usize {
        let mut seen = vec![false; self.centroids.nrows()];
        for &label in &self.labels {
            seen[label] = true;
        }
        seen.into_iter().filter(|s| *s).count()
    }

    /// Index of the nearest centroid for a new sample.
    pub fn predict(&self, sample: ArrayView1<'_, f64>) -> Option<usize> {
        nearest(sample, &self.centroids).map(|(idx, _)| idx)
    }
}

pub struct KMeans {
    params: KMeansParams,
}

impl KMeans {
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    /// Cluster the rows of `data`. Degenerate input (fewer samples or
    /// distinct points than clusters) yields fewer realized clusters rather
    /// than an error.
    pub fn fit(&self, data: ArrayView2<'_, f64>) -> KMeansModel {
        let n_samples = data.nrows();
        let k = self.params.n_clusters.min(n_samples);
        if k == 0 {
            return KMeansModel {
                centroids: Array2::zeros((0, data.ncols())),
                labels: Vec::new(),
                inertia: 0.0,
                iterations: 0,
            };
        }

        let tolerance = self.params.tolerance * mean_variance(data);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut best: Option<KMeansModel> = None;

        for run in 0..self.params.n_init.max(1) {
            let centroids = init_plus_plus(data, k, &mut rng);
            let model = lloyd(data, centroids, self.params.max_iter.max(1), tolerance);
            debug!(run, inertia = model.inertia, iterations = model.iterations, "k-means run finished");
            let better = best.as_ref().map_or(true, |b| model.inertia < b.inertia);
            if better {
                best = Some(model);
            }
        }

        // n_init >= 1 guarantees at least one run.
        best.unwrap_or_else(|| KMeansModel {
            centroids: Array2::zeros((0, data.ncols())),
            labels: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        })
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(sample: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> Option<(usize, f64)> {
    centroids
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(idx, c)| (idx, squared_distance(sample, c)))
        .fold(None, |best, (idx, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((idx, d)),
        })
}

fn mean_variance(data: ArrayView2<'_, f64>) -> f64 {
    if data.nrows() == 0 || data.ncols() == 0 {
        return 0.0;
    }
    data.var_axis(Axis(0), 0.0).mean().unwrap_or(0.0)
}

/// k-means++ seeding: the first centroid is a uniformly random sample, each
/// further one is drawn with probability proportional to its squared
/// distance from the nearest centroid chosen so far.
fn init_plus_plus(data: ArrayView2<'_, f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));
    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    let mut closest: Vec<f64> = data
        .axis_iter(Axis(0))
        .map(|row| squared_distance(row, data.row(first)))
        .collect();

    for c in 1..k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut pick = n - 1;
            for (idx, d) in closest.iter().enumerate() {
                if *d <= 0.0 {
                    continue;
                }
                if target < *d {
                    pick = idx;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // Every sample already coincides with a centroid.
            rng.gen_range(0..n)
        };

        centroids.row_mut(c).assign(&data.row(chosen));
        for (idx, row) in data.axis_iter(Axis(0)).enumerate() {
            let d = squared_distance(row, data.row(chosen));
            if d < closest[idx] {
                closest[idx] = d;
            }
        }
    }

    centroids
}

/// Assign every sample to its nearest centroid; returns whether any label changed.
fn assign(data: ArrayView2<'_, f64>, centroids: &Array2<f64>, labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (idx, row) in data.axis_iter(Axis(0)).enumerate() {
        let (label, _) = nearest(row, centroids).unwrap_or((0, 0.0));
        if labels[idx] != label {
            labels[idx] = label;
            changed = true;
        }
    }
    changed
}

/// Move each centroid to the mean of its members and return the total
/// squared shift. Empty clusters keep their previous centroid.
fn update(data: ArrayView2<'_, f64>, labels: &[usize], centroids: &mut Array2<f64>) -> f64 {
    let k = centroids.nrows();
    let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; k];
    for (row, &label) in data.axis_iter(Axis(0)).zip(labels) {
        let mut target = sums.row_mut(label);
        target += &row;
        counts[label] += 1;
    }

    let mut shift = 0.0;
    for (c, count) in counts.into_iter().enumerate() {
        if count == 0 {
            continue;
        }
        let mean = sums.row(c).mapv(|v| v / count as f64);
        shift += squared_distance(mean.view(), centroids.row(c));
        centroids.row_mut(c).assign(&mean);
    }
    shift
}

fn lloyd(
    data: ArrayView2<'_, f64>,
    mut centroids: Array2<f64>,
    max_iter: usize,
    tolerance: f64,
) -> KMeansModel {
    let mut labels = vec![usize::MAX; data.nrows()];
    let mut iterations = 0;

    loop {
        iterations += 1;
        if !assign(data, &centroids, &mut labels) {
            break;
        }
        let shift = update(data, &labels, &mut centroids);
        if shift <= tolerance || iterations >= max_iter {
            assign(data, &centroids, &mut labels);
            break;
        }
    }

    let inertia = data
        .axis_iter(Axis(0))
        .zip(&labels)
        .map(|(row, &label)| squared_distance(row, centroids.row(label)))
        .sum();

    KMeansModel {
        centroids,
        labels,
        inertia,
        iterations,
    }
}
