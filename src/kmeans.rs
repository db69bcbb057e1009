//! K-means clustering specialized to low-dimensional spectral embeddings.
//!
//! Lloyd's algorithm with k-means++ initialization. The objective is the
//! within-cluster sum of squares (WCSS):
//!
//! ```text
//! WCSS = sum_k sum_{i in C_k} ||x_i - mu_k||^2
//! ```
//!
//! Each step either decreases WCSS or leaves it unchanged, and WCSS is
//! bounded below by 0, so the iteration converges to a local optimum.
//! Spectral embeddings are a friendly regime for k-means: few dimensions
//! (one per eigenvector) and unit-norm rows, so spherical clusters are a
//! reasonable assumption.
//!
//! # Determinism
//!
//! Every random choice flows from the configured seed: initialization is
//! k-means++ over a seeded RNG, assignment ties break toward the lowest
//! centroid index, and empty clusters are re-seeded from the point farthest
//! from its assigned centroid rather than a random redraw. Two runs with
//! the same seed produce identical labels.

use crate::error::{Convergence, Error, Result};
use log::trace;
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clusterer over embedding rows.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum Lloyd iterations.
    max_iter: usize,
    /// Stop when the WCSS decrease between consecutive iterations drops
    /// below this.
    tol: f64,
    /// Seed for k-means++ initialization.
    seed: u64,
}

/// Labeling produced by [`Kmeans::cluster`].
#[derive(Debug, Clone)]
pub struct KmeansOutput {
    /// Cluster index per row, each in `[0, k)`.
    pub labels: Vec<usize>,
    /// Lloyd iterations performed.
    pub iterations: usize,
    /// Final within-cluster sum of squares.
    pub wcss: f64,
    /// Whether the WCSS tolerance was met within the budget.
    pub convergence: Convergence,
}

impl Kmeans {
    /// Create a clusterer for `k` clusters.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-6,
            seed: 42,
        }
    }

    /// Set the iteration budget.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the WCSS-decrease convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster embedding rows into `k` groups.
    ///
    /// Budget exhaustion is reported through the output's `convergence`
    /// field; the best labeling found is still returned.
    pub fn cluster(&self, data: &Array2<f64>) -> Result<KmeansOutput> {
        let n = data.nrows();
        let d = data.ncols();
        if n == 0 || d == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if !(self.tol >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be non-negative",
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.init_centroids(data, &mut rng);

        let mut labels = vec![0usize; n];
        let mut dists = vec![0.0f64; n];
        let mut prev_wcss = f64::INFINITY;
        let mut wcss = f64::INFINITY;
        let mut iterations = 0usize;
        let mut convergence = Convergence::IterationLimit;

        for iter in 0..self.max_iter {
            iterations = iter + 1;

            // Assignment step: nearest centroid, ties to the lowest index.
            #[cfg(feature = "parallel")]
            {
                let centroids_ref = &centroids;
                labels
                    .par_iter_mut()
                    .zip(dists.par_iter_mut())
                    .enumerate()
                    .for_each(|(i, (label, dist))| {
                        let (best, best_dist) = nearest_centroid(data.row(i), centroids_ref);
                        *label = best;
                        *dist = best_dist;
                    });
            }

            #[cfg(not(feature = "parallel"))]
            for (i, (label, dist)) in labels.iter_mut().zip(dists.iter_mut()).enumerate() {
                let (best, best_dist) = nearest_centroid(data.row(i), &centroids);
                *label = best;
                *dist = best_dist;
            }

            wcss = dists.iter().sum();
            trace!("kmeans iteration {iterations}: wcss {wcss:.6e}");

            if prev_wcss - wcss < self.tol {
                convergence = Convergence::Converged;
                break;
            }
            prev_wcss = wcss;

            // Update step: centroids move to the mean of their rows.
            let mut sums = Array2::<f64>::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (i, &label) in labels.iter().enumerate() {
                for j in 0..d {
                    sums[[label, j]] += data[[i, j]];
                }
                counts[label] += 1;
            }

            for c in 0..self.k {
                if counts[c] > 0 {
                    for j in 0..d {
                        centroids[[c, j]] = sums[[c, j]] / counts[c] as f64;
                    }
                } else {
                    // Empty cluster: deterministically re-seed from the
                    // point currently worst served by its centroid.
                    let farthest = dists
                        .iter()
                        .enumerate()
                        .max_by(|(_, a), (_, b)| {
                            a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    for j in 0..d {
                        centroids[[c, j]] = data[[farthest, j]];
                    }
                }
            }
        }

        Ok(KmeansOutput {
            labels,
            iterations,
            wcss,
            convergence,
        })
    }

    /// K-means++ initialization: first centroid from the seeded RNG, the
    /// rest sampled proportional to squared distance from the nearest
    /// already-chosen centroid.
    fn init_centroids(&self, data: &Array2<f64>, rng: &mut impl Rng) -> Array2<f64> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::<f64>::zeros((self.k, d));

        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        for c in 1..self.k {
            let mut distances: Vec<f64> = Vec::with_capacity(n);
            for i in 0..n {
                let point = data.row(i);
                let min_dist = (0..c)
                    .map(|j| squared_distance(point, centroids.row(j)))
                    .fold(f64::MAX, f64::min);
                distances.push(min_dist);
            }

            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                // All points coincide with existing centroids.
                let idx = rng.random_range(0..n);
                centroids.row_mut(c).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (i, &dist) in distances.iter().enumerate() {
                cumsum += dist;
                if cumsum >= threshold {
                    selected = i;
                    break;
                }
            }
            centroids.row_mut(c).assign(&data.row(selected));
        }

        centroids
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index and squared distance of the nearest centroid; strict comparison
/// keeps the lowest index on ties.
fn nearest_centroid(point: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = 0usize;
    let mut best_dist = f64::MAX;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = c;
        }
    }
    (best, best_dist)
}
