//! Spectral graph partitioning and partition-cost analysis.
//!
//! The pipeline minimizes a normalized-cut cost:
//!
//! ```text
//! cost = sum_p (edge weight cut by partition p) / (vertices in partition p)
//! ```
//!
//! by chaining the numerical stages of this crate:
//!
//! ```text
//! graph -> NormalizedLaplacian -> Lanczos -> eigenvectors
//!       -> spectral_embedding -> Kmeans -> labels
//! ```
//!
//! [`analyze_partition`] evaluates the cost and edge cut of any labeling,
//! independent of how it was produced; it is the reporting half of the
//! pipeline but also accepts arbitrary caller-supplied assignments.
//!
//! No global optimality is guaranteed: the result is a local optimum of the
//! normalized-cut objective under the configured iteration budgets.
//!
//! # Example
//!
//! ```
//! use ncut::{CsrGraph, SpectralPartitioner};
//!
//! // Two triangles joined by a single weak edge.
//! let graph = CsrGraph::from_edges(6, &[
//!     (0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0),
//!     (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0),
//!     (2, 3, 0.1),
//! ]).unwrap();
//!
//! let result = SpectralPartitioner::new(2).partition(&graph).unwrap();
//! assert_eq!(result.labels.len(), 6);
//! assert_ne!(result.labels[0], result.labels[5]);
//! ```

use crate::embedding::spectral_embedding;
use crate::error::{Convergence, Error, Result};
use crate::graph::{CsrGraph, NormalizedLaplacian};
use crate::kmeans::Kmeans;
use crate::lanczos::Lanczos;
use log::debug;
use ndarray::Array2;

/// Spectral partitioning pipeline configuration.
#[derive(Debug, Clone)]
pub struct SpectralPartitioner {
    /// Number of target partitions.
    n_parts: usize,
    /// Embedding dimensionality. `None` selects `min(n_parts, n - 1)`.
    n_eig_vecs: Option<usize>,
    /// Lanczos operator-application budget.
    max_iter_lanczos: usize,
    /// Lanczos restart bound. `None` lets the eigensolver choose.
    restart_iter_lanczos: Option<usize>,
    /// Lanczos residual tolerance.
    tol_lanczos: f64,
    /// K-means iteration budget.
    max_iter_kmeans: usize,
    /// K-means WCSS-decrease tolerance.
    tol_kmeans: f64,
    /// Deterministic k-means restarts; the lowest-WCSS labeling wins.
    kmeans_restarts: usize,
    /// Base seed for all random choices.
    seed: u64,
}

/// Result of [`SpectralPartitioner::partition`].
#[derive(Debug, Clone)]
pub struct Partition {
    /// Partition index per vertex, each in `[0, n_parts)`.
    pub labels: Vec<usize>,
    /// Smallest eigenvalues of the graph operator, ascending.
    pub eigenvalues: Vec<f64>,
    /// Matching eigenvectors as columns of an `n x n_eig_vecs` matrix.
    pub eigenvectors: Array2<f64>,
    /// Operator applications spent by the eigensolver.
    pub lanczos_iterations: usize,
    /// Lloyd iterations spent by the winning k-means run.
    pub kmeans_iterations: usize,
    /// Converged only if both the eigensolver and k-means met tolerance.
    pub convergence: Convergence,
    n_parts: usize,
}

impl Partition {
    /// Number of partitions this labeling was computed for.
    pub fn n_parts(&self) -> usize {
        self.n_parts
    }

    /// Size of each partition.
    pub fn part_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.n_parts];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Largest partition size relative to the ideal `n / n_parts`.
    /// 1.0 is perfectly balanced; larger means more skew.
    pub fn balance(&self) -> f64 {
        let n = self.labels.len();
        let largest = self.part_sizes().into_iter().max().unwrap_or(0);
        largest as f64 * self.n_parts as f64 / n as f64
    }
}

/// Quality of a partition labeling, from [`analyze_partition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionQuality {
    /// Total weight of edges whose endpoints carry different labels.
    pub edge_cut: f64,
    /// Normalized-cut cost; empty partitions contribute 0.
    pub cost: f64,
}

impl SpectralPartitioner {
    /// Create a partitioner targeting `n_parts` partitions.
    pub fn new(n_parts: usize) -> Self {
        Self {
            n_parts,
            n_eig_vecs: None,
            max_iter_lanczos: 1000,
            restart_iter_lanczos: None,
            tol_lanczos: 1e-8,
            max_iter_kmeans: 100,
            tol_kmeans: 1e-6,
            kmeans_restarts: 4,
            seed: 42,
        }
    }

    /// Set the embedding dimensionality (defaults to `min(n_parts, n - 1)`).
    pub fn with_n_eig_vecs(mut self, n_eig_vecs: usize) -> Self {
        self.n_eig_vecs = Some(n_eig_vecs);
        self
    }

    /// Set the Lanczos operator-application budget.
    pub fn with_max_iter_lanczos(mut self, max_iter: usize) -> Self {
        self.max_iter_lanczos = max_iter;
        self
    }

    /// Set the Lanczos restart bound.
    pub fn with_restart_iter_lanczos(mut self, restart_iter: usize) -> Self {
        self.restart_iter_lanczos = Some(restart_iter);
        self
    }

    /// Set the Lanczos residual tolerance.
    pub fn with_tol_lanczos(mut self, tol: f64) -> Self {
        self.tol_lanczos = tol;
        self
    }

    /// Set the k-means iteration budget.
    pub fn with_max_iter_kmeans(mut self, max_iter: usize) -> Self {
        self.max_iter_kmeans = max_iter;
        self
    }

    /// Set the k-means WCSS tolerance.
    pub fn with_tol_kmeans(mut self, tol: f64) -> Self {
        self.tol_kmeans = tol;
        self
    }

    /// Set the number of deterministic k-means restarts.
    pub fn with_kmeans_restarts(mut self, restarts: usize) -> Self {
        self.kmeans_restarts = restarts.max(1);
        self
    }

    /// Set the base random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Partition the graph, minimizing the normalized-cut cost.
    ///
    /// Hard input-validation failures are errors. Iteration-budget
    /// exhaustion in either stage is reported through the result's
    /// `convergence` field with the best labeling still attached.
    pub fn partition(&self, graph: &CsrGraph) -> Result<Partition> {
        let n = graph.n_vertices();
        if self.n_parts == 0 {
            return Err(Error::InvalidParameter {
                name: "n_parts",
                message: "must be at least 1",
            });
        }
        if self.n_parts > n {
            return Err(Error::InvalidClusterCount {
                requested: self.n_parts,
                n_items: n,
            });
        }
        if n < 2 {
            return Err(Error::InvalidParameter {
                name: "graph",
                message: "partitioning needs at least 2 vertices",
            });
        }

        let n_eig_vecs = self.n_eig_vecs.unwrap_or_else(|| self.n_parts.min(n - 1));

        let operator = NormalizedLaplacian::new(graph);
        let mut lanczos = Lanczos::new(n_eig_vecs)
            .with_max_iter(self.max_iter_lanczos)
            .with_tol(self.tol_lanczos)
            .with_seed(self.seed);
        if let Some(restart) = self.restart_iter_lanczos {
            lanczos = lanczos.with_restart_iter(restart);
        }
        let pairs = lanczos.solve(&operator)?;
        debug!(
            "eigensolve: {} pairs in {} operator applications ({:?})",
            n_eig_vecs, pairs.iterations, pairs.convergence
        );

        // Keep the trivial mode: after row normalization the constant
        // coordinate is harmless and stabilizes k-means on small graphs.
        let embedding = spectral_embedding(&pairs.vectors, false);

        // A few deterministic restarts; k-means++ can still pick an unlucky
        // first centroid on tiny problems. Lowest WCSS wins.
        let mut best: Option<crate::kmeans::KmeansOutput> = None;
        for t in 0..self.kmeans_restarts.max(1) as u64 {
            let out = Kmeans::new(self.n_parts)
                .with_max_iter(self.max_iter_kmeans)
                .with_tol(self.tol_kmeans)
                .with_seed(self.seed.wrapping_add(t))
                .cluster(&embedding)?;
            let better = match &best {
                None => true,
                Some(b) => out.wcss < b.wcss,
            };
            if better {
                best = Some(out);
            }
        }
        let clustering = best.expect("at least one k-means restart runs");
        debug!(
            "kmeans: wcss {:.6e} after {} iterations ({:?})",
            clustering.wcss, clustering.iterations, clustering.convergence
        );

        Ok(Partition {
            labels: clustering.labels,
            eigenvalues: pairs.values,
            eigenvectors: pairs.vectors,
            lanczos_iterations: pairs.iterations,
            kmeans_iterations: clustering.iterations,
            convergence: pairs.convergence.and(clustering.convergence),
            n_parts: self.n_parts,
        })
    }
}

/// Compute the edge cut and normalized-cut cost of a labeling.
///
/// Traverses every edge once. An edge contributes its weight to the cut if
/// its endpoints carry different labels; each cut edge also contributes to
/// the incident-cut sum of both endpoint partitions:
///
/// ```text
/// cost = sum_p (cut weight incident to p) / |p|
/// ```
///
/// Empty partitions contribute 0. Accepts arbitrary labelings; labels
/// outside `[0, n_parts)` are an input-validation error. Deterministic: two
/// calls with the same labeling return identical results.
pub fn analyze_partition(
    graph: &CsrGraph,
    n_parts: usize,
    labels: &[usize],
) -> Result<PartitionQuality> {
    let n = graph.n_vertices();
    if n_parts == 0 {
        return Err(Error::InvalidParameter {
            name: "n_parts",
            message: "must be at least 1",
        });
    }
    if labels.len() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: labels.len(),
        });
    }
    for (vertex, &label) in labels.iter().enumerate() {
        if label >= n_parts {
            return Err(Error::InvalidLabel {
                vertex,
                label,
                n_parts,
            });
        }
    }

    let mut part_sizes = vec![0usize; n_parts];
    for &label in labels {
        part_sizes[label] += 1;
    }

    // Each undirected edge appears as two directed arcs, so summing over
    // arcs counts a cut edge once per endpoint partition and twice for the
    // total cut.
    let mut incident_cut = vec![0.0f64; n_parts];
    let mut arc_cut = 0.0f64;
    for v in 0..n {
        let (cols, ws) = graph.neighbors(v);
        for (&u, &w) in cols.iter().zip(ws.iter()) {
            if labels[u] != labels[v] {
                incident_cut[labels[v]] += w;
                arc_cut += w;
            }
        }
    }

    let edge_cut = arc_cut / 2.0;
    let cost = incident_cut
        .iter()
        .zip(part_sizes.iter())
        .filter(|(_, &size)| size > 0)
        .map(|(&cut, &size)| cut / size as f64)
        .sum();

    Ok(PartitionQuality { edge_cut, cost })
}
