//! # ncut
//!
//! Spectral graph partitioning: balanced partitions of weighted undirected
//! graphs by eigenvector embedding, minimizing a normalized-cut cost.
//!
//! ## Pipeline
//!
//! ```text
//! 1. View the graph through a Laplacian-style matrix-free operator
//! 2. Restarted Lanczos: the n_eig_vecs smallest eigenpairs
//! 3. Spectral embedding: eigenvector rows, unit-normalized per vertex
//! 4. K-means on the embedding: one partition label per vertex
//! 5. Cost analysis: edge cut and normalized cost of the labeling
//! ```
//!
//! Memory is bounded by the Lanczos restart size (O(n * restart_iter)), so
//! the pipeline handles iteration budgets far beyond the basis bound. All
//! randomness is seeded; identical configurations give identical partitions.
//!
//! ## Quick start
//!
//! ```
//! use ncut::{analyze_partition, CsrGraph, SpectralPartitioner};
//!
//! // Two triangles bridged by a weak edge.
//! let graph = CsrGraph::from_edges(6, &[
//!     (0, 1, 1.0), (1, 2, 1.0), (0, 2, 1.0),
//!     (3, 4, 1.0), (4, 5, 1.0), (3, 5, 1.0),
//!     (2, 3, 0.1),
//! ]).unwrap();
//!
//! let result = SpectralPartitioner::new(2).partition(&graph).unwrap();
//! let quality = analyze_partition(&graph, 2, &result.labels).unwrap();
//! assert!(quality.edge_cut <= 0.1 + 1e-9);
//! ```
//!
//! ## Failure model
//!
//! Input validation failures (zero partitions, negative weights, labels out
//! of range) are `Err`. Iteration-budget exhaustion is not: the best
//! estimate found is returned tagged [`Convergence::IterationLimit`], so a
//! caller can accept a degraded partition rather than fail outright.
//!
//! ## Scope
//!
//! Only the smallest eigenpairs needed for partitioning are computed; this
//! is not a general sparse eigensolver, and k-means here is specialized to
//! low-dimensional spectral embeddings. Convergence is to a local optimum
//! of the normalized-cut objective.
//!
//! ## References
//!
//! - Shi & Malik (2000). "Normalized cuts and image segmentation"
//! - Ng, Jordan, Weiss (2001). "On Spectral Clustering"
//! - Wu & Simon (2000). "Thick-restart Lanczos method"
//! - von Luxburg (2007). "A Tutorial on Spectral Clustering"

pub mod embedding;
/// Error types used across `ncut`.
pub mod error;
pub mod graph;
pub mod kmeans;
pub mod lanczos;
mod linalg;
pub mod partition;

pub use embedding::spectral_embedding;
pub use error::{Convergence, Error, Result};
pub use graph::{CsrGraph, Laplacian, NormalizedLaplacian, Operator};
pub use kmeans::{Kmeans, KmeansOutput};
pub use lanczos::{EigenPairs, Lanczos};
pub use partition::{analyze_partition, Partition, PartitionQuality, SpectralPartitioner};
