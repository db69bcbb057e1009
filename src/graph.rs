//! Weighted undirected graphs in CSR form and their Laplacian operators.
//!
//! The partitioning pipeline never materializes a dense matrix. It sees the
//! graph only through the [`Operator`] trait: a matrix-free linear map
//! `y = A·x` costing O(m) per application. Two Laplacian views are provided:
//!
//! ```text
//! Unnormalized:   L = D - A
//!   - Null space dimension = number of connected components
//!
//! Normalized (symmetric):   L_sym = I - D^{-1/2} A D^{-1/2}
//!   - Eigenvalues in [0, 2]
//!   - Used for spectral partitioning (Ng, Jordan, Weiss)
//! ```
//!
//! Any other representation implementing [`Operator`] can be fed to the
//! eigensolver directly; [`CsrGraph`] is the reference implementation.

use crate::error::{Error, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Matrix-free symmetric linear operator.
///
/// Implementations must be deterministic and side-effect-free: two calls to
/// [`Operator::apply`] with the same input write the same output.
pub trait Operator {
    /// Dimension n of the operator (number of vertices).
    fn order(&self) -> usize;

    /// Compute `y = A·x`. Both slices have length [`Operator::order`].
    fn apply(&self, x: &[f64], y: &mut [f64]);
}

/// Immutable weighted undirected graph in compressed sparse row form.
///
/// Each undirected edge is stored twice, once per endpoint. Weights must be
/// finite and non-negative; this is validated at construction so the
/// numerical pipeline never re-checks. The graph may be disconnected.
#[derive(Debug, Clone)]
pub struct CsrGraph {
    row_offsets: Vec<usize>,
    col_indices: Vec<usize>,
    weights: Vec<f64>,
}

impl CsrGraph {
    /// Build a graph from raw CSR arrays.
    ///
    /// `row_offsets` has `n + 1` entries; `col_indices` and `weights` have
    /// one entry per directed arc. The caller is responsible for symmetry
    /// (each undirected edge present in both endpoint rows); weights are
    /// validated to be finite and non-negative.
    pub fn from_csr(
        row_offsets: Vec<usize>,
        col_indices: Vec<usize>,
        weights: Vec<f64>,
    ) -> Result<Self> {
        if row_offsets.len() <= 1 {
            return Err(Error::EmptyInput);
        }
        let n = row_offsets.len() - 1;
        let nnz = col_indices.len();

        if row_offsets[0] != 0 || row_offsets[n] != nnz {
            return Err(Error::InvalidParameter {
                name: "row_offsets",
                message: "must start at 0 and end at the number of arcs",
            });
        }
        if weights.len() != nnz {
            return Err(Error::DimensionMismatch {
                expected: nnz,
                found: weights.len(),
            });
        }

        // Offsets must be fully validated before they are used to index.
        for v in 0..n {
            if row_offsets[v] > row_offsets[v + 1] {
                return Err(Error::InvalidParameter {
                    name: "row_offsets",
                    message: "must be non-decreasing",
                });
            }
        }

        for v in 0..n {
            for idx in row_offsets[v]..row_offsets[v + 1] {
                if col_indices[idx] >= n {
                    return Err(Error::DimensionMismatch {
                        expected: n,
                        found: col_indices[idx],
                    });
                }
                let w = weights[idx];
                if !w.is_finite() {
                    return Err(Error::NonFiniteWeight { vertex: v });
                }
                if w < 0.0 {
                    return Err(Error::NegativeWeight { vertex: v, value: w });
                }
            }
        }
        Ok(Self {
            row_offsets,
            col_indices,
            weights,
        })
    }

    /// Build a graph from an undirected edge list.
    ///
    /// Each `(u, v, w)` is inserted in both directions. Self-loops are kept
    /// and contribute to the vertex degree.
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        for &(u, v, w) in edges {
            if u >= n || v >= n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: u.max(v),
                });
            }
            if !w.is_finite() {
                return Err(Error::NonFiniteWeight { vertex: u });
            }
            if w < 0.0 {
                return Err(Error::NegativeWeight { vertex: u, value: w });
            }
        }

        let mut counts = vec![0usize; n];
        for &(u, v, _) in edges {
            counts[u] += 1;
            if u != v {
                counts[v] += 1;
            }
        }

        let mut row_offsets = vec![0usize; n + 1];
        for v in 0..n {
            row_offsets[v + 1] = row_offsets[v] + counts[v];
        }

        let nnz = row_offsets[n];
        let mut col_indices = vec![0usize; nnz];
        let mut weights = vec![0.0f64; nnz];
        let mut cursor = row_offsets.clone();

        for &(u, v, w) in edges {
            col_indices[cursor[u]] = v;
            weights[cursor[u]] = w;
            cursor[u] += 1;
            if u != v {
                col_indices[cursor[v]] = u;
                weights[cursor[v]] = w;
                cursor[v] += 1;
            }
        }

        Ok(Self {
            row_offsets,
            col_indices,
            weights,
        })
    }

    /// Number of vertices n.
    pub fn n_vertices(&self) -> usize {
        self.row_offsets.len() - 1
    }

    /// Number of undirected edges m (self-loops count once).
    pub fn n_edges(&self) -> usize {
        let self_loops = (0..self.n_vertices())
            .map(|v| {
                let (cols, _) = self.neighbors(v);
                cols.iter().filter(|&&u| u == v).count()
            })
            .sum::<usize>();
        (self.col_indices.len() - self_loops) / 2 + self_loops
    }

    /// Neighbor indices and weights of vertex `v`.
    pub fn neighbors(&self, v: usize) -> (&[usize], &[f64]) {
        let lo = self.row_offsets[v];
        let hi = self.row_offsets[v + 1];
        (&self.col_indices[lo..hi], &self.weights[lo..hi])
    }

    /// Weighted degree of vertex `v`.
    pub fn degree(&self, v: usize) -> f64 {
        let (_, ws) = self.neighbors(v);
        ws.iter().sum()
    }

    /// Weighted degrees of all vertices.
    pub fn degrees(&self) -> Vec<f64> {
        (0..self.n_vertices()).map(|v| self.degree(v)).collect()
    }

    /// Total weight over undirected edges (each edge counted once).
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum::<f64>() / 2.0
    }
}

/// Unnormalized Laplacian view `L = D - A` over a [`CsrGraph`].
#[derive(Debug)]
pub struct Laplacian<'a> {
    graph: &'a CsrGraph,
    degrees: Vec<f64>,
}

impl<'a> Laplacian<'a> {
    /// Precompute degrees for repeated applications.
    pub fn new(graph: &'a CsrGraph) -> Self {
        let degrees = graph.degrees();
        Self { graph, degrees }
    }
}

impl Operator for Laplacian<'_> {
    fn order(&self) -> usize {
        self.graph.n_vertices()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.order());
        debug_assert_eq!(y.len(), self.order());

        #[cfg(feature = "parallel")]
        y.par_iter_mut().enumerate().for_each(|(v, yv)| {
            let (cols, ws) = self.graph.neighbors(v);
            let mut acc = 0.0;
            for (&u, &w) in cols.iter().zip(ws.iter()) {
                acc += w * x[u];
            }
            *yv = self.degrees[v] * x[v] - acc;
        });

        #[cfg(not(feature = "parallel"))]
        for (v, yv) in y.iter_mut().enumerate() {
            let (cols, ws) = self.graph.neighbors(v);
            let mut acc = 0.0;
            for (&u, &w) in cols.iter().zip(ws.iter()) {
                acc += w * x[u];
            }
            *yv = self.degrees[v] * x[v] - acc;
        }
    }
}

/// Symmetric normalized Laplacian view `L_sym = I - D^{-1/2} A D^{-1/2}`.
///
/// Isolated vertices (zero degree) get an identity row, which keeps the
/// operator well-defined on disconnected and degenerate graphs.
#[derive(Debug)]
pub struct NormalizedLaplacian<'a> {
    graph: &'a CsrGraph,
    inv_sqrt_deg: Vec<f64>,
}

impl<'a> NormalizedLaplacian<'a> {
    /// Precompute `D^{-1/2}` for repeated applications.
    pub fn new(graph: &'a CsrGraph) -> Self {
        let inv_sqrt_deg = graph
            .degrees()
            .iter()
            .map(|&d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 })
            .collect();
        Self {
            graph,
            inv_sqrt_deg,
        }
    }
}

impl Operator for NormalizedLaplacian<'_> {
    fn order(&self) -> usize {
        self.graph.n_vertices()
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        debug_assert_eq!(x.len(), self.order());
        debug_assert_eq!(y.len(), self.order());

        #[cfg(feature = "parallel")]
        y.par_iter_mut().enumerate().for_each(|(v, yv)| {
            let (cols, ws) = self.graph.neighbors(v);
            let s = &self.inv_sqrt_deg;
            let mut acc = 0.0;
            for (&u, &w) in cols.iter().zip(ws.iter()) {
                acc += w * s[u] * x[u];
            }
            *yv = x[v] - s[v] * acc;
        });

        #[cfg(not(feature = "parallel"))]
        for (v, yv) in y.iter_mut().enumerate() {
            let (cols, ws) = self.graph.neighbors(v);
            let s = &self.inv_sqrt_deg;
            let mut acc = 0.0;
            for (&u, &w) in cols.iter().zip(ws.iter()) {
                acc += w * s[u] * x[u];
            }
            *yv = x[v] - s[v] * acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path3() -> CsrGraph {
        // 0 -- 1 -- 2, unit weights.
        CsrGraph::from_edges(3, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap()
    }

    #[test]
    fn test_from_edges_counts() {
        let g = path3();
        assert_eq!(g.n_vertices(), 3);
        assert_eq!(g.n_edges(), 2);
        assert_eq!(g.degree(0), 1.0);
        assert_eq!(g.degree(1), 2.0);
        assert_eq!(g.total_weight(), 2.0);
    }

    #[test]
    fn test_from_csr_matches_from_edges() {
        let g = CsrGraph::from_csr(
            vec![0, 1, 3, 4],
            vec![1, 0, 2, 1],
            vec![1.0, 1.0, 1.0, 1.0],
        )
        .unwrap();
        assert_eq!(g.n_vertices(), 3);
        assert_eq!(g.degree(1), 2.0);
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = CsrGraph::from_edges(2, &[(0, 1, -1.0)]).unwrap_err();
        assert!(matches!(err, Error::NegativeWeight { .. }));
    }

    #[test]
    fn test_rejects_nan_weight() {
        let err = CsrGraph::from_edges(2, &[(0, 1, f64::NAN)]).unwrap_err();
        assert!(matches!(err, Error::NonFiniteWeight { .. }));
    }

    #[test]
    fn test_rejects_empty_graph() {
        let err = CsrGraph::from_edges(0, &[]).unwrap_err();
        assert_eq!(err, Error::EmptyInput);
    }

    #[test]
    fn test_rejects_out_of_range_endpoint() {
        let err = CsrGraph::from_edges(2, &[(0, 5, 1.0)]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_laplacian_annihilates_constants() {
        let g = path3();
        let lap = Laplacian::new(&g);
        let x = vec![1.0; 3];
        let mut y = vec![0.0; 3];
        lap.apply(&x, &mut y);
        for yv in y {
            assert!(yv.abs() < 1e-12);
        }
    }

    #[test]
    fn test_laplacian_apply_path() {
        let g = path3();
        let lap = Laplacian::new(&g);
        let x = vec![1.0, 0.0, -1.0];
        let mut y = vec![0.0; 3];
        lap.apply(&x, &mut y);
        // L x = [d0*1 - 0, 2*0 - (1 - 1), d2*(-1) - 0] = [1, 0, -1]
        assert!((y[0] - 1.0).abs() < 1e-12);
        assert!(y[1].abs() < 1e-12);
        assert!((y[2] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_laplacian_annihilates_sqrt_degree() {
        // L_sym (D^{1/2} 1) = 0 for a connected graph.
        let g = path3();
        let op = NormalizedLaplacian::new(&g);
        let x: Vec<f64> = g.degrees().iter().map(|d| d.sqrt()).collect();
        let mut y = vec![0.0; 3];
        op.apply(&x, &mut y);
        for yv in y {
            assert!(yv.abs() < 1e-12);
        }
    }

    #[test]
    fn test_normalized_laplacian_isolated_vertex() {
        let g = CsrGraph::from_edges(3, &[(0, 1, 2.0)]).unwrap();
        let op = NormalizedLaplacian::new(&g);
        let x = vec![0.0, 0.0, 3.0];
        let mut y = vec![0.0; 3];
        op.apply(&x, &mut y);
        // Identity row on the isolated vertex.
        assert!((y[2] - 3.0).abs() < 1e-12);
    }
}
