//! Restarted Lanczos eigensolver for the smallest eigenpairs of a
//! symmetric matrix-free operator.
//!
//! # Algorithm
//!
//! ```text
//! 1. Start from a seeded random unit vector
//! 2. Expand a Krylov basis by repeated operator application, with full
//!    re-orthogonalization (three-term recurrence alone loses orthogonality)
//! 3. Project onto the basis: T = V^T A V (small dense symmetric system)
//! 4. Rayleigh-Ritz: eigenpairs of T approximate extreme eigenpairs of A
//! 5. Residual test per pair: |beta * s_mi| < tol
//! 6. Not converged and basis at the restart bound: thick restart, keeping
//!    only the wanted Ritz vectors, and resume from the current residual
//! ```
//!
//! The restart bounds memory to O(n * restart_iter) regardless of the total
//! iteration budget. Breakdown (a Krylov vector with near-zero norm, which
//! signals an invariant subspace) is handled by injecting a fresh random
//! direction orthogonal to the basis; this is what lets the solver resolve
//! eigenvalue multiplicities on disconnected graphs, where the Krylov space
//! of a single starting vector can never span the full null space.
//!
//! # References
//!
//! - Lanczos (1950). "An iteration method for the solution of the
//!   eigenvalue problem of linear differential and integral operators"
//! - Wu & Simon (2000). "Thick-restart Lanczos method for large symmetric
//!   eigenvalue problems"

use crate::error::{Convergence, Error, Result};
use crate::graph::Operator;
use crate::linalg::{axpy, dot, norm, random_unit_vector, scal, symmetric_eig};
use log::{debug, trace};
use ndarray::{s, Array2};
use rand::prelude::*;

/// A Krylov vector below this norm signals an invariant subspace.
const BREAKDOWN_TOL: f64 = 1e-12;

/// Restarted Lanczos eigensolver configuration.
///
/// Produces the `n_eig_vecs` smallest eigenvalues (ascending) and matching
/// eigenvectors of an [`Operator`].
#[derive(Debug, Clone)]
pub struct Lanczos {
    /// Number of smallest eigenpairs to compute.
    n_eig_vecs: usize,
    /// Budget of operator applications.
    max_iter: usize,
    /// Maximum Krylov basis size before an implicit restart.
    /// `None` selects `max(2 * n_eig_vecs + 1, 16)` capped at n.
    restart_iter: Option<usize>,
    /// Per-eigenpair residual tolerance.
    tol: f64,
    /// Seed for the starting vector and breakdown re-injections.
    seed: u64,
}

/// Eigenpairs returned by [`Lanczos::solve`].
#[derive(Debug, Clone)]
pub struct EigenPairs {
    /// Eigenvalues in ascending order, `n_eig_vecs` of them.
    pub values: Vec<f64>,
    /// Eigenvectors as columns of an `n x n_eig_vecs` matrix; column `j`
    /// pairs with `values[j]`.
    pub vectors: Array2<f64>,
    /// Operator applications performed.
    pub iterations: usize,
    /// Whether every requested pair met the residual tolerance.
    pub convergence: Convergence,
}

impl Lanczos {
    /// Create a solver for the `n_eig_vecs` smallest eigenpairs.
    pub fn new(n_eig_vecs: usize) -> Self {
        Self {
            n_eig_vecs,
            max_iter: 1000,
            restart_iter: None,
            tol: 1e-8,
            seed: 42,
        }
    }

    /// Set the budget of operator applications.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the Krylov basis bound triggering implicit restarts.
    pub fn with_restart_iter(mut self, restart_iter: usize) -> Self {
        self.restart_iter = Some(restart_iter);
        self
    }

    /// Set the per-eigenpair residual tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self, n: usize) -> Result<usize> {
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        let k = self.n_eig_vecs;
        if k == 0 {
            return Err(Error::InvalidParameter {
                name: "n_eig_vecs",
                message: "must be at least 1",
            });
        }
        if k >= n {
            return Err(Error::InvalidParameter {
                name: "n_eig_vecs",
                message: "must be at most n - 1",
            });
        }
        if !(self.tol > 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be positive",
            });
        }
        if self.max_iter < k + 1 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least n_eig_vecs + 1",
            });
        }
        let ncv = match self.restart_iter {
            Some(r) => {
                if r < k + 1 {
                    return Err(Error::InvalidParameter {
                        name: "restart_iter",
                        message: "must be at least n_eig_vecs + 1",
                    });
                }
                r.min(n)
            }
            None => (2 * k + 1).max(16).min(n),
        };
        Ok(ncv)
    }

    /// Compute the `n_eig_vecs` smallest eigenpairs of `op`.
    ///
    /// Iteration-budget exhaustion is not an error: the best estimates found
    /// so far are returned with [`Convergence::IterationLimit`] so the
    /// caller can proceed degraded rather than fail outright.
    pub fn solve<O: Operator>(&self, op: &O) -> Result<EigenPairs> {
        let n = op.order();
        let ncv = self.validate(n)?;
        let k = self.n_eig_vecs;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut r = random_unit_vector(n, &mut rng);
        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(ncv);
        let mut t = Array2::<f64>::zeros((ncv, ncv));
        let mut w = vec![0.0f64; n];
        let mut beta = 0.0f64;
        let mut matvecs = 0usize;
        let mut restarts = 0usize;

        loop {
            // Expansion phase: grow the basis to the restart bound.
            while basis.len() < ncv && matvecs < self.max_iter {
                let j = basis.len();
                basis.push(r.clone());
                op.apply(&basis[j], &mut w);
                matvecs += 1;

                // Full re-orthogonalization, two classical Gram-Schmidt
                // passes. The accumulated coefficients form column j of the
                // projected matrix T = V^T A V, which also recovers the
                // coupling entries left implicit by a thick restart.
                for _pass in 0..2 {
                    for (i, v) in basis.iter().enumerate() {
                        let h = dot(v, &w);
                        axpy(-h, v, &mut w);
                        t[[i, j]] += h;
                    }
                }
                for i in 0..j {
                    t[[j, i]] = t[[i, j]];
                }

                beta = norm(&w);
                if beta <= BREAKDOWN_TOL {
                    trace!("lanczos breakdown at basis size {}", basis.len());
                    beta = 0.0;
                    match orthogonal_injection(&basis, n, &mut rng) {
                        Some(fresh) => r = fresh,
                        // Basis spans the whole space; nothing left to add.
                        None => break,
                    }
                } else {
                    r.copy_from_slice(&w);
                    scal(1.0 / beta, &mut r);
                }
            }

            // Rayleigh-Ritz on the projected system.
            let m = basis.len();
            let (theta, s_mat) = symmetric_eig(&t.slice(s![0..m, 0..m]).to_owned());

            let nconv = (0..k.min(m))
                .filter(|&i| (beta * s_mat[[m - 1, i]]).abs() < self.tol)
                .count();
            trace!(
                "lanczos rayleigh-ritz: basis {m}, matvecs {matvecs}, converged {nconv}/{k}"
            );

            if nconv >= k || matvecs >= self.max_iter || m >= n {
                let convergence = if nconv >= k {
                    Convergence::Converged
                } else {
                    Convergence::IterationLimit
                };
                debug!(
                    "lanczos done: {matvecs} operator applications, {restarts} restarts, {nconv}/{k} converged"
                );
                let mut vectors = Array2::<f64>::zeros((n, k));
                for j in 0..k {
                    let x = ritz_vector(&basis, &s_mat, j);
                    for i in 0..n {
                        vectors[[i, j]] = x[i];
                    }
                }
                return Ok(EigenPairs {
                    values: theta[..k].to_vec(),
                    vectors,
                    iterations: matvecs,
                    convergence,
                });
            }

            // Thick restart: compress to the wanted Ritz vectors and resume
            // from the current residual direction.
            let l = k.min(m - 1);
            let mut new_basis: Vec<Vec<f64>> = Vec::with_capacity(ncv);
            for j in 0..l {
                new_basis.push(ritz_vector(&basis, &s_mat, j));
            }
            basis = new_basis;
            t.fill(0.0);
            for (j, &value) in theta.iter().take(l).enumerate() {
                t[[j, j]] = value;
            }
            restarts += 1;
            debug!("lanczos restart {restarts}: kept {l} ritz vectors, matvecs {matvecs}");
        }
    }
}

/// Linear combination of basis vectors by column `j` of the Ritz coordinate
/// matrix, normalized to unit length.
fn ritz_vector(basis: &[Vec<f64>], s_mat: &Array2<f64>, j: usize) -> Vec<f64> {
    let n = basis[0].len();
    let mut x = vec![0.0f64; n];
    for (i, v) in basis.iter().enumerate() {
        axpy(s_mat[[i, j]], v, &mut x);
    }
    let nrm = norm(&x);
    if nrm > 0.0 {
        scal(1.0 / nrm, &mut x);
    }
    x
}

/// Draw a random direction orthogonal to the basis, unit-normalized.
/// Returns `None` when the basis already spans the whole space.
fn orthogonal_injection(
    basis: &[Vec<f64>],
    n: usize,
    rng: &mut impl Rng,
) -> Option<Vec<f64>> {
    if basis.len() >= n {
        return None;
    }
    for _attempt in 0..8 {
        let mut candidate = random_unit_vector(n, rng);
        for _pass in 0..2 {
            for v in basis {
                let h = dot(v, &candidate);
                axpy(-h, v, &mut candidate);
            }
        }
        let nrm = norm(&candidate);
        if nrm > 1e-8 {
            scal(1.0 / nrm, &mut candidate);
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CsrGraph, Laplacian, NormalizedLaplacian};

    fn path(n: usize) -> CsrGraph {
        let edges: Vec<(usize, usize, f64)> =
            (0..n - 1).map(|i| (i, i + 1, 1.0)).collect();
        CsrGraph::from_edges(n, &edges).unwrap()
    }

    fn ring(n: usize) -> CsrGraph {
        let edges: Vec<(usize, usize, f64)> =
            (0..n).map(|i| (i, (i + 1) % n, 1.0)).collect();
        CsrGraph::from_edges(n, &edges).unwrap()
    }

    fn residual<O: crate::graph::Operator>(op: &O, pairs: &EigenPairs, j: usize) -> f64 {
        let n = op.order();
        let x: Vec<f64> = (0..n).map(|i| pairs.vectors[[i, j]]).collect();
        let mut ax = vec![0.0; n];
        op.apply(&x, &mut ax);
        (0..n)
            .map(|i| (ax[i] - pairs.values[j] * x[i]).powi(2))
            .sum::<f64>()
            .sqrt()
    }

    #[test]
    fn test_path_laplacian_smallest_eigenvalues() {
        // P8 Laplacian eigenvalues: 2 - 2cos(k*pi/8).
        let g = path(8);
        let lap = Laplacian::new(&g);
        let pairs = Lanczos::new(3).with_tol(1e-10).solve(&lap).unwrap();

        assert_eq!(pairs.values.len(), 3);
        assert_eq!(pairs.convergence, Convergence::Converged);
        for j in 0..3 {
            let expected = 2.0 - 2.0 * (j as f64 * std::f64::consts::PI / 8.0).cos();
            assert!(
                (pairs.values[j] - expected).abs() < 1e-7,
                "eigenvalue {j}: got {}, want {expected}",
                pairs.values[j]
            );
        }
    }

    #[test]
    fn test_eigenvalues_ascending_and_counted() {
        let g = ring(12);
        let lap = Laplacian::new(&g);
        let pairs = Lanczos::new(4).solve(&lap).unwrap();

        assert_eq!(pairs.values.len(), 4);
        assert_eq!(pairs.vectors.ncols(), 4);
        assert_eq!(pairs.vectors.nrows(), 12);
        for w in pairs.values.windows(2) {
            assert!(w[0] <= w[1] + 1e-10, "not ascending: {:?}", pairs.values);
        }
    }

    #[test]
    fn test_residuals_small_on_convergence() {
        let g = path(10);
        let lap = Laplacian::new(&g);
        let pairs = Lanczos::new(2).with_tol(1e-10).solve(&lap).unwrap();
        for j in 0..2 {
            assert!(residual(&lap, &pairs, j) < 1e-6);
        }
    }

    #[test]
    fn test_thick_restart_matches_unrestarted() {
        let g = ring(20);
        let lap = Laplacian::new(&g);

        let full = Lanczos::new(2).with_tol(1e-10).solve(&lap).unwrap();
        let restarted = Lanczos::new(2)
            .with_restart_iter(6)
            .with_max_iter(500)
            .with_tol(1e-10)
            .solve(&lap)
            .unwrap();

        assert_eq!(restarted.convergence, Convergence::Converged);
        for j in 0..2 {
            assert!(
                (full.values[j] - restarted.values[j]).abs() < 1e-6,
                "restart changed eigenvalue {j}: {} vs {}",
                full.values[j],
                restarted.values[j]
            );
        }
    }

    #[test]
    fn test_disconnected_graph_null_space_multiplicity() {
        // Two triangles: the Laplacian null space is two-dimensional, which
        // a single Krylov chain cannot span. Breakdown re-injection must
        // recover both zero modes.
        let g = CsrGraph::from_edges(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (0, 2, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (3, 5, 1.0),
            ],
        )
        .unwrap();
        let lap = Laplacian::new(&g);
        let pairs = Lanczos::new(2).with_tol(1e-9).solve(&lap).unwrap();

        assert!(pairs.values[0].abs() < 1e-7);
        assert!(pairs.values[1].abs() < 1e-7, "second zero mode missed: {:?}", pairs.values);
    }

    #[test]
    fn test_iteration_limit_returns_best_effort() {
        let g = ring(30);
        let lap = Laplacian::new(&g);
        let pairs = Lanczos::new(3)
            .with_max_iter(4)
            .with_tol(1e-14)
            .solve(&lap)
            .unwrap();

        assert_eq!(pairs.convergence, Convergence::IterationLimit);
        assert_eq!(pairs.values.len(), 3);
        assert!(pairs.iterations <= 4);
    }

    #[test]
    fn test_normalized_laplacian_zero_mode() {
        let g = path(6);
        let op = NormalizedLaplacian::new(&g);
        let pairs = Lanczos::new(2).with_tol(1e-10).solve(&op).unwrap();
        assert!(pairs.values[0].abs() < 1e-8);
        assert!(pairs.values[1] > 1e-4);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let g = path(4);
        let lap = Laplacian::new(&g);

        assert!(Lanczos::new(0).solve(&lap).is_err());
        assert!(Lanczos::new(4).solve(&lap).is_err()); // n_eig_vecs >= n
        assert!(Lanczos::new(2).with_tol(0.0).solve(&lap).is_err());
        assert!(Lanczos::new(2).with_restart_iter(2).solve(&lap).is_err());
    }

    #[test]
    fn test_full_subspace_boundary() {
        // n_eig_vecs = n - 1 forces the basis to span nearly all of R^n.
        let g = ring(4);
        let lap = Laplacian::new(&g);
        let pairs = Lanczos::new(3).with_tol(1e-10).solve(&lap).unwrap();
        assert_eq!(pairs.values.len(), 3);
        // C4 spectrum: 0, 2, 2, 4.
        assert!(pairs.values[0].abs() < 1e-7);
        assert!((pairs.values[1] - 2.0).abs() < 1e-6);
        assert!((pairs.values[2] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let g = ring(10);
        let lap = Laplacian::new(&g);
        let a = Lanczos::new(2).with_seed(7).solve(&lap).unwrap();
        let b = Lanczos::new(2).with_seed(7).solve(&lap).unwrap();
        assert_eq!(a.values, b.values);
        assert_eq!(a.iterations, b.iterations);
    }
}
