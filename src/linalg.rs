//! Shared numeric kernels.
//!
//! Slice-level vector operations used by the Lanczos recurrence, plus the
//! small dense symmetric eigensolver (cyclic Jacobi) applied to the
//! projected Rayleigh–Ritz system. The projected system is at most
//! `restart_iter` square, so the O(m³) Jacobi sweeps are negligible next to
//! the O(n·m) operator applications.

use ndarray::Array2;
use rand::prelude::*;

#[inline]
pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
pub(crate) fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

/// y += alpha * x
#[inline]
pub(crate) fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// x *= alpha
#[inline]
pub(crate) fn scal(alpha: f64, x: &mut [f64]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// Draw a unit-norm vector of length `n` with entries centered on zero.
pub(crate) fn random_unit_vector(n: usize, rng: &mut impl Rng) -> Vec<f64> {
    loop {
        let mut v: Vec<f64> = (0..n).map(|_| rng.random::<f64>() - 0.5).collect();
        let nrm = norm(&v);
        if nrm > 1e-12 {
            scal(1.0 / nrm, &mut v);
            return v;
        }
        // Astronomically unlikely; redraw rather than divide by zero.
    }
}

/// Eigendecomposition of a small dense symmetric matrix by cyclic Jacobi
/// rotations.
///
/// Returns eigenvalues in ascending order and the matching orthonormal
/// eigenvectors as columns of the second matrix.
///
/// Input is assumed symmetric; only symmetric matrices reach this point
/// (the Rayleigh–Ritz projection V^T A V of a symmetric operator).
pub(crate) fn symmetric_eig(a: &Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let m = a.nrows();
    debug_assert_eq!(m, a.ncols());

    let mut a = a.clone();
    let mut v = Array2::<f64>::eye(m);

    if m == 0 {
        return (Vec::new(), v);
    }

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);

    for _sweep in 0..100 {
        let off: f64 = (0..m)
            .flat_map(|p| ((p + 1)..m).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum::<f64>()
            .sqrt();
        if off <= 1e-14 * scale {
            break;
        }

        for p in 0..m.saturating_sub(1) {
            for q in (p + 1)..m {
                let apq = a[[p, q]];
                if apq.abs() <= 1e-300 {
                    continue;
                }

                // Rotation angle zeroing a[p, q].
                let tau = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = if tau >= 0.0 {
                    1.0 / (tau + (1.0 + tau * tau).sqrt())
                } else {
                    -1.0 / (-tau + (1.0 + tau * tau).sqrt())
                };
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = t * c;

                // A <- J^T A J, applied as column then row updates.
                for i in 0..m {
                    let aip = a[[i, p]];
                    let aiq = a[[i, q]];
                    a[[i, p]] = c * aip - s * aiq;
                    a[[i, q]] = s * aip + c * aiq;
                }
                for i in 0..m {
                    let api = a[[p, i]];
                    let aqi = a[[q, i]];
                    a[[p, i]] = c * api - s * aqi;
                    a[[q, i]] = s * api + c * aqi;
                }

                // V <- V J
                for i in 0..m {
                    let vip = v[[i, p]];
                    let viq = v[[i, q]];
                    v[[i, p]] = c * vip - s * viq;
                    v[[i, q]] = s * vip + c * viq;
                }
            }
        }
    }

    // Sort ascending, permuting eigenvector columns to match.
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&i, &j| a[[i, i]].partial_cmp(&a[[j, j]]).unwrap_or(std::cmp::Ordering::Equal));

    let values: Vec<f64> = order.iter().map(|&i| a[[i, i]]).collect();
    let mut vectors = Array2::<f64>::zeros((m, m));
    for (dst, &src) in order.iter().enumerate() {
        for i in 0..m {
            vectors[[i, dst]] = v[[i, src]];
        }
    }

    (values, vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dot_norm_axpy() {
        let a = [1.0, 2.0, 2.0];
        let b = [2.0, 1.0, 0.0];
        assert_eq!(dot(&a, &b), 4.0);
        assert_eq!(norm(&a), 3.0);

        let mut y = [1.0, 1.0, 1.0];
        axpy(2.0, &a, &mut y);
        assert_eq!(y, [3.0, 5.0, 5.0]);
    }

    #[test]
    fn test_random_unit_vector_is_unit() {
        let mut rng = StdRng::seed_from_u64(7);
        let v = random_unit_vector(17, &mut rng);
        assert!((norm(&v) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_eig_diagonal() {
        let a = array![[3.0, 0.0], [0.0, 1.0]];
        let (vals, _) = symmetric_eig(&a);
        assert!((vals[0] - 1.0).abs() < 1e-12);
        assert!((vals[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_eig_2x2() {
        // [[2, 1], [1, 2]] has eigenvalues 1 and 3.
        let a = array![[2.0, 1.0], [1.0, 2.0]];
        let (vals, vecs) = symmetric_eig(&a);
        assert!((vals[0] - 1.0).abs() < 1e-10);
        assert!((vals[1] - 3.0).abs() < 1e-10);

        // Residual check: A v = lambda v.
        for j in 0..2 {
            for i in 0..2 {
                let av: f64 = (0..2).map(|l| a[[i, l]] * vecs[[l, j]]).sum();
                assert!((av - vals[j] * vecs[[i, j]]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_symmetric_eig_tridiagonal_path_laplacian() {
        // Path graph P4 Laplacian; eigenvalues 2 - 2cos(k*pi/4), k = 0..3.
        let a = array![
            [1.0, -1.0, 0.0, 0.0],
            [-1.0, 2.0, -1.0, 0.0],
            [0.0, -1.0, 2.0, -1.0],
            [0.0, 0.0, -1.0, 1.0],
        ];
        let (vals, vecs) = symmetric_eig(&a);
        let expected: Vec<f64> = (0..4)
            .map(|k| 2.0 - 2.0 * (k as f64 * std::f64::consts::PI / 4.0).cos())
            .collect();
        for (got, want) in vals.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }

        // Columns orthonormal.
        for i in 0..4 {
            for j in 0..4 {
                let d: f64 = (0..4).map(|l| vecs[[l, i]] * vecs[[l, j]]).sum();
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((d - want).abs() < 1e-9);
            }
        }
    }
}
