//! Spectral embedding: per-vertex coordinates from eigenvector columns.
//!
//! Row `i` of the embedding collects vertex `i`'s entries across the
//! eigenvectors, then is scaled to unit Euclidean norm so k-means operates
//! on a well-scaled geometry (Ng, Jordan, Weiss 2001). Deterministic, no
//! iteration.

use ndarray::Array2;

/// Rows below this norm are left unnormalized (isolated or degenerate
/// vertices); scaling them would divide by zero.
const ZERO_ROW_TOL: f64 = 1e-12;

/// Build a row-normalized embedding from an `n x k` eigenvector matrix.
///
/// With `skip_trivial` the first column (the near-constant mode paired with
/// eigenvalue 0 on a connected graph) is dropped, giving the Shi-Malik
/// convention. The partitioning pipeline keeps it: the constant coordinate
/// is harmless after row normalization and stabilizes k-means on small
/// graphs.
pub fn spectral_embedding(eigenvectors: &Array2<f64>, skip_trivial: bool) -> Array2<f64> {
    let n = eigenvectors.nrows();
    let k = eigenvectors.ncols();
    let first = if skip_trivial && k > 1 { 1 } else { 0 };
    let dims = k - first;

    let mut embedding = Array2::<f64>::zeros((n, dims));
    for i in 0..n {
        for j in 0..dims {
            embedding[[i, j]] = eigenvectors[[i, first + j]];
        }
        let row_norm: f64 = (0..dims)
            .map(|j| embedding[[i, j]] * embedding[[i, j]])
            .sum::<f64>()
            .sqrt();
        if row_norm > ZERO_ROW_TOL {
            for j in 0..dims {
                embedding[[i, j]] /= row_norm;
            }
        }
    }
    embedding
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rows_are_unit_norm() {
        let vecs = array![[0.5, 0.5], [3.0, 4.0], [-1.0, 0.0]];
        let emb = spectral_embedding(&vecs, false);
        for i in 0..3 {
            let norm: f64 = (0..2).map(|j| emb[[i, j]] * emb[[i, j]]).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-12, "row {i} has norm {norm}");
        }
    }

    #[test]
    fn test_zero_row_left_alone() {
        let vecs = array![[1.0, 0.0], [0.0, 0.0]];
        let emb = spectral_embedding(&vecs, false);
        assert_eq!(emb[[1, 0]], 0.0);
        assert_eq!(emb[[1, 1]], 0.0);
    }

    #[test]
    fn test_skip_trivial_drops_first_column() {
        let vecs = array![[0.5, 2.0, 1.0], [0.5, -2.0, 1.0]];
        let emb = spectral_embedding(&vecs, true);
        assert_eq!(emb.ncols(), 2);
        // Remaining columns are the second and third, row-normalized.
        let expected = 2.0 / (4.0f64 + 1.0).sqrt();
        assert!((emb[[0, 0]] - expected).abs() < 1e-12);
        assert!((emb[[1, 0]] + expected).abs() < 1e-12);
    }

    #[test]
    fn test_skip_trivial_keeps_single_column() {
        // A one-column input cannot lose its only dimension.
        let vecs = array![[1.0], [2.0]];
        let emb = spectral_embedding(&vecs, true);
        assert_eq!(emb.ncols(), 1);
    }

    #[test]
    fn test_deterministic() {
        let vecs = array![[0.3, 0.7], [0.2, -0.9]];
        let a = spectral_embedding(&vecs, false);
        let b = spectral_embedding(&vecs, false);
        assert_eq!(a, b);
    }
}
