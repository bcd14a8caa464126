//! Sparse matrix utilities.

use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from triplets (row, col, value).
///
/// Duplicates are summed together.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    vals: Vec<f64>,
) -> CscMatrix<f64> {
    if rows.is_empty() {
        return CscMatrix::zeros(nrows, ncols);
    }

    let mut coo = CooMatrix::new(nrows, ncols);
    for ((row, col), val) in rows.into_iter().zip(cols).zip(vals) {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }

    CscMatrix::from(&coo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csc_from_triplets() {
        let m = csc_from_triplets(3, 3, vec![0, 1, 2], vec![0, 1, 2], vec![1.0, 2.0, 3.0]);
        assert_eq!(m.nrows(), 3);
        assert_eq!(m.ncols(), 3);
    }

    #[test]
    fn test_duplicates_are_summed() {
        let m = csc_from_triplets(2, 2, vec![0, 0], vec![1, 1], vec![1.0, 2.5]);
        assert_eq!(m.nnz(), 1);
        assert_eq!(m.values()[0], 3.5);
    }

    #[test]
    fn test_empty_is_zero() {
        let m = csc_from_triplets(4, 2, vec![], vec![], vec![]);
        assert_eq!(m.nnz(), 0);
        assert_eq!(m.nrows(), 4);
    }
}
