//! Ordinary least squares solver.
//!
//! The seasonal-trend model solves one small regression per metric:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD rather than QR: the design matrix is tall and may be rank deficient
//!   (e.g. every sample sharing one period, or a sine column that is identically
//!   zero on monthly data). SVD returns the minimum-norm solution in that case.
//! - Progressively looser tolerances before giving up.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return None;
    }
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build a design matrix from row vectors of equal width.
pub fn design_matrix(rows: &[Vec<f64>]) -> Option<DMatrix<f64>> {
    let width = rows.first()?.len();
    if width == 0 || rows.iter().any(|r| r.len() != width) {
        return None;
    }
    Some(DMatrix::from_fn(rows.len(), width, |i, j| rows[i][j]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn rank_deficient_system_returns_min_norm_solution() {
        // Second column is all zeros: the slope is unidentifiable.
        let x = design_matrix(&[vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let y = DVector::from_row_slice(&[4.0, 5.0, 6.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 5.0).abs() < 1e-9);
        assert!(beta[1].abs() < 1e-9);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(design_matrix(&[vec![1.0], vec![1.0, 2.0]]).is_none());
        assert!(design_matrix(&[]).is_none());
    }
}
