//! Dense linear algebra on top of nalgebra.
//!
//! The pipeline keeps its data in `ndarray`; these helpers convert at the
//! boundary and solve the two decompositions CSP needs.
use nalgebra::{Cholesky, DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{bail, Result};

pub fn to_dmatrix(a: ArrayView2<'_, f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Solution of the symmetric-definite problem `A w = λ B w`.
#[derive(Debug, Clone)]
pub struct GeneralizedEigen {
    /// Ascending.
    pub eigenvalues: Array1<f64>,
    /// One eigenvector per column, in eigenvalue order, with `Wᵀ B W = I`.
    pub eigenvectors: Array2<f64>,
}

/// Solve `A w = λ B w` for symmetric `A` and symmetric positive definite `B`.
///
/// With `B = L Lᵀ`, the problem reduces to the ordinary symmetric problem
/// `L⁻¹ A L⁻ᵀ v = λ v` and `w = L⁻ᵀ v`. Each eigenvector is flipped so
/// that its largest-magnitude entry is positive.
///
/// # Errors
///
/// [`Error::NumericInstability`](crate::Error::NumericInstability) if `B` is
/// not positive definite or an eigenvalue is not finite;
/// [`Error::Shape`](crate::Error::Shape) if the matrices are not square and
/// equally sized.
pub fn generalized_eigh(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) -> Result<GeneralizedEigen> {
    let n = a.nrows();
    if a.dim() != (n, n) || b.dim() != (n, n) {
        bail!(Shape, "generalized eigenproblem needs two {n}×{n} matrices, got {:?} and {:?}", a.dim(), b.dim());
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        bail!(NumericInstability, "non-finite entry in covariance matrix");
    }

    let chol = match Cholesky::new(to_dmatrix(b)) {
        Some(c) => c,
        None => bail!(NumericInstability, "composite covariance is not positive definite"),
    };
    let l = chol.l();
    let l_inv = match l.solve_lower_triangular(&DMatrix::identity(n, n)) {
        Some(m) => m,
        None => bail!(NumericInstability, "singular Cholesky factor"),
    };

    let p = &l_inv * to_dmatrix(a) * l_inv.transpose();
    let p = (&p + p.transpose()) * 0.5;
    let eig = SymmetricEigen::new(p);
    let w = l_inv.transpose() * &eig.eigenvectors;

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| eig.eigenvalues[i].total_cmp(&eig.eigenvalues[j]));

    let mut eigenvalues = Array1::zeros(n);
    let mut eigenvectors = Array2::zeros((n, n));
    for (k, &src) in order.iter().enumerate() {
        let lambda = eig.eigenvalues[src];
        if !lambda.is_finite() {
            bail!(NumericInstability, "eigenvalue {k} is not finite");
        }
        eigenvalues[k] = lambda;

        let col = w.column(src);
        let pivot = col.iter().copied().fold(0.0_f64, |m, v| if v.abs() > m.abs() { v } else { m });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        for i in 0..n {
            eigenvectors[[i, k]] = sign * col[i];
        }
    }
    Ok(GeneralizedEigen { eigenvalues, eigenvectors })
}

/// Moore–Penrose pseudo-inverse via SVD.
///
/// Singular values below `max(rows, cols) · ε · σ_max` are treated as zero.
pub fn pinv(a: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
    let (r, c) = a.dim();
    let svd = to_dmatrix(a).svd(true, true);
    let sigma_max = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let tol = r.max(c) as f64 * f64::EPSILON * sigma_max;
    match svd.pseudo_inverse(tol) {
        Ok(m) => Ok(from_dmatrix(&m)),
        Err(e) => bail!(NumericInstability, "pseudo-inverse failed: {e}"),
    }
}
