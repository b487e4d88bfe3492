//! Regularized spatial covariance estimators.
//!
//! Every estimator works on a `[C, T]` block (channels × samples), centres
//! each channel, and returns a symmetric `[C, C]` matrix. The shrinkage
//! estimators pull the sample covariance `S = X Xᵀ / T` towards the scaled
//! identity `μ I` with `μ = tr(S) / C`:
//!
//! ```text
//! Σ = (1 − s) S + s μ I
//! ```
//!
//! Ledoit–Wolf and OAS choose `s` from the data with the same formulas as
//! scikit-learn's `ledoit_wolf_shrinkage` and `oas`.
use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis};

use crate::error::{bail, Error, Result};

/// Shrinkage applied by the `"shrunk"` identifier.
pub const DEFAULT_SHRINKAGE: f64 = 0.1;

/// Covariance estimator selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Shrinkage {
    /// Ledoit–Wolf optimal shrinkage.
    #[default]
    LedoitWolf,
    /// Oracle Approximating Shrinkage.
    Oas,
    /// Unbiased sample covariance, no shrinkage.
    Empirical,
    /// Fixed shrinkage coefficient in `[0, 1]`.
    Fixed(f64),
}

impl FromStr for Shrinkage {
    type Err = Error;

    /// `ledoit_wolf`, `oas`, `empirical`, `shrunk`, or a number in `[0, 1]`.
    fn from_str(s: &str) -> Result<Self> {
        let id = s.trim().to_ascii_lowercase();
        let parsed = match id.as_str() {
            "ledoit_wolf" => Shrinkage::LedoitWolf,
            "oas" => Shrinkage::Oas,
            "empirical" => Shrinkage::Empirical,
            "shrunk" => Shrinkage::Fixed(DEFAULT_SHRINKAGE),
            other => match other.parse::<f64>() {
                Ok(a) if (0.0..=1.0).contains(&a) => Shrinkage::Fixed(a),
                Ok(a) => bail!(Config, "shrinkage {a} outside [0, 1]"),
                Err(_) => bail!(Config, "unknown covariance estimator '{s}'"),
            },
        };
        Ok(parsed)
    }
}

impl fmt::Display for Shrinkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shrinkage::LedoitWolf => f.write_str("ledoit_wolf"),
            Shrinkage::Oas => f.write_str("oas"),
            Shrinkage::Empirical => f.write_str("empirical"),
            Shrinkage::Fixed(a) => write!(f, "{a}"),
        }
    }
}

/// Estimate the `[C, C]` covariance of a `[C, T]` block.
///
/// # Errors
///
/// [`Error::Shape`] if there are too few samples (`T < 2` for the
/// empirical estimator, `T < 1` otherwise).
pub fn estimate_covariance(x: ArrayView2<'_, f64>, shrinkage: Shrinkage) -> Result<Array2<f64>> {
    let (n_channels, n_samples) = x.dim();
    let min_samples = if shrinkage == Shrinkage::Empirical { 2 } else { 1 };
    if n_samples < min_samples {
        bail!(
            Shape,
            "covariance of {n_channels} channels needs at least {min_samples} samples, got {n_samples}"
        );
    }

    let centred = centre_rows(x);
    let gram = centred.dot(&centred.t());
    let n = n_samples as f64;

    let cov = match shrinkage {
        Shrinkage::Empirical => gram / (n - 1.0),
        Shrinkage::Fixed(a) => shrink(gram / n, a),
        Shrinkage::LedoitWolf => {
            let s = ledoit_wolf_shrinkage(&centred, &gram);
            log::trace!("ledoit-wolf shrinkage {s:.4}");
            shrink(gram / n, s)
        }
        Shrinkage::Oas => {
            let emp = gram / n;
            let s = oas_shrinkage(&emp, n);
            log::trace!("oas shrinkage {s:.4}");
            shrink(emp, s)
        }
    };
    Ok(cov)
}

/// Subtract each row's mean.
fn centre_rows(x: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut out = x.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let mean = row.mean().unwrap_or(0.0);
        row.mapv_inplace(|v| v - mean);
    }
    out
}

/// `(1 − s) S + s μ I`, `μ = tr(S) / C`.
fn shrink(mut emp: Array2<f64>, s: f64) -> Array2<f64> {
    let p = emp.nrows();
    let mu = emp.diag().sum() / p as f64;
    emp.mapv_inplace(|v| (1.0 - s) * v);
    for i in 0..p {
        emp[[i, i]] += s * mu;
    }
    emp
}

/// Ledoit–Wolf coefficient for centred `[C, T]` data with Gram matrix `X Xᵀ`.
fn ledoit_wolf_shrinkage(centred: &Array2<f64>, gram: &Array2<f64>) -> f64 {
    let (p, n) = centred.dim();
    let (p, n) = (p as f64, n as f64);

    let sq = centred.mapv(|v| v * v);
    let trace = sq.sum() / n;
    let mu = trace / p;

    let beta_ = sq.dot(&sq.t()).sum();
    let delta_ = gram.iter().map(|v| v * v).sum::<f64>() / (n * n);

    let beta = (beta_ / n - delta_) / (p * n);
    let delta = (delta_ - 2.0 * mu * trace + p * mu * mu) / p;
    let beta = beta.min(delta);
    if beta == 0.0 {
        0.0
    } else {
        beta / delta
    }
}

/// OAS coefficient for a biased sample covariance estimated from `n` samples.
fn oas_shrinkage(emp: &Array2<f64>, n: f64) -> f64 {
    let p = emp.nrows() as f64;
    let alpha = emp.iter().map(|v| v * v).sum::<f64>() / (p * p);
    let mu = emp.diag().sum() / p;
    let mu2 = mu * mu;
    let num = alpha + mu2;
    let den = (n + 1.0) * (alpha - mu2 / p);
    if den == 0.0 {
        1.0
    } else {
        (num / den).min(1.0)
    }
}
