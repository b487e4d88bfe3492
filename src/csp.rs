//! Common Spatial Patterns for two-class motor imagery.
//!
//! CSP finds spatial filters `w` that maximise the variance of one class
//! relative to the other by solving
//!
//! ```text
//! Σ₀ w = λ (Σ₀ + Σ₁) w
//! ```
//!
//! A filter with `λ` near 1 passes class 0 power and suppresses class 1, one
//! near 0 does the opposite, and `λ = 0.5` carries no class information.
//!
//! The model is a two-state type: [`Csp`] only holds hyper-parameters and can
//! only be fitted; [`FittedCsp`] holds the filters and can only transform.
//!
//! ```no_run
//! use mindmotor::{Csp, CspConfig};
//! use ndarray::Array3;
//!
//! let epochs: Array3<f64> = Array3::zeros((40, 8, 201)); // [n, C, T]
//! let targets: Vec<u8> = (0..40).map(|i| (i % 2) as u8).collect();
//!
//! let csp = Csp::new(CspConfig::default()).unwrap();
//! let (model, features) = csp.fit_transform(epochs.view(), &targets).unwrap();
//! assert_eq!(features.dim(), (40, model.n_components()));
//! ```
//!
//! # References
//!
//! - Ramoser et al. (2000): "Optimal spatial filtering of single trial EEG during imagined hand movement"
//! - Blankertz et al. (2008): "Optimizing spatial filters for robust EEG single-trial analysis"
use ndarray::{concatenate, s, Array1, Array2, ArrayView2, ArrayView3, Axis};

use crate::config::{ComponentOrder, CovEstimation, CspConfig, DisplayConfig};
use crate::covariance::{estimate_covariance, Shrinkage};
use crate::epoch::Epochs;
use crate::error::{bail, Result};
use crate::linalg::{generalized_eigh, pinv};

/// Unfitted CSP: validated hyper-parameters.
#[derive(Debug, Clone)]
pub struct Csp {
    config: CspConfig,
    shrinkage: Shrinkage,
}

impl Csp {
    /// # Errors
    ///
    /// [`Error::Config`](crate::Error::Config) if `n_components` is zero or
    /// `reg` is not a known estimator.
    pub fn new(config: CspConfig) -> Result<Self> {
        if config.n_components == 0 {
            bail!(Config, "n_components must be at least 1");
        }
        let shrinkage: Shrinkage = config.reg.parse()?;
        Ok(Self { config, shrinkage })
    }

    pub fn config(&self) -> &CspConfig {
        &self.config
    }

    /// Fit on `[n, C, T]` trials with one class code per trial.
    ///
    /// Channels get placeholder names `ch0`, `ch1`, …; use
    /// [`fit_epochs`](Self::fit_epochs) to keep the recording's names.
    ///
    /// # Errors
    ///
    /// * [`Error::Shape`](crate::Error::Shape) if `targets` and the trial
    ///   count differ, or there are no trials.
    /// * [`Error::Config`](crate::Error::Config) if there are not exactly two
    ///   classes, or more components than channels are requested.
    /// * [`Error::NumericInstability`](crate::Error::NumericInstability) on a
    ///   flat or non-finite channel, or a composite covariance that is not
    ///   positive definite.
    pub fn fit(self, epochs: ArrayView3<'_, f64>, targets: &[u8]) -> Result<FittedCsp> {
        let (n_trials, n_channels, n_times) = epochs.dim();
        if targets.len() != n_trials {
            bail!(Shape, "{} targets for {n_trials} trials", targets.len());
        }
        if n_trials == 0 || n_times == 0 {
            bail!(Shape, "cannot fit CSP on {n_trials} trials of {n_times} samples");
        }

        let mut classes = targets.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() != 2 {
            bail!(Config, "CSP needs exactly two classes, found {:?}", classes);
        }
        if self.config.n_components > n_channels {
            bail!(
                Config,
                "n_components = {} exceeds the {n_channels} available channels",
                self.config.n_components
            );
        }

        check_channel_variance(epochs)?;

        let cov0 = self.class_covariance(epochs, targets, classes[0])?;
        let cov1 = self.class_covariance(epochs, targets, classes[1])?;
        let composite = &cov0 + &cov1;
        let eig = generalized_eigh(cov0.view(), composite.view())?;

        let order = rank_components(&eig.eigenvalues.to_vec(), self.config.component_order);
        let eigenvalues: Array1<f64> = order.iter().map(|&i| eig.eigenvalues[i]).collect();

        // Ranked eigenvectors as columns; filters are its rows.
        let ranked = Array2::from_shape_fn((n_channels, n_channels), |(r, k)| eig.eigenvectors[[r, order[k]]]);
        let filters = ranked.t().to_owned();
        let patterns = pinv(ranked.view())?;

        log::info!(
            "CSP fit: {n_trials} trials × {n_channels} ch, classes {:?}, reg {}, leading λ {:.4?}",
            classes,
            self.shrinkage,
            &eigenvalues.to_vec()[..self.config.n_components]
        );

        Ok(FittedCsp {
            filters,
            patterns,
            eigenvalues,
            n_components: self.config.n_components,
            log: self.config.log,
            shrinkage: self.shrinkage,
            classes: [classes[0], classes[1]],
            ch_names: (0..n_channels).map(|i| format!("ch{i}")).collect(),
        })
    }

    /// Fit on extracted [`Epochs`], keeping their channel names.
    pub fn fit_epochs(self, epochs: &Epochs) -> Result<FittedCsp> {
        let fitted = self.fit(epochs.get_data(), epochs.targets())?;
        fitted.with_ch_names(epochs.ch_names().to_vec())
    }

    /// Fit, then transform the same trials.
    pub fn fit_transform(self, epochs: ArrayView3<'_, f64>, targets: &[u8]) -> Result<(FittedCsp, Array2<f64>)> {
        let fitted = self.fit(epochs, targets)?;
        let features = fitted.transform(epochs)?;
        Ok((fitted, features))
    }

    fn class_covariance(&self, epochs: ArrayView3<'_, f64>, targets: &[u8], class: u8) -> Result<Array2<f64>> {
        let trials: Vec<ArrayView2<'_, f64>> = epochs
            .outer_iter()
            .zip(targets)
            .filter(|&(_, &t)| t == class)
            .map(|(trial, _)| trial)
            .collect();

        match self.config.cov_est {
            CovEstimation::Concat => {
                let joined = match concatenate(Axis(1), &trials) {
                    Ok(a) => a,
                    Err(e) => bail!(Shape, "cannot concatenate class {class} trials: {e}"),
                };
                estimate_covariance(joined.view(), self.shrinkage)
            }
            CovEstimation::Epoch => {
                let n_channels = epochs.dim().1;
                let mut sum = Array2::<f64>::zeros((n_channels, n_channels));
                for trial in &trials {
                    sum += &estimate_covariance(trial.view(), self.shrinkage)?;
                }
                Ok(sum / trials.len() as f64)
            }
        }
    }
}

/// Flat or non-finite channels make the class covariances singular.
fn check_channel_variance(epochs: ArrayView3<'_, f64>) -> Result<()> {
    for (i, trial) in epochs.outer_iter().enumerate() {
        for (c, row) in trial.outer_iter().enumerate() {
            let n = row.len() as f64;
            let mean = row.sum() / n;
            let mean_sq = row.iter().map(|v| v * v).sum::<f64>() / n;
            let var = row.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
            if !var.is_finite() || !(var > f64::EPSILON * mean_sq) {
                bail!(
                    NumericInstability,
                    "trial {i}, channel {c}: degenerate variance {var:e}"
                );
            }
        }
    }
    Ok(())
}

/// Indices of `eigenvalues` in ranked order.
fn rank_components(eigenvalues: &[f64], order: ComponentOrder) -> Vec<usize> {
    let n = eigenvalues.len();
    let mut ascending: Vec<usize> = (0..n).collect();
    ascending.sort_by(|&a, &b| eigenvalues[a].total_cmp(&eigenvalues[b]));

    match order {
        ComponentOrder::MutualInfo => {
            let mut idx: Vec<usize> = (0..n).collect();
            idx.sort_by(|&a, &b| {
                let da = (eigenvalues[a] - 0.5).abs();
                let db = (eigenvalues[b] - 0.5).abs();
                db.total_cmp(&da)
            });
            idx
        }
        ComponentOrder::Alternate => {
            // Even slots: largest downwards. Odd slots: smallest upwards.
            let half = n / 2;
            let mut low = ascending[..half].iter();
            let mut high = ascending[half..].iter().rev();
            (0..n)
                .filter_map(|k| if k % 2 == 0 { high.next() } else { low.next() })
                .copied()
                .collect()
        }
    }
}

/// Fitted CSP model.
#[derive(Debug, Clone)]
pub struct FittedCsp {
    filters: Array2<f64>,
    patterns: Array2<f64>,
    eigenvalues: Array1<f64>,
    n_components: usize,
    log: bool,
    shrinkage: Shrinkage,
    classes: [u8; 2],
    ch_names: Vec<String>,
}

/// Pattern rows and channel names restricted to plottable channels.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternView {
    /// `[n_components, n_kept]`, columns in fit-time channel order.
    pub patterns: Array2<f64>,
    pub ch_names: Vec<String>,
}

impl FittedCsp {
    /// Attach channel names (one per fitted channel, fit-time order).
    pub fn with_ch_names(mut self, ch_names: Vec<String>) -> Result<Self> {
        if ch_names.len() != self.n_channels() {
            bail!(
                Shape,
                "{} channel names for a model fitted on {} channels",
                ch_names.len(),
                self.n_channels()
            );
        }
        self.ch_names = ch_names;
        Ok(self)
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    pub fn n_channels(&self) -> usize {
        self.filters.ncols()
    }

    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    pub fn log(&self) -> bool {
        self.log
    }

    pub fn shrinkage(&self) -> Shrinkage {
        self.shrinkage
    }

    /// The two class codes, ascending. `classes()[0]` is the numerator class.
    pub fn classes(&self) -> [u8; 2] {
        self.classes
    }

    /// Retained filters, `[n_components, C]`.
    pub fn filters(&self) -> ArrayView2<'_, f64> {
        self.filters.slice(s![..self.n_components, ..])
    }

    /// Retained patterns, `[n_components, C]`; column `c` is `ch_names()[c]`.
    pub fn patterns(&self) -> ArrayView2<'_, f64> {
        self.patterns.slice(s![..self.n_components, ..])
    }

    /// Every filter in ranked order, `[C, C]`.
    pub fn all_filters(&self) -> &Array2<f64> {
        &self.filters
    }

    /// Every pattern in ranked order, `[C, C]`.
    pub fn all_patterns(&self) -> &Array2<f64> {
        &self.patterns
    }

    /// Generalized eigenvalues in ranked order.
    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// Project `[n, C, T]` trials to `[n, n_components]` variance features.
    ///
    /// # Errors
    ///
    /// * [`Error::Shape`](crate::Error::Shape) if the channel count differs
    ///   from the fit.
    /// * [`Error::NumericInstability`](crate::Error::NumericInstability) if a
    ///   feature is not finite.
    pub fn transform(&self, epochs: ArrayView3<'_, f64>) -> Result<Array2<f64>> {
        let (n_trials, n_channels, n_times) = epochs.dim();
        if n_channels != self.n_channels() {
            bail!(Shape, "model fitted on {} channels, got {n_channels}", self.n_channels());
        }
        if n_times == 0 {
            bail!(Shape, "trials have no samples");
        }

        let w = self.filters();
        let mut features = Array2::zeros((n_trials, self.n_components));
        for (i, trial) in epochs.outer_iter().enumerate() {
            let projected = w.dot(&trial);
            for (k, row) in projected.outer_iter().enumerate() {
                let var = row.var(0.0);
                let f = if self.log { var.ln() } else { var };
                if !f.is_finite() {
                    bail!(NumericInstability, "trial {i}, component {k}: feature {f} from variance {var:e}");
                }
                features[[i, k]] = f;
            }
        }
        log::debug!("CSP transform: {n_trials} trials → {} features", self.n_components);
        Ok(features)
    }

    /// Retained patterns and channel names with `display` exclusions removed.
    pub fn pattern_view(&self, display: &DisplayConfig) -> PatternView {
        let keep: Vec<usize> = (0..self.n_channels())
            .filter(|&c| !display.is_excluded(&self.ch_names[c]))
            .collect();
        let patterns = self.patterns().select(Axis(1), &keep);
        let ch_names = keep.iter().map(|&c| self.ch_names[c].clone()).collect();
        PatternView { patterns, ch_names }
    }
}
