//! Pipeline configuration.
//!
//! [`PipelineConfig`] holds every tunable parameter of the feature pipeline.
//! All fields have defaults matching the left/right motor-imagery setup:
//! EEG channels, a 0–2 s window after each cue, 4 CSP components with
//! log-variance features and Ledoit–Wolf shrinkage.

use crate::error::{bail, Result};

// ── Epoch window ─────────────────────────────────────────────────────────

/// Trial window relative to each event onset.
///
/// ```
/// use mindmotor::EpochWindow;
///
/// let w = EpochWindow::default();
/// assert_eq!(w.n_samples(100), 201); // round(2 s × 100 Hz) + 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochWindow {
    /// Window start in seconds relative to onset (may be negative).
    ///
    /// Default: `0.0` s.
    pub tmin: f64,

    /// Window end in seconds relative to onset, inclusive.
    ///
    /// Default: `2.0` s.
    pub tmax: f64,

    /// Subtract each channel's mean over the window from every epoch.
    ///
    /// Default: `false` (no baseline correction).
    pub baseline: bool,
}

impl Default for EpochWindow {
    fn default() -> Self {
        Self { tmin: 0.0, tmax: 2.0, baseline: false }
    }
}

impl EpochWindow {
    /// Check that the bounds are finite and ordered.
    pub fn validate(&self) -> Result<()> {
        if !self.tmin.is_finite() || !self.tmax.is_finite() {
            bail!(Config, "epoch window bounds must be finite ({}, {})", self.tmin, self.tmax);
        }
        if self.tmin > self.tmax {
            bail!(Config, "epoch window tmin {} is after tmax {}", self.tmin, self.tmax);
        }
        Ok(())
    }

    /// Offset of the first window sample from the onset, in samples.
    pub fn start_offset(&self, sfreq: u32) -> i64 {
        (self.tmin * sfreq as f64).round() as i64
    }

    /// Samples per epoch: `round(tmax·fs) − round(tmin·fs) + 1`.
    pub fn n_samples(&self, sfreq: u32) -> usize {
        let last = (self.tmax * sfreq as f64).round() as i64;
        (last - self.start_offset(sfreq) + 1).max(0) as usize
    }
}

// ── CSP ──────────────────────────────────────────────────────────────────

/// How the fitted spatial filters are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentOrder {
    /// Descending `|λ − 0.5|`: most discriminative filters first.
    #[default]
    MutualInfo,
    /// Largest λ, smallest λ, second largest, second smallest, …
    Alternate,
}

/// How per-class covariance is estimated from the class's trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovEstimation {
    /// Concatenate the class's trials along time, estimate once.
    #[default]
    Concat,
    /// Estimate per trial and average.
    Epoch,
}

/// CSP hyper-parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CspConfig {
    /// Number of spatial filters used for features (`1 ≤ n ≤ n_channels`).
    ///
    /// Default: `4`.
    pub n_components: usize,

    /// Natural log of each variance feature.
    ///
    /// Default: `true`.
    pub log: bool,

    /// Covariance shrinkage estimator: `"ledoit_wolf"`, `"oas"`,
    /// `"empirical"`, `"shrunk"`, or a fixed shrinkage in `[0, 1]`
    /// such as `"0.2"`.
    ///
    /// Default: `"ledoit_wolf"`.
    pub reg: String,

    /// Default: [`ComponentOrder::MutualInfo`].
    pub component_order: ComponentOrder,

    /// Default: [`CovEstimation::Concat`].
    pub cov_est: CovEstimation,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            n_components: 4,
            log: true,
            reg: "ledoit_wolf".to_string(),
            component_order: ComponentOrder::default(),
            cov_est: CovEstimation::default(),
        }
    }
}

// ── Display ──────────────────────────────────────────────────────────────

/// Channels left out when handing CSP patterns to a topographic plot.
///
/// Matching is case-insensitive and ignores spaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayConfig {
    pub excluded_channels: Vec<String>,
}

impl DisplayConfig {
    /// Intermediate-row electrodes of the BCI Competition III IVa montage
    /// that have no position in the standard 10-05 layout.
    pub fn bci_competition_iva() -> Self {
        let names = [
            "FAF5", "FAF1", "FAF2", "FAF6", "FFC7", "FFC8", "CFC7", "CFC5", "CFC3", "CFC1",
            "CFC2", "CFC4", "CFC6", "CFC8", "CCP7", "CCP8", "PCP7", "PCP5", "PCP3", "PCP1",
            "PCP2", "PCP4", "PCP6", "PCP8", "OPO1", "OPO2",
        ];
        Self { excluded_channels: names.iter().map(|s| s.to_string()).collect() }
    }

    /// Whether `name` is excluded.
    pub fn is_excluded(&self, name: &str) -> bool {
        let norm = |s: &str| s.replace(' ', "").to_lowercase();
        let target = norm(name);
        self.excluded_channels.iter().any(|e| norm(e) == target)
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────

/// Configuration for the full file → features pipeline.
///
/// All fields are `pub` so you can construct one with struct-update syntax:
///
/// ```
/// use mindmotor::{CspConfig, PipelineConfig};
///
/// let cfg = PipelineConfig {
///     csp: CspConfig { n_components: 6, ..CspConfig::default() },
///     ..PipelineConfig::default()
/// };
/// assert_eq!(cfg.ch_type, "eeg");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Channel-type tag applied to every channel.
    ///
    /// Default: `"eeg"`.
    pub ch_type: String,

    pub window: EpochWindow,

    /// Class name → class code; only events with a listed code are epoched.
    ///
    /// Default: `[("left", 0), ("right", 1)]`.
    pub event_id: Vec<(String, u8)>,

    pub csp: CspConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ch_type: "eeg".to_string(),
            window: EpochWindow::default(),
            event_id: vec![("left".to_string(), 0), ("right".to_string(), 1)],
            csp: CspConfig::default(),
        }
    }
}
