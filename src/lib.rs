//! # mindmotor: motor-imagery EEG features in pure Rust
//!
//! `mindmotor` turns a two-class (left/right hand) motor-imagery recording
//! stored as a MATLAB Level-5 `.mat` file into a per-trial CSP feature
//! matrix. It follows the MNE-Python `RawArray` → `Epochs` → `CSP` workflow
//! and keeps its numerical conventions (Ledoit–Wolf shrinkage, eigenvalue
//! ranking, pseudo-inverse patterns).
//!
//! ## Pipeline overview
//!
//! ```text
//! subject.mat  (cnt, mrk, nfo)
//!   │
//!   ├─ loader::load_raw_file()       native MAT-5 reader
//!   ├─ assemble::assemble_recording  cnt [T, C] → [C, T], clab order, fs
//!   ├─ labels::align_labels          one NaN mask over (y, pos) pairs, 1/2 → 0/1
//!   ├─ events::build_events          [sample, 0, class] rows
//!   ├─ epoch::extract_epochs         [onset + tmin, onset + tmax] windows
//!   └─ csp::Csp::fit_transform       log-variance of the top CSP components
//!        │
//!        └─→ (FittedCsp, [n_trials, n_components] f64)
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use mindmotor::{extract_csp_features, DisplayConfig, PipelineConfig};
//!
//! let cfg = PipelineConfig::default();
//! let (model, features) = extract_csp_features("data/aa.mat", &cfg).unwrap();
//! println!("{} trials × {} features", features.nrows(), features.ncols());
//!
//! // Patterns for a topographic plot, unplottable channels removed.
//! let view = model.pattern_view(&DisplayConfig::bci_competition_iva());
//! println!("{} plottable channels", view.ch_names.len());
//! ```
//!
//! ## Running individual steps
//!
//! ```no_run
//! use mindmotor::{extract_epochs, load_subject_data, Csp, CspConfig, EpochWindow};
//!
//! let (recording, events) = load_subject_data("data/aa.mat", "eeg").unwrap();
//! let event_id = vec![("left".to_string(), 0), ("right".to_string(), 1)];
//! let epochs = extract_epochs(&recording, &events, &event_id, &EpochWindow::default()).unwrap();
//!
//! let model = Csp::new(CspConfig::default()).unwrap().fit_epochs(&epochs).unwrap();
//! let features = model.transform(epochs.get_data()).unwrap();
//! ```

pub mod assemble;
pub mod config;
pub mod covariance;
pub mod csp;
pub mod epoch;
pub mod error;
pub mod events;
pub mod io;
pub mod labels;
pub mod linalg;
pub mod loader;
pub mod mat;
pub mod normalize;
pub mod recording;

use std::path::Path;

use ndarray::Array2;

// ── Crate-root re-exports ─────────────────────────────────────────────────

pub use assemble::assemble_recording;
pub use config::{ComponentOrder, CovEstimation, CspConfig, DisplayConfig, EpochWindow, PipelineConfig};
pub use covariance::{estimate_covariance, Shrinkage};
pub use csp::{Csp, FittedCsp, PatternView};
pub use epoch::{extract_epochs, Epochs};
pub use error::{Error, Result};
pub use events::{build_events, EventRecord};
pub use io::{write_features, write_features_with_view, StWriter};
pub use labels::{align_labels, LabeledPosition, Marker};
pub use loader::{load_raw_file, RawFile};
pub use normalize::baseline_correct_inplace;
pub use recording::{ChannelMetadata, ChannelType, ContinuousRecording};

/// Load one subject file into a channel-ordered recording plus its events.
///
/// Runs the loader, the signal assembler, the label aligner and the event
/// table builder. Trials with a `NaN` label are discarded; the surviving
/// labels `1` / `2` become class codes `0` / `1`.
///
/// # Errors
///
/// Any [`Error`] raised by those stages; nothing is returned on failure.
pub fn load_subject_data<P: AsRef<Path>>(
    path: P,
    ch_type: &str,
) -> Result<(ContinuousRecording, Vec<EventRecord>)> {
    let raw = loader::load_raw_file(path)?;
    let recording = assemble::assemble_recording(&raw, ch_type)?;
    let markers = labels::raw_markers(&raw.mrk)?;
    let aligned = labels::align_labels(&markers)?;
    let events = events::build_events(&aligned);
    Ok((recording, events))
}

/// Load a subject file and cut one epoch per mapped event.
pub fn run_epoch_extraction<P: AsRef<Path>>(path: P, cfg: &PipelineConfig) -> Result<Epochs> {
    let (recording, events) = load_subject_data(path, &cfg.ch_type)?;
    epoch::extract_epochs(&recording, &events, &cfg.event_id, &cfg.window)
}

/// Full pipeline: file → epochs → fitted CSP and its training features.
///
/// The returned model carries the recording's channel names, so
/// `model.patterns()` columns line up with `model.ch_names()`.
///
/// # Errors
///
/// * [`Error::Config`] for invalid CSP hyper-parameters, checked before the
///   file is read.
/// * Any error of [`run_epoch_extraction`] or of the CSP fit.
pub fn extract_csp_features<P: AsRef<Path>>(
    path: P,
    cfg: &PipelineConfig,
) -> Result<(FittedCsp, Array2<f64>)> {
    let csp = Csp::new(cfg.csp.clone())?;
    let epochs = run_epoch_extraction(path, cfg)?;
    let model = csp.fit_epochs(&epochs)?;
    let features = model.transform(epochs.get_data())?;
    Ok((model, features))
}
