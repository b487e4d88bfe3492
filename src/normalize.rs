//! Epoch baseline correction.
//!
//! Matches `epochs.apply_baseline((None, None))` in MNE: every channel of
//! every epoch has its own mean over the whole window removed.
use ndarray::{Array3, Axis};

/// `epochs`: [E, C, T]  →  `epoch[e, c, :] -= mean(epoch[e, c, :])`
pub fn baseline_correct_inplace(epochs: &mut Array3<f64>) {
    for mut lane in epochs.lanes_mut(Axis(2)) {
        let m = lane.mean().unwrap_or(0.0);
        lane.mapv_inplace(|v| v - m);
    }
}
