//! Shared helpers: synthetic subject files written through `MatWriter`.
#![allow(dead_code)]

use mindmotor::mat::{CellArray, CharArray, MatArray, MatWriter, NumericArray, StructArray};
use ndarray::Array2;
use std::path::{Path, PathBuf};

pub const SFREQ: f64 = 100.0;
pub const CHANNELS: [&str; 6] = ["FC3", "C3", "Cz", "CFC5", "C4", "CP4"];
/// Samples between consecutive cues.
pub const TRIAL_SPACING: usize = 300;
pub const FIRST_ONSET: usize = 100;

/// The three variables of one subject file, before encoding.
pub struct Fixture {
    pub ch_names: Vec<String>,
    pub fs: f64,
    /// [T, C], samples × channels, as stored.
    pub cnt: Array2<f64>,
    pub y: Vec<f64>,
    pub pos: Vec<f64>,
}

impl Fixture {
    /// Alternating left (1) / right (2) cues. Left trials boost C3, right
    /// trials boost C4 for two seconds after the cue. Trials listed in
    /// `unlabeled` get a `NaN` label.
    pub fn motor_imagery(n_trials: usize, unlabeled: &[usize]) -> Self {
        let n_ch = CHANNELS.len();
        let n_t = FIRST_ONSET + n_trials * TRIAL_SPACING + TRIAL_SPACING;
        let mut state = 0x853C_49E6_748F_EA9B_u64;
        let mut cnt = Array2::from_shape_fn((n_t, n_ch), |(t, c)| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let noise = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            noise + 0.2 * (2.0 * std::f64::consts::PI * 7.0 * t as f64 / SFREQ + c as f64).sin()
        });

        let mut y = Vec::with_capacity(n_trials);
        let mut pos = Vec::with_capacity(n_trials);
        for i in 0..n_trials {
            let onset = FIRST_ONSET + i * TRIAL_SPACING;
            let label = if i % 2 == 0 { 1.0 } else { 2.0 };
            let loud = if label == 1.0 { 1 } else { 4 };
            for t in onset..onset + 201 {
                cnt[[t, loud]] *= 4.0;
            }
            pos.push(onset as f64);
            y.push(if unlabeled.contains(&i) { f64::NAN } else { label });
        }

        Self {
            ch_names: CHANNELS.iter().map(|s| s.to_string()).collect(),
            fs: SFREQ,
            cnt,
            y,
            pos,
        }
    }

    pub fn to_writer(&self) -> MatWriter {
        let clab = self
            .ch_names
            .iter()
            .map(|n| MatArray::Char(CharArray::from_text(n)))
            .collect();
        let classes = ["left", "right"]
            .iter()
            .map(|n| MatArray::Char(CharArray::from_text(n)))
            .collect();
        let mrk = StructArray::scalar(vec![
            ("pos", MatArray::Numeric(NumericArray::row(self.pos.clone()))),
            ("y", MatArray::Numeric(NumericArray::row(self.y.clone()))),
            ("className", MatArray::Cell(CellArray::row(classes))),
        ]);
        let nfo = StructArray::scalar(vec![
            ("fs", MatArray::Numeric(NumericArray::scalar_value(self.fs))),
            ("clab", MatArray::Cell(CellArray::row(clab))),
        ]);

        let mut w = MatWriter::new();
        w.add("cnt", MatArray::Numeric(NumericArray::from_array2(&self.cnt)))
            .add("mrk", MatArray::Struct(mrk))
            .add("nfo", MatArray::Struct(nfo));
        w
    }

    /// Write `<dir>/<name>.mat` and return its path.
    pub fn write(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(format!("{name}.mat"));
        self.to_writer().write(&path).unwrap();
        path
    }
}
