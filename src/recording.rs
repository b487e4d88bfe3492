//! Continuous multi-channel recording, the equivalent of an MNE `RawArray`.
//!
//! [`ContinuousRecording`] owns a `[C, T]` signal together with its
//! [`ChannelMetadata`]. Row `c` of the signal always belongs to
//! `metadata.ch_names[c]`; nothing in this crate reorders channels.
use std::fmt;
use std::str::FromStr;

use ndarray::{s, Array2, ArrayView2};

use crate::error::{bail, Error, Result};

// ── Channel type ──────────────────────────────────────────────────────────

/// Channel-type tag applied uniformly to every channel of a recording.
///
/// The accepted names are MNE's `ch_types` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Eeg,
    Eog,
    Ecg,
    Emg,
    Seeg,
    Ecog,
    Dbs,
    Misc,
    Stim,
    Resp,
    Bio,
    Mag,
    Grad,
}

impl ChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelType::Eeg => "eeg",
            ChannelType::Eog => "eog",
            ChannelType::Ecg => "ecg",
            ChannelType::Emg => "emg",
            ChannelType::Seeg => "seeg",
            ChannelType::Ecog => "ecog",
            ChannelType::Dbs => "dbs",
            ChannelType::Misc => "misc",
            ChannelType::Stim => "stim",
            ChannelType::Resp => "resp",
            ChannelType::Bio => "bio",
            ChannelType::Mag => "mag",
            ChannelType::Grad => "grad",
        }
    }
}

impl FromStr for ChannelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = match s.trim().to_ascii_lowercase().as_str() {
            "eeg" => ChannelType::Eeg,
            "eog" => ChannelType::Eog,
            "ecg" => ChannelType::Ecg,
            "emg" => ChannelType::Emg,
            "seeg" => ChannelType::Seeg,
            "ecog" => ChannelType::Ecog,
            "dbs" => ChannelType::Dbs,
            "misc" => ChannelType::Misc,
            "stim" => ChannelType::Stim,
            "resp" => ChannelType::Resp,
            "bio" => ChannelType::Bio,
            "mag" => ChannelType::Mag,
            "grad" => ChannelType::Grad,
            _ => bail!(Config, "unknown channel type '{s}'"),
        };
        Ok(t)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Channel metadata ──────────────────────────────────────────────────────

/// Channel names (canonical order), sampling rate and channel type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMetadata {
    pub ch_names: Vec<String>,
    /// Sampling rate in Hz.
    pub sfreq: u32,
    pub ch_type: ChannelType,
}

impl ChannelMetadata {
    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }
}

// ── ContinuousRecording ───────────────────────────────────────────────────

/// A continuous `[C, T]` recording with its channel metadata.
#[derive(Debug, Clone)]
pub struct ContinuousRecording {
    data: Array2<f64>,
    info: ChannelMetadata,
}

impl ContinuousRecording {
    /// Wrap a `[C, T]` signal.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the sampling rate is zero or the number of rows
    /// differs from the number of channel names.
    pub fn new(data: Array2<f64>, info: ChannelMetadata) -> Result<Self> {
        if info.sfreq == 0 {
            bail!(Config, "sampling rate must be positive");
        }
        if data.nrows() != info.n_channels() {
            bail!(
                Config,
                "signal has {} rows but {} channel names were given",
                data.nrows(),
                info.n_channels()
            );
        }
        log::debug!(
            "recording: {} {} channels × {} samples @ {} Hz",
            info.n_channels(),
            info.ch_type,
            data.ncols(),
            info.sfreq
        );
        Ok(Self { data, info })
    }

    pub fn info(&self) -> &ChannelMetadata {
        &self.info
    }

    pub fn ch_names(&self) -> &[String] {
        &self.info.ch_names
    }

    pub fn sfreq(&self) -> u32 {
        self.info.sfreq
    }

    pub fn ch_type(&self) -> ChannelType {
        self.info.ch_type
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    /// Total number of time points.
    #[inline]
    pub fn n_times(&self) -> usize {
        self.data.ncols()
    }

    /// Total duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.n_times() as f64 / self.info.sfreq as f64
    }

    /// The full `[C, T]` signal.
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// View of samples `[start, start + len)` on every channel.
    ///
    /// `start` may be negative (a window that begins before onset); any
    /// window not fully inside `[0, n_times)` is an [`Error::Bounds`].
    pub fn window(&self, start: i64, len: usize) -> Result<ArrayView2<'_, f64>> {
        let end = match i64::try_from(len).ok().and_then(|l| start.checked_add(l)) {
            Some(end) => end,
            None => bail!(Bounds, "window of {len} samples from {start} overflows"),
        };
        if start < 0 || end > self.n_times() as i64 {
            bail!(
                Bounds,
                "samples [{start}, {end}) outside recording of {} samples",
                self.n_times()
            );
        }
        let start = start as usize;
        Ok(self.data.slice(s![.., start..start + len]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(n: usize, sfreq: u32) -> ChannelMetadata {
        ChannelMetadata {
            ch_names: (0..n).map(|i| format!("ch{i}")).collect(),
            sfreq,
            ch_type: ChannelType::Eeg,
        }
    }

    #[test]
    fn channel_type_parses_case_insensitively() {
        assert_eq!("EEG".parse::<ChannelType>().unwrap(), ChannelType::Eeg);
        assert_eq!(" emg ".parse::<ChannelType>().unwrap(), ChannelType::Emg);
        assert!(matches!("brainwave".parse::<ChannelType>(), Err(Error::Config(_))));
    }

    #[test]
    fn construction_checks_rows_and_rate() {
        let data = Array2::<f64>::zeros((3, 50));
        assert!(ContinuousRecording::new(data.clone(), info(3, 100)).is_ok());
        assert!(matches!(ContinuousRecording::new(data.clone(), info(4, 100)), Err(Error::Config(_))));
        assert!(matches!(ContinuousRecording::new(data, info(3, 0)), Err(Error::Config(_))));
    }

    #[test]
    fn window_bounds() {
        let data = Array2::from_shape_fn((2, 10), |(c, t)| (c * 100 + t) as f64);
        let rec = ContinuousRecording::new(data, info(2, 10)).unwrap();
        let w = rec.window(7, 3).unwrap();
        assert_eq!(w.dim(), (2, 3));
        assert_eq!(w[[1, 0]], 107.0);
        assert!(matches!(rec.window(8, 3), Err(Error::Bounds(_))));
        assert!(matches!(rec.window(-1, 3), Err(Error::Bounds(_))));
        assert!(matches!(rec.window(i64::MAX, 3), Err(Error::Bounds(_))));
        approx::assert_abs_diff_eq!(rec.duration_secs(), 1.0, epsilon = 1e-12);
    }
}
