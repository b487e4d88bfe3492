//! Signal assembly: `cnt` + `nfo` → channel-ordered [`ContinuousRecording`].
//!
//! `nfo.clab` fixes the channel order. The stored signal is samples ×
//! channels and is transposed once so that row `c` is channel `clab[c]`.
use std::collections::HashSet;

use ndarray::Array2;

use crate::error::{bail, Result};
use crate::loader::RawFile;
use crate::mat::{MatArray, StructArray};
use crate::recording::{ChannelMetadata, ChannelType, ContinuousRecording};

/// Channel names from `nfo.clab`, trimmed, in stored order.
///
/// # Errors
///
/// * [`Error::Parse`](crate::Error::Parse) if `clab` is missing or is not a
///   cell array of strings.
/// * [`Error::Config`](crate::Error::Config) on empty or duplicate names.
pub fn channel_names(nfo: &StructArray) -> Result<Vec<String>> {
    let clab = match nfo.field("clab") {
        Some(MatArray::Cell(c)) => c,
        Some(other) => bail!(Parse, "nfo.clab must be a cell array, found {}", other.class_name()),
        None => bail!(Parse, "nfo has no 'clab' field"),
    };

    let mut names = Vec::with_capacity(clab.cells.len());
    for (i, cell) in clab.cells.iter().enumerate() {
        let name = match cell.as_char().and_then(|c| c.as_string()) {
            Some(s) => s.trim().to_string(),
            None => bail!(Parse, "nfo.clab{{{}}} is not a single-row string", i + 1),
        };
        if name.is_empty() {
            bail!(Config, "channel {} has an empty name", i + 1);
        }
        names.push(name);
    }

    let mut seen = HashSet::with_capacity(names.len());
    for n in &names {
        if !seen.insert(n.as_str()) {
            bail!(Config, "duplicate channel name '{n}'");
        }
    }
    Ok(names)
}

/// Sampling rate from `nfo.fs` as a positive whole number of Hz.
pub fn sampling_rate(nfo: &StructArray) -> Result<u32> {
    let fs = match nfo.field("fs").and_then(MatArray::as_numeric) {
        Some(a) => match a.scalar() {
            Some(v) => v,
            None => bail!(Parse, "nfo.fs must be a scalar, got dimensions {:?}", a.dims),
        },
        None => bail!(Parse, "nfo has no numeric 'fs' field"),
    };
    if !fs.is_finite() || fs <= 0.0 || fs.fract() != 0.0 || fs > u32::MAX as f64 {
        bail!(Config, "sampling rate must be a positive integer, got {fs}");
    }
    Ok(fs as u32)
}

/// Transpose the stored `[T, C]` signal to `[C, T]`.
pub fn raw_signal(cnt: &Array2<f64>) -> Array2<f64> {
    cnt.t().as_standard_layout().into_owned()
}

/// Build the channel-ordered recording from the raw fields.
///
/// # Errors
///
/// * [`Error::Shape`](crate::Error::Shape) if the signal's channel count does
///   not match `nfo.clab`.
/// * [`Error::Config`](crate::Error::Config) for an unknown `ch_type` or an
///   invalid sampling rate.
pub fn assemble_recording(raw: &RawFile, ch_type: &str) -> Result<ContinuousRecording> {
    let ch_type: ChannelType = ch_type.parse()?;
    let ch_names = channel_names(&raw.nfo)?;
    let sfreq = sampling_rate(&raw.nfo)?;

    let data = raw_signal(&raw.cnt);
    if data.nrows() != ch_names.len() {
        bail!(
            Shape,
            "signal has {} channels but nfo.clab lists {}",
            data.nrows(),
            ch_names.len()
        );
    }

    log::info!(
        "assembled {} ch × {} samples @ {} Hz ({ch_type})",
        data.nrows(),
        data.ncols(),
        sfreq
    );
    ContinuousRecording::new(data, ChannelMetadata { ch_names, sfreq, ch_type })
}
