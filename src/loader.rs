//! Subject-file loader.
//!
//! A recording file holds exactly three variables:
//!
//! ```text
//! cnt   [T, C] numeric      continuous signal, samples × channels
//! mrk   1×1 struct          y   (labels 1 / 2 / NaN)   pos (onset samples)
//! nfo   1×1 struct          fs  (sampling rate)        clab (channel names)
//! ```
//!
//! The loader only checks that the three variables exist with the right
//! kind of container; field-level validation belongs to the assembler and
//! the label aligner.
use std::path::Path;

use ndarray::Array2;

use crate::error::{bail, Result};
use crate::mat::{open_mat, MatArray, MatFile, StructArray};

/// Name of the continuous-signal variable.
pub const SIGNAL_VAR: &str = "cnt";
/// Name of the marker struct.
pub const MARKER_VAR: &str = "mrk";
/// Name of the metadata struct.
pub const INFO_VAR: &str = "nfo";

/// The three raw fields of one subject file.
#[derive(Debug, Clone)]
pub struct RawFile {
    /// `[T, C]` signal exactly as stored (samples × channels).
    pub cnt: Array2<f64>,
    /// Marker struct (`y`, `pos`, …).
    pub mrk: StructArray,
    /// Metadata struct (`fs`, `clab`, …).
    pub nfo: StructArray,
}

/// Read a subject file fully into memory and extract its three fields.
///
/// # Errors
///
/// * [`Error::Io`](crate::Error::Io) if the file cannot be read.
/// * [`Error::Parse`](crate::Error::Parse) if it is not a MAT-5 container or
///   `cnt` / `mrk` / `nfo` is missing or of the wrong kind.
pub fn load_raw_file<P: AsRef<Path>>(path: P) -> Result<RawFile> {
    let path = path.as_ref();
    let mat = open_mat(path)?;
    log::debug!("{}: variables {:?}", path.display(), mat.names());
    let raw = raw_file_from_mat(mat)?;
    log::info!(
        "loaded {}: {} samples × {} channels",
        path.display(),
        raw.cnt.nrows(),
        raw.cnt.ncols()
    );
    Ok(raw)
}

/// Extract the three fields from an already decoded file.
pub fn raw_file_from_mat(mut mat: MatFile) -> Result<RawFile> {
    let cnt = match mat.take(SIGNAL_VAR) {
        Some(MatArray::Numeric(a)) => {
            if a.dims.len() != 2 {
                bail!(Parse, "'{SIGNAL_VAR}' must be a 2-D matrix, got dimensions {:?}", a.dims);
            }
            a.to_array2()?
        }
        Some(other) => bail!(Parse, "'{SIGNAL_VAR}' must be numeric, found {}", other.class_name()),
        None => bail!(Parse, "missing variable '{SIGNAL_VAR}'"),
    };
    let mrk = take_scalar_struct(&mut mat, MARKER_VAR)?;
    let nfo = take_scalar_struct(&mut mat, INFO_VAR)?;
    Ok(RawFile { cnt, mrk, nfo })
}

fn take_scalar_struct(mat: &mut MatFile, name: &str) -> Result<StructArray> {
    match mat.take(name) {
        Some(MatArray::Struct(s)) if s.numel() == Some(1) => Ok(s),
        Some(MatArray::Struct(s)) => {
            bail!(Parse, "'{name}' must be a 1×1 struct, got dimensions {:?}", s.dims)
        }
        Some(other) => bail!(Parse, "'{name}' must be a struct, found {}", other.class_name()),
        None => bail!(Parse, "missing variable '{name}'"),
    }
}
