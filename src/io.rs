//! Safetensors export of CSP features.
//!
//! [`write_features`] stores one file per run:
//!
//! ```text
//! features   F64  [n, k]   log-variance (or variance) features
//! targets    I32  [n]      class code per trial
//! filters    F64  [k, C]   retained spatial filters
//! patterns   F64  [k, C]   retained spatial patterns (columns = ch_names)
//! ch_names   U8   [bytes]  newline-joined channel names, fit-time order
//! ```
//!
//! [`write_features_with_view`] adds the plottable subset of the patterns:
//!
//! ```text
//! view_patterns  F64  [k, C']   patterns without excluded channels
//! view_ch_names  U8   [bytes]   newline-joined names of those C' channels
//! ```
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::csp::{FittedCsp, PatternView};
use crate::error::{bail, Error, Result};

// ── Writer ────────────────────────────────────────────────────────────────────

/// Minimal safetensors writer for F64, I32 and U8 tensors.
///
/// ```rust,no_run
/// use mindmotor::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0, 2.0, 3.0], &[1, 3]);
/// w.add_i32("labels", &[0, 1, 1], &[3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    /// Row-major copy of a 2-D view.
    pub fn add_f64_arr2(&mut self, name: &str, arr: ArrayView2<'_, f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    pub fn add_u8(&mut self, name: &str, data: &[u8]) {
        self.entries.push((name.to_string(), data.to_vec(), "U8", vec![data.len()]));
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(
                name.clone(),
                serde_json::json!({
                    "dtype": dtype,
                    "shape": shape,
                    "data_offsets": [offset, offset + data.len()],
                }),
            );
            offset += data.len();
        }
        let mut header = serde_json::to_vec(&header_map).map_err(std::io::Error::from)?;
        // Header length is padded to 8 bytes with spaces.
        header.resize(header.len().div_ceil(8) * 8, b' ');

        let mut out = Vec::with_capacity(8 + header.len() + offset);
        out.extend_from_slice(&(header.len() as u64).to_le_bytes());
        out.extend_from_slice(&header);
        for (_, data, _, _) in &self.entries {
            out.extend_from_slice(data);
        }
        Ok(out)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let mut f = std::fs::File::create(path)?;
        f.write_all(&bytes)?;
        Ok(())
    }
}

/// Write features, targets and the fitted model's filters/patterns.
///
/// # Errors
///
/// [`Error::Shape`] if `features` and `targets` disagree on the trial count.
pub fn write_features(
    path: &Path,
    model: &FittedCsp,
    features: &Array2<f64>,
    targets: &[u8],
) -> Result<()> {
    let w = feature_tensors(model, features, targets)?;
    w.write(path)?;
    log::info!("wrote {} × {} features to {}", features.nrows(), features.ncols(), path.display());
    Ok(())
}

/// [`write_features`] plus a [`PatternView`] for topographic plots.
///
/// # Errors
///
/// [`Error::Shape`] on a trial count mismatch, or if the view does not have
/// one pattern row per retained component.
pub fn write_features_with_view(
    path: &Path,
    model: &FittedCsp,
    features: &Array2<f64>,
    targets: &[u8],
    view: &PatternView,
) -> Result<()> {
    let (rows, cols) = view.patterns.dim();
    if rows != model.n_components() || cols != view.ch_names.len() {
        bail!(
            Shape,
            "pattern view is {rows} × {cols} with {} names for {} components",
            view.ch_names.len(),
            model.n_components()
        );
    }
    let mut w = feature_tensors(model, features, targets)?;
    w.add_f64_arr2("view_patterns", view.patterns.view());
    w.add_u8("view_ch_names", view.ch_names.join("\n").as_bytes());
    w.write(path)?;
    log::info!(
        "wrote {} × {} features and {} plottable channels to {}",
        features.nrows(),
        features.ncols(),
        cols,
        path.display()
    );
    Ok(())
}

fn feature_tensors(model: &FittedCsp, features: &Array2<f64>, targets: &[u8]) -> Result<StWriter> {
    if features.nrows() != targets.len() {
        bail!(Shape, "{} feature rows for {} targets", features.nrows(), targets.len());
    }
    let mut w = StWriter::new();
    w.add_f64_arr2("features", features.view());
    let t: Vec<i32> = targets.iter().map(|&v| v as i32).collect();
    w.add_i32("targets", &t, &[t.len()]);
    w.add_f64_arr2("filters", model.filters());
    w.add_f64_arr2("patterns", model.patterns());
    w.add_u8("ch_names", model.ch_names().join("\n").as_bytes());
    Ok(w)
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// One tensor's dtype, shape and raw little-endian bytes.
#[derive(Debug, Clone)]
pub struct StTensor {
    pub dtype: String,
    pub shape: Vec<usize>,
    pub bytes: Vec<u8>,
}

impl StTensor {
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        (self.dtype == "F64").then(|| {
            self.bytes
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
                .collect()
        })
    }

    pub fn to_i32(&self) -> Option<Vec<i32>> {
        (self.dtype == "I32").then(|| {
            self.bytes
                .chunks_exact(4)
                .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()
        })
    }
}

/// Parse every tensor in a safetensors buffer.
pub fn read_tensors(bytes: &[u8]) -> Result<HashMap<String, StTensor>> {
    if bytes.len() < 8 {
        bail!(Parse, "safetensors file too small ({} bytes)", bytes.len());
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    let data_start = 8usize.saturating_add(n);
    if data_start > bytes.len() {
        bail!(Parse, "safetensors header of {n} bytes overruns the file");
    }
    let header: HashMap<String, serde_json::Value> = serde_json::from_slice(&bytes[8..data_start])
        .map_err(|e| Error::Parse(format!("safetensors header: {e}")))?;

    let mut out = HashMap::new();
    for (name, entry) in header {
        if name == "__metadata__" {
            continue;
        }
        let dtype = entry["dtype"].as_str().unwrap_or_default().to_string();
        let shape: Vec<usize> = entry["shape"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_u64()).map(|v| v as usize).collect())
            .unwrap_or_default();
        let offsets: Vec<usize> = entry["data_offsets"]
            .as_array()
            .map(|a| a.iter().filter_map(|v| v.as_u64()).map(|v| v as usize).collect())
            .unwrap_or_default();
        let (s, e) = match offsets.as_slice() {
            [s, e] if s <= e && data_start + e <= bytes.len() => (*s, *e),
            _ => bail!(Parse, "tensor '{name}' has invalid data_offsets"),
        };
        let bytes = bytes[data_start + s..data_start + e].to_vec();
        out.insert(name, StTensor { dtype, shape, bytes });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_eight_byte_aligned() {
        let mut w = StWriter::new();
        w.add_f64("a", &[1.0, 2.0], &[2]);
        w.add_u8("names", b"C3\nC4");
        let bytes = w.to_bytes().unwrap();
        let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
        assert_eq!(n % 8, 0);
        assert_eq!(bytes.len(), 8 + n + 16 + 5);
    }

    #[test]
    fn tensors_read_back() {
        let mut w = StWriter::new();
        w.add_f64_arr2("m", ndarray::array![[1.0, 2.0], [3.0, 4.0]].view());
        w.add_i32("t", &[0, 1, 1], &[3]);
        let tensors = read_tensors(&w.to_bytes().unwrap()).unwrap();
        assert_eq!(tensors["m"].shape, vec![2, 2]);
        assert_eq!(tensors["m"].to_f64().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(tensors["t"].to_i32().unwrap(), vec![0, 1, 1]);
        assert!(tensors["t"].to_f64().is_none());
    }

    #[test]
    fn truncated_file_is_parse_error() {
        assert!(matches!(read_tensors(&[1, 2, 3]), Err(Error::Parse(_))));
        let mut bad = 1000u64.to_le_bytes().to_vec();
        bad.extend_from_slice(b"{}");
        assert!(matches!(read_tensors(&bad), Err(Error::Parse(_))));
    }
}
