//! Whole-file MAT-5 reader.
//!
//! # Algorithm
//! 1. Read the file into memory.
//! 2. Validate the 128-byte header and pick the byte order from the endian
//!    indicator.
//! 3. Walk the top-level data elements. `miMATRIX` elements are variables;
//!    `miCOMPRESSED` elements are inflated and must contain one `miMATRIX`.
//! 4. Decode every variable into a [`MatArray`] tree.
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;

use crate::error::{bail, Result};

use super::array::{parse_matrix, MatArray};
use super::constants::*;
use super::tag::{payload, read_tag, Endian};

/// A decoded MAT-5 file.
#[derive(Debug, Clone)]
pub struct MatFile {
    /// Descriptive header text, trailing padding removed.
    pub header: String,
    pub endian: Endian,
    /// Top-level variables in file order.
    pub variables: Vec<(String, MatArray)>,
    /// File this was read from.
    pub path: PathBuf,
}

impl MatFile {
    /// Look up a top-level variable by name.
    pub fn get(&self, name: &str) -> Option<&MatArray> {
        self.variables.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove and return a variable (avoids cloning large signal matrices).
    pub fn take(&mut self, name: &str) -> Option<MatArray> {
        let i = self.variables.iter().position(|(n, _)| n == name)?;
        Some(self.variables.remove(i).1)
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Open and fully decode a `.mat` file.
pub fn open_mat<P: AsRef<Path>>(path: P) -> Result<MatFile> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let mut mat = parse_mat(&bytes)?;
    mat.path = path.to_path_buf();
    Ok(mat)
}

/// Decode a MAT-5 file held in memory.
pub fn parse_mat(bytes: &[u8]) -> Result<MatFile> {
    let (header, endian) = read_header(bytes)?;

    let mut variables = Vec::new();
    let mut pos = HEADER_LEN;
    while pos < bytes.len() {
        // Trailing zero padding after the last element is tolerated.
        if bytes[pos..].iter().all(|&b| b == 0) {
            break;
        }
        let tag = read_tag(bytes, pos, endian)?;
        match tag.ty {
            MI_MATRIX => variables.push(parse_matrix(payload(bytes, &tag), endian)?),
            MI_COMPRESSED => variables.push(inflate_variable(payload(bytes, &tag), endian)?),
            other => bail!(
                Parse,
                "unexpected top-level {} element @ {pos:#x}",
                mi_type_name(other)
            ),
        }
        pos = tag.next_pos();
    }

    Ok(MatFile { header, endian, variables, path: PathBuf::new() })
}

/// Validate the header; return its text and the file byte order.
fn read_header(bytes: &[u8]) -> Result<(String, Endian)> {
    if bytes.len() < HEADER_LEN {
        bail!(Parse, "file too small for a MAT-5 header ({} bytes)", bytes.len());
    }
    let indicator = [bytes[126], bytes[127]];
    let endian = match indicator {
        ENDIAN_LE => Endian::Little,
        ENDIAN_BE => Endian::Big,
        _ => bail!(Parse, "not a MAT-5 file (endian indicator {indicator:?})"),
    };
    let version = endian.u16([bytes[124], bytes[125]]);
    if version != MAT_VERSION {
        bail!(Parse, "unsupported MAT version {version:#06x} (only Level 5 is supported)");
    }
    let text: String = bytes[..HEADER_TEXT_LEN].iter().map(|&b| b as char).collect();
    Ok((text.trim_end_matches(|c: char| c == ' ' || c == '\0').to_string(), endian))
}

fn inflate_variable(compressed: &[u8], endian: Endian) -> Result<(String, MatArray)> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(compressed).read_to_end(&mut inflated)?;
    let tag = read_tag(&inflated, 0, endian)?;
    if tag.ty != MI_MATRIX {
        bail!(Parse, "compressed element holds {} instead of miMATRIX", mi_type_name(tag.ty));
    }
    parse_matrix(payload(&inflated, &tag), endian)
}
