//! MAT-5 writer.
//!
//! Produces little-endian Level-5 files that the reader in this crate (and
//! MATLAB / `scipy.io.loadmat`) can open. Used to build synthetic recordings.
//!
//! Usage:
//! ```rust,no_run
//! use mindmotor::mat::{MatArray, MatWriter, NumericArray};
//! use std::path::Path;
//!
//! let mut w = MatWriter::new();
//! w.add("fs", MatArray::Numeric(NumericArray::scalar_value(100.0)));
//! w.write(Path::new("/tmp/out.mat")).unwrap();
//! ```
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{bail, Result};

use super::array::{numel, MatArray};
use super::constants::*;

/// Collects named variables and serialises them into one file.
#[derive(Debug, Clone, Default)]
pub struct MatWriter {
    variables: Vec<(String, MatArray)>,
    compress: bool,
}

impl MatWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap every variable in a zlib `miCOMPRESSED` element (MATLAB `-v7`).
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn add(&mut self, name: &str, value: MatArray) -> &mut Self {
        self.variables.push((name.to_string(), value));
        self
    }

    /// Serialise header + variables.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = header_bytes();
        for (name, value) in &self.variables {
            let element = encode_matrix(name, value)?;
            if self.compress {
                let mut z = ZlibEncoder::new(Vec::new(), Compression::default());
                z.write_all(&element)?;
                let packed = z.finish()?;
                out.extend_from_slice(&MI_COMPRESSED.to_le_bytes());
                out.extend_from_slice(&(packed.len() as u32).to_le_bytes());
                out.extend_from_slice(&packed);
            } else {
                out.extend_from_slice(&element);
            }
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

fn header_bytes() -> Vec<u8> {
    let mut h = vec![b' '; HEADER_LEN];
    let text = b"MATLAB 5.0 MAT-file, written by mindmotor";
    h[..text.len()].copy_from_slice(text);
    // Subsystem data offset: unused.
    h[HEADER_TEXT_LEN..HEADER_TEXT_LEN + 8].fill(0);
    h[124..126].copy_from_slice(&MAT_VERSION.to_le_bytes());
    h[126..128].copy_from_slice(&ENDIAN_LE);
    h
}

/// Append one data element, using the small layout for 1–4 byte payloads.
fn put_element(out: &mut Vec<u8>, ty: u32, data: &[u8]) {
    if !data.is_empty() && data.len() <= 4 {
        out.extend_from_slice(&(((data.len() as u32) << 16) | ty).to_le_bytes());
        out.extend_from_slice(data);
        out.extend(std::iter::repeat(0u8).take(4 - data.len()));
        return;
    }
    out.extend_from_slice(&ty.to_le_bytes());
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    let pad = (8 - data.len() % 8) % 8;
    out.extend(std::iter::repeat(0u8).take(pad));
}

/// Encode a complete `miMATRIX` element (tag included).
fn encode_matrix(name: &str, value: &MatArray) -> Result<Vec<u8>> {
    let dims = value.dims();
    let n = match numel(dims) {
        Some(n) => n,
        None => bail!(Shape, "'{name}': dimensions {dims:?} overflow the element count"),
    };
    let mut body = Vec::new();

    let (class, logical) = match value {
        MatArray::Numeric(a) => (a.class, a.logical),
        MatArray::Char(_) => (MX_CHAR_CLASS, false),
        MatArray::Cell(_) => (MX_CELL_CLASS, false),
        MatArray::Struct(_) => (MX_STRUCT_CLASS, false),
    };
    let mut flags = class as u32;
    if logical {
        flags |= FLAG_LOGICAL;
    }
    let mut flag_bytes = flags.to_le_bytes().to_vec();
    flag_bytes.extend_from_slice(&0u32.to_le_bytes());
    put_element(&mut body, MI_UINT32, &flag_bytes);

    let dim_bytes: Vec<u8> = dims.iter().flat_map(|&d| (d as i32).to_le_bytes()).collect();
    put_element(&mut body, MI_INT32, &dim_bytes);
    put_element(&mut body, MI_INT8, name.as_bytes());

    match value {
        MatArray::Numeric(a) => {
            if a.data.len() != n {
                bail!(Shape, "'{name}': {} values for dimensions {dims:?}", a.data.len());
            }
            let (ty, bytes) = encode_numeric(a.class, &a.data)?;
            put_element(&mut body, ty, &bytes);
        }
        MatArray::Char(a) => {
            if a.chars.len() != n {
                bail!(Shape, "'{name}': {} characters for dimensions {dims:?}", a.chars.len());
            }
            let mut bytes = Vec::with_capacity(2 * n);
            for &c in &a.chars {
                let u = c as u32;
                if u > 0xFFFF {
                    bail!(Parse, "'{name}': character {c:?} does not fit one UTF-16 unit");
                }
                bytes.extend_from_slice(&(u as u16).to_le_bytes());
            }
            put_element(&mut body, MI_UINT16, &bytes);
        }
        MatArray::Cell(a) => {
            if a.cells.len() != n {
                bail!(Shape, "'{name}': {} cells for dimensions {dims:?}", a.cells.len());
            }
            for cell in &a.cells {
                body.extend_from_slice(&encode_matrix("", cell)?);
            }
        }
        MatArray::Struct(s) => {
            if s.elements.len() != n {
                bail!(Shape, "'{name}': {} struct elements for dimensions {dims:?}", s.elements.len());
            }
            let longest = s.field_names.iter().map(String::len).max().unwrap_or(0);
            let slot = FIELD_NAME_LEN.max(longest + 1);
            put_element(&mut body, MI_INT32, &(slot as i32).to_le_bytes());
            let mut names = vec![0u8; slot * s.field_names.len()];
            for (i, f) in s.field_names.iter().enumerate() {
                names[i * slot..i * slot + f.len()].copy_from_slice(f.as_bytes());
            }
            put_element(&mut body, MI_INT8, &names);
            for element in &s.elements {
                if element.len() != s.field_names.len() {
                    bail!(Shape, "'{name}': struct element has {} values for {} fields",
                        element.len(), s.field_names.len());
                }
                for v in element {
                    body.extend_from_slice(&encode_matrix("", v)?);
                }
            }
        }
    }

    let mut out = Vec::with_capacity(body.len() + 8);
    out.extend_from_slice(&MI_MATRIX.to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(out)
}

/// Storage type and little-endian bytes for a numeric class.
fn encode_numeric(class: u8, data: &[f64]) -> Result<(u32, Vec<u8>)> {
    let out: (u32, Vec<u8>) = match class {
        MX_DOUBLE_CLASS => (MI_DOUBLE, data.iter().flat_map(|v| v.to_le_bytes()).collect()),
        MX_SINGLE_CLASS => (MI_SINGLE, data.iter().flat_map(|&v| (v as f32).to_le_bytes()).collect()),
        MX_INT8_CLASS => (MI_INT8, data.iter().flat_map(|&v| (v as i8).to_le_bytes()).collect()),
        MX_UINT8_CLASS => (MI_UINT8, data.iter().map(|&v| v as u8).collect()),
        MX_INT16_CLASS => (MI_INT16, data.iter().flat_map(|&v| (v as i16).to_le_bytes()).collect()),
        MX_UINT16_CLASS => (MI_UINT16, data.iter().flat_map(|&v| (v as u16).to_le_bytes()).collect()),
        MX_INT32_CLASS => (MI_INT32, data.iter().flat_map(|&v| (v as i32).to_le_bytes()).collect()),
        MX_UINT32_CLASS => (MI_UINT32, data.iter().flat_map(|&v| (v as u32).to_le_bytes()).collect()),
        MX_INT64_CLASS => (MI_INT64, data.iter().flat_map(|&v| (v as i64).to_le_bytes()).collect()),
        MX_UINT64_CLASS => (MI_UINT64, data.iter().flat_map(|&v| (v as u64).to_le_bytes()).collect()),
        other => bail!(Parse, "class {other} is not numeric"),
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat::{parse_mat, CellArray, CharArray, NumericArray, StructArray};

    fn nested_struct() -> MatArray {
        MatArray::Struct(StructArray::scalar(vec![
            ("fs", MatArray::Numeric(NumericArray::scalar_value(100.0))),
            (
                "clab",
                MatArray::Cell(CellArray::row(vec![
                    MatArray::Char(CharArray::from_text("C3")),
                    MatArray::Char(CharArray::from_text("Cz")),
                ])),
            ),
        ]))
    }

    #[test]
    fn struct_survives_write_and_read() {
        for compress in [false, true] {
            let mut w = MatWriter::new().compressed(compress);
            w.add("nfo", nested_struct());
            let mat = parse_mat(&w.to_bytes().unwrap()).unwrap();
            assert_eq!(mat.names(), vec!["nfo"]);
            assert_eq!(mat.get("nfo"), Some(&nested_struct()));
        }
    }

    #[test]
    fn integer_class_keeps_its_storage() {
        let pos = NumericArray::row(vec![10.0, 250.0, 70_000.0]).with_class(MX_INT32_CLASS);
        let mut w = MatWriter::new();
        w.add("pos", MatArray::Numeric(pos.clone()));
        let mat = parse_mat(&w.to_bytes().unwrap()).unwrap();
        let got = mat.get("pos").and_then(MatArray::as_numeric).unwrap();
        assert_eq!(got.class, MX_INT32_CLASS);
        assert_eq!(got.data, pos.data);
    }

    #[test]
    fn nan_survives_double_storage() {
        let y = NumericArray::row(vec![1.0, f64::NAN, 2.0]);
        let mut w = MatWriter::new();
        w.add("y", MatArray::Numeric(y));
        let mat = parse_mat(&w.to_bytes().unwrap()).unwrap();
        let got = mat.get("y").and_then(MatArray::as_numeric).unwrap();
        assert!(got.data[1].is_nan());
        assert_eq!(got.data[2], 2.0);
    }

    #[test]
    fn mismatched_dims_are_rejected() {
        let bad = NumericArray::from_f64(vec![2, 2], vec![1.0]);
        let mut w = MatWriter::new();
        w.add("bad", MatArray::Numeric(bad));
        assert!(matches!(w.to_bytes(), Err(crate::Error::Shape(_))));
    }
}
