//! In-memory MATLAB arrays and the `miMATRIX` decoder.
//!
//! Every array keeps MATLAB's dimension vector and its elements in
//! **column-major** order exactly as stored; orientation changes happen only
//! in the explicit conversion helpers (e.g. [`NumericArray::to_array2`]).
//!
//! `miMATRIX` payload layout:
//!
//! ```text
//! array flags      miUINT32 [flags | class, nzmax]
//! dimensions       miINT32  [d0, d1, …]
//! array name       miINT8   (may be empty)
//! ── class specific ──────────────────────────────────────────────
//! numeric          real part (any numeric type)
//! char             character data (miUINT16 / miUTF8 / …)
//! cell             numel × miMATRIX
//! struct           field-name length (miINT32), field names (miINT8),
//!                  numel × nfields × miMATRIX   (element-major)
//! ```
use ndarray::{Array2, ShapeBuilder};

use crate::error::{bail, Result};

use super::constants::*;
use super::tag::{decode_chars, decode_numeric, payload, read_expected, read_tag, Endian};

// ── Array types ───────────────────────────────────────────────────────────

/// Any array the reader understands.
#[derive(Debug, Clone, PartialEq)]
pub enum MatArray {
    Numeric(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Struct(StructArray),
}

/// Real numeric array, values widened to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    /// Array class (`MX_DOUBLE_CLASS`, `MX_INT16_CLASS`, …).
    pub class: u8,
    pub logical: bool,
    pub dims: Vec<usize>,
    /// Column-major values.
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub dims: Vec<usize>,
    /// Column-major characters.
    pub chars: Vec<char>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub dims: Vec<usize>,
    /// Column-major cells.
    pub cells: Vec<MatArray>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    pub dims: Vec<usize>,
    pub field_names: Vec<String>,
    /// `elements[i][f]`: value of field `f` in struct element `i` (column-major `i`).
    pub elements: Vec<Vec<MatArray>>,
}

impl MatArray {
    /// MATLAB class name, for diagnostics.
    pub fn class_name(&self) -> &'static str {
        match self {
            MatArray::Numeric(n) => match n.class {
                _ if n.logical => "logical",
                MX_DOUBLE_CLASS => "double",
                MX_SINGLE_CLASS => "single",
                MX_INT8_CLASS => "int8",
                MX_UINT8_CLASS => "uint8",
                MX_INT16_CLASS => "int16",
                MX_UINT16_CLASS => "uint16",
                MX_INT32_CLASS => "int32",
                MX_UINT32_CLASS => "uint32",
                MX_INT64_CLASS => "int64",
                _ => "uint64",
            },
            MatArray::Char(_) => "char",
            MatArray::Cell(_) => "cell",
            MatArray::Struct(_) => "struct",
        }
    }

    pub fn dims(&self) -> &[usize] {
        match self {
            MatArray::Numeric(a) => &a.dims,
            MatArray::Char(a) => &a.dims,
            MatArray::Cell(a) => &a.dims,
            MatArray::Struct(a) => &a.dims,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            MatArray::Numeric(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<&CharArray> {
        match self {
            MatArray::Char(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellArray> {
        match self {
            MatArray::Cell(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match self {
            MatArray::Struct(a) => Some(a),
            _ => None,
        }
    }
}

/// Number of elements implied by a dimension vector, `None` on overflow.
#[inline]
pub fn numel(dims: &[usize]) -> Option<usize> {
    if dims.is_empty() {
        return Some(0);
    }
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// True for 1×N, N×1 (and trivially 1×1 / empty) shapes.
#[inline]
fn is_vector_shape(dims: &[usize]) -> bool {
    dims.iter().filter(|&&d| d != 1).count() <= 1
}

impl NumericArray {
    /// `double` array from column-major values.
    pub fn from_f64(dims: Vec<usize>, data: Vec<f64>) -> Self {
        Self { class: MX_DOUBLE_CLASS, logical: false, dims, data }
    }

    /// Row vector `1 × N`.
    pub fn row(data: Vec<f64>) -> Self {
        Self::from_f64(vec![1, data.len()], data)
    }

    /// `1 × 1` double.
    pub fn scalar_value(v: f64) -> Self {
        Self::from_f64(vec![1, 1], vec![v])
    }

    /// Store as a different numeric class (the writer emits the matching type).
    pub fn with_class(mut self, class: u8) -> Self {
        self.class = class;
        self
    }

    /// Build from a `[rows, cols]` ndarray, flattening column-major.
    pub fn from_array2(a: &Array2<f64>) -> Self {
        let (r, c) = a.dim();
        let data = a.t().iter().copied().collect();
        Self::from_f64(vec![r, c], data)
    }

    pub fn numel(&self) -> Option<usize> {
        numel(&self.dims)
    }

    /// The single value of a `1 × 1` array.
    pub fn scalar(&self) -> Option<f64> {
        (self.data.len() == 1).then(|| self.data[0])
    }

    /// Values of a row or column vector, in order.
    pub fn to_vec1(&self) -> Option<Vec<f64>> {
        is_vector_shape(&self.dims).then(|| self.data.clone())
    }

    /// A 2-D array as `[dims[0], dims[1]]`, honouring column-major storage.
    pub fn to_array2(&self) -> Result<Array2<f64>> {
        if self.dims.len() != 2 {
            bail!(Parse, "expected a 2-D matrix, got {} dimensions", self.dims.len());
        }
        let shape = (self.dims[0], self.dims[1]).f();
        match Array2::from_shape_vec(shape, self.data.clone()) {
            Ok(a) => Ok(a),
            Err(e) => bail!(Parse, "matrix data does not fit {:?}: {e}", self.dims),
        }
    }
}

impl CharArray {
    /// `1 × N` char array.
    pub fn from_text(s: &str) -> Self {
        let chars: Vec<char> = s.chars().collect();
        Self { dims: vec![1, chars.len()], chars }
    }

    /// One string per row (MATLAB char matrices are padded row-wise).
    pub fn rows(&self) -> Vec<String> {
        if self.chars.is_empty() {
            return vec![String::new()];
        }
        if self.dims.len() != 2 {
            return vec![self.chars.iter().collect()];
        }
        let (r, c) = (self.dims[0], self.dims[1]);
        (0..r)
            .map(|i| (0..c).map(|j| self.chars[i + j * r]).collect())
            .collect()
    }

    /// The text of a single-row char array (empty for `0 × 0`).
    pub fn as_string(&self) -> Option<String> {
        let rows = self.rows();
        (rows.len() == 1).then(|| rows.into_iter().next().unwrap_or_default())
    }
}

impl CellArray {
    /// `1 × N` cell row.
    pub fn row(cells: Vec<MatArray>) -> Self {
        Self { dims: vec![1, cells.len()], cells }
    }
}

impl StructArray {
    /// `1 × 1` struct from `(field, value)` pairs, in field order.
    pub fn scalar(fields: Vec<(&str, MatArray)>) -> Self {
        let (names, values): (Vec<_>, Vec<_>) = fields
            .into_iter()
            .map(|(n, v)| (n.to_string(), v))
            .unzip();
        Self { dims: vec![1, 1], field_names: names, elements: vec![values] }
    }

    pub fn numel(&self) -> Option<usize> {
        numel(&self.dims)
    }

    /// Field of the first struct element (MATLAB's `s.name` on a scalar struct).
    pub fn field(&self, name: &str) -> Option<&MatArray> {
        self.field_at(0, name)
    }

    pub fn field_at(&self, index: usize, name: &str) -> Option<&MatArray> {
        let f = self.field_names.iter().position(|n| n == name)?;
        self.elements.get(index)?.get(f)
    }
}

// ── miMATRIX decoder ──────────────────────────────────────────────────────

/// Decode one `miMATRIX` payload into `(name, array)`.
///
/// An empty payload is MATLAB's encoding of `[]` and decodes to a `0 × 0`
/// double array.
pub fn parse_matrix(buf: &[u8], endian: Endian) -> Result<(String, MatArray)> {
    if buf.is_empty() {
        return Ok((String::new(), MatArray::Numeric(NumericArray::from_f64(vec![0, 0], vec![]))));
    }

    // Array flags.
    let (flags_tag, flags) = read_expected(buf, 0, endian, MI_UINT32)?;
    if flags.len() < 4 {
        bail!(Parse, "array flags element too short ({} bytes)", flags.len());
    }
    let word = endian.u32([flags[0], flags[1], flags[2], flags[3]]);
    let class = (word & 0xFF) as u8;
    let complex = word & FLAG_COMPLEX != 0;
    let logical = word & FLAG_LOGICAL != 0;

    // Dimensions.
    let (dims_tag, raw_dims) = read_expected(buf, flags_tag.next_pos(), endian, MI_INT32)?;
    let mut dims = Vec::with_capacity(raw_dims.len() / 4);
    for d in decode_numeric(raw_dims, MI_INT32, endian)? {
        if d < 0.0 {
            bail!(Parse, "negative array dimension {d}");
        }
        dims.push(d as usize);
    }

    // Name.
    let (name_tag, raw_name) = read_expected(buf, dims_tag.next_pos(), endian, MI_INT8)?;
    let name = latin1(raw_name);
    let mut pos = name_tag.next_pos();
    let n = match numel(&dims) {
        Some(n) => n,
        None => bail!(Parse, "array '{name}': dimensions {dims:?} overflow the element count"),
    };

    let array = match class {
        MX_DOUBLE_CLASS | MX_SINGLE_CLASS | MX_INT8_CLASS | MX_UINT8_CLASS | MX_INT16_CLASS
        | MX_UINT16_CLASS | MX_INT32_CLASS | MX_UINT32_CLASS | MX_INT64_CLASS
        | MX_UINT64_CLASS => {
            if complex {
                bail!(Parse, "complex array '{name}' is not supported");
            }
            let tag = read_tag(buf, pos, endian)?;
            let data = decode_numeric(payload(buf, &tag), tag.ty, endian)?;
            if data.len() != n {
                bail!(Parse, "array '{name}': {} values for dimensions {dims:?}", data.len());
            }
            MatArray::Numeric(NumericArray { class, logical, dims, data })
        }
        MX_CHAR_CLASS => {
            let tag = read_tag(buf, pos, endian)?;
            let chars = decode_chars(payload(buf, &tag), tag.ty, endian)?;
            if chars.len() != n {
                bail!(Parse, "char array '{name}': {} characters for dimensions {dims:?}", chars.len());
            }
            MatArray::Char(CharArray { dims, chars })
        }
        MX_CELL_CLASS => {
            // Every cell is at least one 8-byte tag.
            let room = buf.len().saturating_sub(pos) / 8;
            if n > room {
                bail!(Parse, "cell '{name}': {n} cells cannot fit in the element");
            }
            let mut cells = Vec::with_capacity(n);
            for _ in 0..n {
                let (tag, inner) = read_expected(buf, pos, endian, MI_MATRIX)?;
                cells.push(parse_matrix(inner, endian)?.1);
                pos = tag.next_pos();
            }
            MatArray::Cell(CellArray { dims, cells })
        }
        MX_STRUCT_CLASS => {
            let (len_tag, raw_len) = read_expected(buf, pos, endian, MI_INT32)?;
            let field_len = match decode_numeric(raw_len, MI_INT32, endian)?.first() {
                Some(&l) if l > 0.0 => l as usize,
                _ => bail!(Parse, "struct '{name}' has an invalid field-name length"),
            };
            let (names_tag, raw_names) = read_expected(buf, len_tag.next_pos(), endian, MI_INT8)?;
            let field_names: Vec<String> = raw_names.chunks(field_len).map(latin1).collect();
            pos = names_tag.next_pos();

            let values = n.checked_mul(field_names.len());
            let room = buf.len().saturating_sub(pos) / 8;
            match values {
                Some(v) if v <= room && n <= buf.len() => {}
                _ => bail!(
                    Parse,
                    "struct '{name}': {n} elements × {} fields cannot fit in the element",
                    field_names.len()
                ),
            }
            let mut elements = Vec::with_capacity(n);
            for _ in 0..n {
                let mut values = Vec::with_capacity(field_names.len());
                for _ in 0..field_names.len() {
                    let (tag, inner) = read_expected(buf, pos, endian, MI_MATRIX)?;
                    values.push(parse_matrix(inner, endian)?.1);
                    pos = tag.next_pos();
                }
                elements.push(values);
            }
            MatArray::Struct(StructArray { dims, field_names, elements })
        }
        MX_SPARSE_CLASS => bail!(Parse, "sparse array '{name}' is not supported"),
        MX_OBJECT_CLASS | MX_FUNCTION_CLASS | MX_OPAQUE_CLASS => {
            bail!(Parse, "object array '{name}' (class {class}) is not supported")
        }
        other => bail!(Parse, "array '{name}' has unknown class {other}"),
    };

    Ok((name, array))
}

/// NUL-terminated Latin-1 bytes → `String`.
fn latin1(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|&b| b as char).collect()
}
