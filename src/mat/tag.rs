//! MAT-5 data-element tags and payload decoding.
//!
//! Two on-disk tag layouts exist:
//!
//! ```text
//! regular:  ┌──────────────┬───────────────┐
//!           │ type : u32   │ nbytes : u32  │  + nbytes payload, padded to 8
//!           └──────────────┴───────────────┘
//! small:    ┌──────────────┬──────────────┬────────────────┐
//!           │ nbytes : u16 │ type : u16   │ payload (≤ 4)  │  = 8 bytes total
//!           └──────────────┴──────────────┴────────────────┘
//! ```
//!
//! The small layout is recognised by a non-zero upper half of the first
//! 32-bit word. Byte order for both is given by the file header.
use crate::error::{bail, Result};

use super::constants::*;

// ── Byte order ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    #[inline]
    pub fn u16(self, b: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn u32(self, b: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
        }
    }

    #[inline]
    pub fn i32(self, b: [u8; 4]) -> i32 {
        self.u32(b) as i32
    }
}

// ── Tag ───────────────────────────────────────────────────────────────────

/// One data-element tag; the payload is not copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Data type (`MI_*`).
    pub ty: u32,
    /// Payload length in bytes, excluding padding.
    pub nbytes: usize,
    /// Byte offset of the tag within its buffer.
    pub pos: usize,
    /// Small data element layout (payload packed into the tag).
    pub small: bool,
}

impl Tag {
    /// Offset of the first payload byte.
    #[inline]
    pub fn data_pos(&self) -> usize {
        if self.small { self.pos + 4 } else { self.pos + 8 }
    }

    /// Offset of the element that follows this one.
    ///
    /// Compressed elements are not padded; everything else is padded to an
    /// 8-byte boundary.
    pub fn next_pos(&self) -> usize {
        if self.small {
            self.pos + 8
        } else if self.ty == MI_COMPRESSED {
            self.data_pos() + self.nbytes
        } else {
            self.data_pos() + pad8(self.nbytes)
        }
    }
}

/// Round `n` up to the next multiple of 8.
#[inline]
pub fn pad8(n: usize) -> usize {
    (n + 7) & !7
}

/// Read the tag that starts at `pos`.
pub fn read_tag(buf: &[u8], pos: usize, endian: Endian) -> Result<Tag> {
    if pos + 8 > buf.len() {
        bail!(Parse, "truncated element tag @ {pos:#x} (buffer is {} bytes)", buf.len());
    }
    let first = endian.u32(word(buf, pos));
    if first >> 16 != 0 {
        let nbytes = (first >> 16) as usize;
        if nbytes > 4 {
            bail!(Parse, "small element @ {pos:#x} claims {nbytes} bytes (max 4)");
        }
        return Ok(Tag { ty: first & 0xFFFF, nbytes, pos, small: true });
    }
    let nbytes = endian.u32(word(buf, pos + 4)) as usize;
    let tag = Tag { ty: first, nbytes, pos, small: false };
    if tag.data_pos() + nbytes > buf.len() {
        bail!(
            Parse,
            "{} element @ {pos:#x} runs past the end of the buffer ({nbytes} bytes)",
            mi_type_name(tag.ty)
        );
    }
    Ok(tag)
}

/// Borrow the payload bytes of `tag`.
pub fn payload<'a>(buf: &'a [u8], tag: &Tag) -> &'a [u8] {
    &buf[tag.data_pos()..tag.data_pos() + tag.nbytes]
}

/// Read the element at `pos` and require a given type.
pub fn read_expected<'a>(
    buf: &'a [u8],
    pos: usize,
    endian: Endian,
    ty: u32,
) -> Result<(Tag, &'a [u8])> {
    let tag = read_tag(buf, pos, endian)?;
    if tag.ty != ty {
        bail!(
            Parse,
            "expected {} @ {pos:#x}, found {}",
            mi_type_name(ty),
            mi_type_name(tag.ty)
        );
    }
    Ok((tag, payload(buf, &tag)))
}

// ── Payload decoders ──────────────────────────────────────────────────────

/// Decode a numeric payload of any integer or floating type into `f64`.
pub fn decode_numeric(data: &[u8], ty: u32, endian: Endian) -> Result<Vec<f64>> {
    let width = match ty {
        MI_INT8 | MI_UINT8 => 1,
        MI_INT16 | MI_UINT16 => 2,
        MI_INT32 | MI_UINT32 | MI_SINGLE => 4,
        MI_DOUBLE | MI_INT64 | MI_UINT64 => 8,
        _ => bail!(Parse, "{} is not a numeric data type", mi_type_name(ty)),
    };
    if data.len() % width != 0 {
        bail!(Parse, "{} payload of {} bytes is not a whole number of values", mi_type_name(ty), data.len());
    }
    let le = endian == Endian::Little;
    let out = data
        .chunks_exact(width)
        .map(|b| match ty {
            MI_INT8 => b[0] as i8 as f64,
            MI_UINT8 => b[0] as f64,
            MI_INT16 => {
                let a = [b[0], b[1]];
                (if le { i16::from_le_bytes(a) } else { i16::from_be_bytes(a) }) as f64
            }
            MI_UINT16 => endian.u16([b[0], b[1]]) as f64,
            MI_INT32 => endian.i32([b[0], b[1], b[2], b[3]]) as f64,
            MI_UINT32 => endian.u32([b[0], b[1], b[2], b[3]]) as f64,
            MI_SINGLE => f32::from_bits(endian.u32([b[0], b[1], b[2], b[3]])) as f64,
            MI_DOUBLE => {
                let a: [u8; 8] = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
                if le { f64::from_le_bytes(a) } else { f64::from_be_bytes(a) }
            }
            MI_INT64 => {
                let a: [u8; 8] = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
                (if le { i64::from_le_bytes(a) } else { i64::from_be_bytes(a) }) as f64
            }
            // MI_UINT64
            _ => {
                let a: [u8; 8] = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
                (if le { u64::from_le_bytes(a) } else { u64::from_be_bytes(a) }) as f64
            }
        })
        .collect();
    Ok(out)
}

/// Decode a character payload into one `char` per stored character.
///
/// MATLAB writes `char` arrays as UTF-16 code units (`miUINT16`) or UTF-8;
/// single-byte storage is treated as Latin-1.
pub fn decode_chars(data: &[u8], ty: u32, endian: Endian) -> Result<Vec<char>> {
    match ty {
        MI_UINT16 | MI_UTF16 => {
            if data.len() % 2 != 0 {
                bail!(Parse, "odd-length UTF-16 character payload ({} bytes)", data.len());
            }
            let units: Vec<u16> = data
                .chunks_exact(2)
                .map(|b| endian.u16([b[0], b[1]]))
                .collect();
            Ok(char::decode_utf16(units)
                .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
                .collect())
        }
        MI_UTF8 => match std::str::from_utf8(data) {
            Ok(s) => Ok(s.chars().collect()),
            Err(e) => bail!(Parse, "invalid UTF-8 character payload: {e}"),
        },
        MI_INT8 | MI_UINT8 => Ok(data.iter().map(|&b| b as char).collect()),
        _ => bail!(Parse, "{} cannot hold character data", mi_type_name(ty)),
    }
}

#[inline]
fn word(buf: &[u8], pos: usize) -> [u8; 4] {
    [buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_tag(ty: u32, nbytes: u32) -> Vec<u8> {
        let mut b = ty.to_le_bytes().to_vec();
        b.extend_from_slice(&nbytes.to_le_bytes());
        b
    }

    #[test]
    fn regular_tag_is_padded() {
        let mut buf = regular_tag(MI_INT8, 3);
        buf.extend_from_slice(b"abc\0\0\0\0\0");
        let tag = read_tag(&buf, 0, Endian::Little).unwrap();
        assert!(!tag.small);
        assert_eq!(tag.nbytes, 3);
        assert_eq!(payload(&buf, &tag), b"abc");
        assert_eq!(tag.next_pos(), 16);
    }

    #[test]
    fn small_element_layout() {
        // nbytes = 2, type = miINT8, payload "fs" + 2 pad bytes.
        let first: u32 = (2 << 16) | MI_INT8;
        let mut buf = first.to_le_bytes().to_vec();
        buf.extend_from_slice(b"fs\0\0");
        let tag = read_tag(&buf, 0, Endian::Little).unwrap();
        assert!(tag.small);
        assert_eq!(tag.ty, MI_INT8);
        assert_eq!(payload(&buf, &tag), b"fs");
        assert_eq!(tag.next_pos(), 8);
    }

    #[test]
    fn big_endian_tag() {
        let mut buf = MI_DOUBLE.to_be_bytes().to_vec();
        buf.extend_from_slice(&8u32.to_be_bytes());
        buf.extend_from_slice(&100.0_f64.to_be_bytes());
        let tag = read_tag(&buf, 0, Endian::Big).unwrap();
        let v = decode_numeric(payload(&buf, &tag), tag.ty, Endian::Big).unwrap();
        approx::assert_abs_diff_eq!(v[0], 100.0, epsilon = 1e-12);
    }

    #[test]
    fn compressed_next_pos_is_unpadded() {
        let tag = Tag { ty: MI_COMPRESSED, nbytes: 13, pos: 128, small: false };
        assert_eq!(tag.next_pos(), 128 + 8 + 13);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let mut buf = regular_tag(MI_DOUBLE, 16);
        buf.extend_from_slice(&[0u8; 8]);
        assert!(read_tag(&buf, 0, Endian::Little).is_err());
    }

    #[test]
    fn decode_signed_integers() {
        let data: Vec<u8> = [-3_i16, 7].iter().flat_map(|v| v.to_le_bytes()).collect();
        let v = decode_numeric(&data, MI_INT16, Endian::Little).unwrap();
        assert_eq!(v, vec![-3.0, 7.0]);
    }

    #[test]
    fn decode_utf16_chars() {
        let data: Vec<u8> = "C3".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let c = decode_chars(&data, MI_UINT16, Endian::Little).unwrap();
        assert_eq!(c, vec!['C', '3']);
    }
}
