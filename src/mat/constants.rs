//! MAT-file Level 5 constants.
//!
//! Names follow the MathWorks "MAT-File Format" reference so the reader can
//! be cross-checked against the document table by table.
//!
//! A Level-5 file is a 128-byte header followed by a flat sequence of **data
//! elements**. Every element is an 8-byte tag (`type`, `nbytes`) and a payload
//! padded to an 8-byte boundary. Variables are `miMATRIX` elements, possibly
//! wrapped in a zlib-compressed `miCOMPRESSED` element.

#![allow(dead_code)]

// ── Header ────────────────────────────────────────────────────────────────

/// Size of the file header in bytes.
pub const HEADER_LEN:        usize = 128;
/// Length of the descriptive text field at the start of the header.
pub const HEADER_TEXT_LEN:   usize = 116;
/// Version field value for Level-5 files.
pub const MAT_VERSION:       u16 = 0x0100;
/// Endian indicator as written by a little-endian machine.
pub const ENDIAN_LE:         [u8; 2] = *b"IM";
/// Endian indicator as written by a big-endian machine.
pub const ENDIAN_BE:         [u8; 2] = *b"MI";

// ── Data types (tag `type` field) ─────────────────────────────────────────

pub const MI_INT8:       u32 = 1;
pub const MI_UINT8:      u32 = 2;
pub const MI_INT16:      u32 = 3;
pub const MI_UINT16:     u32 = 4;
pub const MI_INT32:      u32 = 5;
pub const MI_UINT32:     u32 = 6;
pub const MI_SINGLE:     u32 = 7;
pub const MI_DOUBLE:     u32 = 9;
pub const MI_INT64:      u32 = 12;
pub const MI_UINT64:     u32 = 13;
/// A nested array (variable, cell element, struct field value).
pub const MI_MATRIX:     u32 = 14;
/// zlib stream holding exactly one further data element.
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8:       u32 = 16;
pub const MI_UTF16:      u32 = 17;
pub const MI_UTF32:      u32 = 18;

// ── Array classes (low byte of the array-flags word) ──────────────────────

pub const MX_CELL_CLASS:     u8 = 1;
pub const MX_STRUCT_CLASS:   u8 = 2;
pub const MX_OBJECT_CLASS:   u8 = 3;
pub const MX_CHAR_CLASS:     u8 = 4;
pub const MX_SPARSE_CLASS:   u8 = 5;
pub const MX_DOUBLE_CLASS:   u8 = 6;
pub const MX_SINGLE_CLASS:   u8 = 7;
pub const MX_INT8_CLASS:     u8 = 8;
pub const MX_UINT8_CLASS:    u8 = 9;
pub const MX_INT16_CLASS:    u8 = 10;
pub const MX_UINT16_CLASS:   u8 = 11;
pub const MX_INT32_CLASS:    u8 = 12;
pub const MX_UINT32_CLASS:   u8 = 13;
pub const MX_INT64_CLASS:    u8 = 14;
pub const MX_UINT64_CLASS:   u8 = 15;
pub const MX_FUNCTION_CLASS: u8 = 16;
pub const MX_OPAQUE_CLASS:   u8 = 17;

// ── Array-flag bits (second byte of the array-flags word) ─────────────────

pub const FLAG_COMPLEX: u32 = 0x0800;
pub const FLAG_GLOBAL:  u32 = 0x0400;
pub const FLAG_LOGICAL: u32 = 0x0200;

/// Field-name slot width written for struct arrays (MATLAB's own default).
pub const FIELD_NAME_LEN: usize = 32;

/// Human-readable name for a data type, used in error messages.
pub fn mi_type_name(ty: u32) -> &'static str {
    match ty {
        MI_INT8 => "miINT8",
        MI_UINT8 => "miUINT8",
        MI_INT16 => "miINT16",
        MI_UINT16 => "miUINT16",
        MI_INT32 => "miINT32",
        MI_UINT32 => "miUINT32",
        MI_SINGLE => "miSINGLE",
        MI_DOUBLE => "miDOUBLE",
        MI_INT64 => "miINT64",
        MI_UINT64 => "miUINT64",
        MI_MATRIX => "miMATRIX",
        MI_COMPRESSED => "miCOMPRESSED",
        MI_UTF8 => "miUTF8",
        MI_UTF16 => "miUTF16",
        MI_UTF32 => "miUTF32",
        _ => "unknown",
    }
}
