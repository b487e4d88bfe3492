//! MATLAB Level-5 MAT-file codec.
//!
//! Reads the subset of the format that EEG competition recordings use:
//! numeric matrices, char arrays, cell arrays and structs, optionally
//! zlib-compressed, in either byte order.
//!
//! # Quick start
//! ```no_run
//! use mindmotor::mat::open_mat;
//!
//! let mat = open_mat("data/aa.mat").unwrap();
//! println!("variables: {:?}", mat.names());
//! ```
pub mod array;
pub mod constants;
pub mod file;
pub mod tag;
pub mod write;

pub use array::{numel, parse_matrix, CellArray, CharArray, MatArray, NumericArray, StructArray};
pub use file::{open_mat, parse_mat, MatFile};
pub use tag::{decode_chars, decode_numeric, pad8, read_tag, Endian, Tag};
pub use write::MatWriter;
