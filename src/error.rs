//! Error taxonomy shared by every pipeline stage.
//!
//! Each stage validates its own output right after deriving it and returns
//! the first violation it finds. Nothing downstream of a failure runs, so a
//! caller never sees a partial epoch set or feature matrix.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed container, or a missing / structurally incompatible field.
    #[error("parse error: {0}")]
    Parse(String),

    /// Signal rows, channel names, trials or targets disagree in length.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A surviving trial label is neither 1 nor 2.
    #[error("invalid label: {0}")]
    Label(String),

    /// Invalid sampling rate, channel type, epoch window or CSP setting.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An epoch window falls outside the recording.
    #[error("epoch window out of bounds: {0}")]
    Bounds(String),

    /// Degenerate covariance or non-finite values during the CSP fit.
    #[error("numerically unstable: {0}")]
    NumericInstability(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

macro_rules! bail {
    ($kind:ident, $($arg:tt)*) => {
        return Err($crate::error::Error::$kind(format!($($arg)*)))
    };
}
pub(crate) use bail;
