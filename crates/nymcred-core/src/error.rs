//! # Error Types
//!
//! Errors shared by every layer of the workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//! Crates higher in the graph wrap these with `#[from]`.

use thiserror::Error;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum NymcredError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A byte-level encoding could not be parsed.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// An identifier or timestamp failed validation.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error while decoding a fixed-width or length-prefixed byte layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The input ended before a field could be read.
    #[error("truncated input: needed {needed} bytes for {field}, {remaining} remaining")]
    Truncated {
        /// Field being decoded.
        field: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// Bytes remained after the last field was decoded.
    #[error("{0} trailing bytes after end of encoding")]
    TrailingBytes(usize),

    /// A length does not fit the prefix width used by the layout.
    #[error("length {len} of {field} exceeds the maximum {max}")]
    LengthOverflow {
        /// Field being encoded.
        field: &'static str,
        /// Actual length.
        len: usize,
        /// Largest representable length.
        max: usize,
    },

    /// A string field is not valid UTF-8.
    #[error("field {0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    /// A hex string is malformed.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// A version or tag byte is not recognised.
    #[error("unsupported {field} tag: {tag:#04x}")]
    UnknownTag {
        /// Field carrying the tag.
        field: &'static str,
        /// Tag value read.
        tag: u8,
    },
}
