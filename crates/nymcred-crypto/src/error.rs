use nymcred_core::{CanonicalizationError, EncodingError};
use thiserror::Error;

/// Errors from group encoding, key handling, and signature checks.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Truncated, oversized, or otherwise malformed byte layout.
    #[error("malformed encoding: {0}")]
    Encoding(#[from] EncodingError),

    /// Compressed bytes are not a point on the curve, or the point lies
    /// outside the prime-order subgroup.
    #[error("invalid {group} point: off-curve, off-subgroup, or non-canonical")]
    InvalidPoint {
        /// `"G1"` or `"G2"`.
        group: &'static str,
    },

    /// A protocol element decoded to the group identity.
    #[error("{group} element must not be the identity")]
    IdentityPoint {
        /// `"G1"` or `"G2"`.
        group: &'static str,
    },

    /// Scalar bytes are not the canonical encoding of a field element.
    #[error("non-canonical scalar encoding")]
    NonCanonicalScalar,

    /// Issuer slot count is outside the supported range.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Issuer public key failed structural or pairing validation.
    #[error("invalid issuer public key: {0}")]
    InvalidPublicKey(String),

    /// Message vector does not match the key's slot count.
    #[error("message vector has {got} entries, issuer key expects {expected}")]
    MessageCount {
        /// Slots declared by the key.
        expected: usize,
        /// Messages supplied.
        got: usize,
    },

    /// A signature or slot index is out of the key's range.
    #[error("slot {slot} out of range for issuer key with {slot_count} slots")]
    SlotOutOfRange {
        /// Offending slot index.
        slot: usize,
        /// Key slot count.
        slot_count: usize,
    },

    /// Signature did not verify.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key material could not be parsed or used.
    #[error("key error: {0}")]
    KeyError(String),

    /// Canonical serialization of a signed statement failed.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Merkle Mountain Range misuse (empty range, leaf out of bounds).
    #[error("mmr error: {0}")]
    Mmr(String),
}
