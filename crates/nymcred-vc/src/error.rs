//! # Error Types
//!
//! One enum per operation family. Verification outcomes are not errors:
//! they are [`crate::Verdict`]s, and only a ledger outage surfaces as
//! `Err` from [`crate::ProofVerifier::verify()`].

use nymcred_core::EncodingError;
use nymcred_crypto::CryptoError;
use nymcred_ledger::LedgerError;
use nymcred_zkp::ZkpError;
use thiserror::Error;

/// Schema declaration or attribute encoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid value for attribute {name}: {reason}")]
    InvalidAttributeEncoding { name: String, reason: String },

    /// An attribute was supplied that the schema does not declare.
    #[error("attribute {0} is not declared in the schema")]
    UnmappedAttribute(String),

    #[error("attribute {0} is required by the schema but missing")]
    MissingAttribute(String),

    /// A disclosure request names an attribute the schema does not declare.
    #[error("unknown attribute {0}")]
    UnknownAttribute(String),
}

#[derive(Error, Debug)]
pub enum IssueError {
    #[error("invalid ownership proof: {0}")]
    InvalidOwnershipProof(ZkpError),

    #[error("invalid commitment proof: {0}")]
    InvalidCommitmentProof(ZkpError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The freshly produced signature failed its own verification.
    #[error("signature self-check failed: {0}")]
    SelfCheck(CryptoError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

#[derive(Error, Debug)]
pub enum PresentError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("credential does not verify for these attributes under this issuer: {0}")]
    InvalidCredential(CryptoError),

    #[error(transparent)]
    Proof(#[from] ZkpError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// A presentation could not be decoded.
#[derive(Error, Debug)]
pub enum ProofDecodeError {
    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Proof(#[from] ZkpError),

    #[error("malformed proof: {0}")]
    Malformed(String),
}
