//! Ledger errors.

use nymcred_core::{CanonicalizationError, TxId};
use nymcred_crypto::{CryptoError, Pseudonym};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// The ledger could not be reached. Retryable; never a verdict.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("pseudonym {0} is already registered")]
    AlreadyRegistered(Pseudonym),

    #[error("pseudonym {0} is not registered")]
    NotRegistered(Pseudonym),

    #[error("pseudonym {0} is already revoked")]
    AlreadyRevoked(Pseudonym),

    #[error("invalid ownership proof: {0}")]
    InvalidOwnershipProof(String),

    #[error("unauthorized revocation: {0}")]
    UnauthorizedRevocation(String),

    #[error("transaction {0} is not in a sealed block")]
    UnknownTransaction(TxId),

    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl LedgerError {
    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
