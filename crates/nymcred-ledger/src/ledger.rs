//! # Ledger Interface
//!
//! The wire contract between this workspace and an identity ledger:
//!
//! ```text
//! register(nym, ownership_proof) -> { txid, block_height }
//! lookup(nym)                    -> { registered, revoked }
//! revoke(nym, revocation)        -> { txid, block_height }
//! ```
//!
//! [`TxReceipt`] and [`LedgerRecord`] serialize to exactly these JSON
//! shapes.

use std::sync::Arc;

use nymcred_core::{Nonce, TxId};
use nymcred_crypto::Pseudonym;
use nymcred_zkp::OwnershipProof;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::revocation::Revocation;

/// Registration state of one pseudonym. Unknown pseudonyms read as
/// `{ registered: false, revoked: false }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub registered: bool,
    pub revoked: bool,
}

impl LedgerRecord {
    pub const UNKNOWN: Self = Self {
        registered: false,
        revoked: false,
    };

    /// Registered and not revoked.
    pub fn is_active(&self) -> bool {
        self.registered && !self.revoked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub txid: TxId,
    /// Height of the block the transaction is (or will be) sealed into.
    pub block_height: u64,
}

/// A pseudonym registry.
///
/// Every method may fail with [`LedgerError::Unavailable`]; callers must
/// treat that as "no answer", not as a negative answer.
pub trait IdentityLedger: Send + Sync {
    /// The context that registration ownership proofs must be bound to.
    fn registration_nonce(&self) -> Nonce;

    /// Register `nym`. Atomic: of any number of concurrent registrations
    /// of the same pseudonym, exactly one succeeds.
    fn register(&self, nym: &Pseudonym, proof: &OwnershipProof) -> Result<TxReceipt, LedgerError>;

    fn lookup(&self, nym: &Pseudonym) -> Result<LedgerRecord, LedgerError>;

    /// Revoke a registered pseudonym on the authority of `revocation`.
    fn revoke(&self, nym: &Pseudonym, revocation: &Revocation) -> Result<TxReceipt, LedgerError>;
}

impl<L: IdentityLedger + ?Sized> IdentityLedger for Arc<L> {
    fn registration_nonce(&self) -> Nonce {
        (**self).registration_nonce()
    }

    fn register(&self, nym: &Pseudonym, proof: &OwnershipProof) -> Result<TxReceipt, LedgerError> {
        (**self).register(nym, proof)
    }

    fn lookup(&self, nym: &Pseudonym) -> Result<LedgerRecord, LedgerError> {
        (**self).lookup(nym)
    }

    fn revoke(&self, nym: &Pseudonym, revocation: &Revocation) -> Result<TxReceipt, LedgerError> {
        (**self).revoke(nym, revocation)
    }
}
