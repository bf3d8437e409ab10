//! # Revocation Statements
//!
//! A revocation authority signs the canonical JSON of
//! `{ "ledger": <ledger id>, "nym": <pseudonym hex> }` with Ed25519.
//! Binding the ledger id keeps a statement for one ledger from being
//! replayed on another.

use nymcred_core::{CanonicalBytes, LedgerId};
use nymcred_crypto::ed25519::verify;
use nymcred_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature, Pseudonym};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationStatement {
    pub ledger: LedgerId,
    pub nym: Pseudonym,
}

impl RevocationStatement {
    pub fn new(ledger: LedgerId, nym: Pseudonym) -> Self {
        Self { ledger, nym }
    }

    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, LedgerError> {
        Ok(CanonicalBytes::new(self)?)
    }
}

/// An authority's signature over a [`RevocationStatement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub authority: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

impl Revocation {
    pub fn sign(
        authority: &Ed25519KeyPair,
        statement: &RevocationStatement,
    ) -> Result<Self, LedgerError> {
        let bytes = statement.canonical_bytes()?;
        Ok(Self {
            authority: authority.public_key(),
            signature: authority.sign(&bytes),
        })
    }

    /// Check the signature only; whether `authority` may revoke is the
    /// ledger's decision.
    pub fn verify(&self, statement: &RevocationStatement) -> Result<(), LedgerError> {
        let bytes = statement.canonical_bytes()?;
        verify(&bytes, &self.signature, &self.authority)
            .map_err(|e| LedgerError::UnauthorizedRevocation(e.to_string()))
    }
}
