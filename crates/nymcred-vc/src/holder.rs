//! # Holder Side of Blind Issuance
//!
//! 1. [`BlindIssuanceRequest::prepare()`] commits to the hidden attribute
//!    values and proves pseudonym ownership, both bound to the issuer's
//!    nonce. The request goes to the issuer; the returned
//!    [`PendingBlindIssuance`] stays with the holder.
//! 2. The issuer answers with a [`BlindSignature`].
//! 3. [`complete_blind_issuance()`] adds the commitment blinding back into
//!    `s` and verifies the finished credential over the full attribute set.

use nymcred_core::Nonce;
use nymcred_crypto::{BlindSignature, IssuerPublicKey, Pseudonym, Scalar, SecretScalar};
use nymcred_zkp::{commit_attributes, BlindCommitment, OwnershipProof, TrapdoorIdentity};
use rand_core::{CryptoRng, RngCore};

use crate::credential::Credential;
use crate::error::{IssueError, SchemaError};
use crate::schema::{AttributeSet, CredentialSchema};

/// What the holder sends to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindIssuanceRequest {
    pub nym: Pseudonym,
    pub ownership: OwnershipProof,
    pub commitment: BlindCommitment,
}

/// What the holder keeps until the issuer answers.
#[derive(Debug)]
pub struct PendingBlindIssuance {
    nym: Pseudonym,
    hidden: AttributeSet,
    blinding: SecretScalar,
}

impl PendingBlindIssuance {
    pub fn hidden_attributes(&self) -> &AttributeSet {
        &self.hidden
    }
}

impl BlindIssuanceRequest {
    pub fn prepare<R: RngCore + CryptoRng>(
        issuer: &IssuerPublicKey,
        schema: &CredentialSchema,
        identity: &TrapdoorIdentity,
        hidden: &AttributeSet,
        nonce: &Nonce,
        rng: &mut R,
    ) -> Result<(Self, PendingBlindIssuance), IssueError> {
        let mut committed: Vec<(usize, Scalar)> = Vec::with_capacity(hidden.len());
        for (name, value) in hidden {
            let slot = schema
                .slot_of(name)
                .map_err(|_| SchemaError::UnmappedAttribute(name.clone()))?;
            let decl = schema
                .attribute_at(slot)
                .ok_or_else(|| SchemaError::UnmappedAttribute(name.clone()))?;
            committed.push((slot, decl.encode(value)?));
        }
        committed.sort_by_key(|(slot, _)| *slot);

        let nym = *identity.pseudonym();
        let (commitment, blinding) = commit_attributes(issuer, &committed, &nym, nonce, rng)
            .map_err(IssueError::InvalidCommitmentProof)?;
        let request = Self {
            nym,
            ownership: identity.prove_ownership(nonce, rng),
            commitment,
        };
        let pending = PendingBlindIssuance {
            nym,
            hidden: hidden.clone(),
            blinding,
        };
        Ok((request, pending))
    }
}

/// Unblind the issuer's answer and verify it over `hidden ∪ known`.
///
/// Returns the credential and the full attribute set it signs.
pub fn complete_blind_issuance(
    pending: PendingBlindIssuance,
    signature: &BlindSignature,
    issuer: &IssuerPublicKey,
    schema: &CredentialSchema,
    known: &AttributeSet,
) -> Result<(Credential, AttributeSet), IssueError> {
    let mut attributes = known.clone();
    for (name, value) in &pending.hidden {
        if attributes.insert(name.clone(), value.clone()).is_some() {
            return Err(SchemaError::InvalidAttributeEncoding {
                name: name.clone(),
                reason: "supplied both blind and in the clear".into(),
            }
            .into());
        }
    }
    let credential = Credential::from_signature(signature.unblind(&pending.blinding));
    credential
        .verify(issuer, schema, &pending.nym, &attributes)
        .map_err(IssueError::SelfCheck)?;
    Ok((credential, attributes))
}
