//! # Trapdoor Identity
//!
//! The holder's long-term secret `sk` and the pseudonym `nym = g1^sk`
//! derived from it. The secret stays inside the holder process: it has no
//! serialization, no `Clone`, and is zeroized on drop.

use std::fmt;

use nymcred_core::Nonce;
use nymcred_crypto::{Pseudonym, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};

use crate::ownership::{prove_ownership, OwnershipProof};

pub struct TrapdoorSecret(SecretScalar);

impl TrapdoorSecret {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self(SecretScalar::random_nonzero(rng))
    }

    pub fn pseudonym(&self) -> Pseudonym {
        Pseudonym::derive(&self.0)
    }

    pub(crate) fn scalar(&self) -> &Scalar {
        self.0.expose()
    }
}

impl fmt::Debug for TrapdoorSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TrapdoorSecret(<redacted>)")
    }
}

/// A holder's trapdoor together with its pseudonym.
#[derive(Debug)]
pub struct TrapdoorIdentity {
    secret: TrapdoorSecret,
    nym: Pseudonym,
}

impl TrapdoorIdentity {
    /// Sample a trapdoor and derive its pseudonym.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(TrapdoorSecret::generate(rng))
    }

    pub fn from_secret(secret: TrapdoorSecret) -> Self {
        let nym = secret.pseudonym();
        Self { secret, nym }
    }

    pub fn secret(&self) -> &TrapdoorSecret {
        &self.secret
    }

    pub fn pseudonym(&self) -> &Pseudonym {
        &self.nym
    }

    pub fn into_parts(self) -> (TrapdoorSecret, Pseudonym) {
        (self.secret, self.nym)
    }

    /// Schnorr proof of knowledge of the trapdoor, bound to `nonce`.
    pub fn prove_ownership<R: RngCore + CryptoRng>(
        &self,
        nonce: &Nonce,
        rng: &mut R,
    ) -> OwnershipProof {
        prove_ownership(&self.secret, nonce, rng)
    }
}
