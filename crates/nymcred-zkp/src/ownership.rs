//! # Proof of Pseudonym Ownership
//!
//! Schnorr proof of knowledge of `sk` with `nym = g1^sk`:
//!
//! - prover: `T = g1^t`, `c = H(nym, T, nonce)`, `z = t + c·sk`
//! - verifier: `T' = g1^z · nym^{-c}`, accept iff `H(nym, T', nonce) == c`
//!
//! Encoded compactly as `c || z` ([`OWNERSHIP_PROOF_SIZE`] bytes). The
//! nonce binding means a proof captured at one registration or issuance
//! cannot be replayed against another context.

use group::Curve;
use nymcred_core::{from_hex, to_hex, ByteReader, Nonce};
use nymcred_crypto::group::{dst, read_scalar, scalar_to_bytes, SCALAR_SIZE};
use nymcred_crypto::{G1Affine, G1Projective, Pseudonym, Scalar, SecretScalar};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;

use crate::error::ZkpError;
use crate::transcript::Transcript;
use crate::trapdoor::TrapdoorSecret;

pub const OWNERSHIP_PROOF_SIZE: usize = 2 * SCALAR_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipProof {
    challenge: Scalar,
    response: Scalar,
}

fn ownership_challenge(nym: &Pseudonym, commitment: &G1Affine, nonce: &Nonce) -> Scalar {
    let mut t = Transcript::new(dst::OWNERSHIP);
    t.append_g1(b"nym", nym.as_point());
    t.append_g1(b"commitment", commitment);
    t.append_message(b"nonce", nonce.as_bytes());
    t.challenge()
}

pub fn prove_ownership<R: RngCore + CryptoRng>(
    sk: &TrapdoorSecret,
    nonce: &Nonce,
    rng: &mut R,
) -> OwnershipProof {
    let nym = sk.pseudonym();
    let t = SecretScalar::random_nonzero(rng);
    let commitment = (G1Projective::generator() * t.expose()).to_affine();
    let challenge = ownership_challenge(&nym, &commitment, nonce);
    OwnershipProof {
        challenge,
        response: t.expose() + challenge * sk.scalar(),
    }
}

pub fn verify_ownership(
    nym: &Pseudonym,
    proof: &OwnershipProof,
    nonce: &Nonce,
) -> Result<(), ZkpError> {
    let commitment = (G1Projective::generator() * proof.response
        - G1Projective::from(nym.as_point()) * proof.challenge)
        .to_affine();
    let expected = ownership_challenge(nym, &commitment, nonce);
    if bool::from(expected.ct_eq(&proof.challenge)) {
        Ok(())
    } else {
        Err(ZkpError::InvalidProof(
            "ownership proof does not match pseudonym and nonce".into(),
        ))
    }
}

impl OwnershipProof {
    pub fn to_bytes(&self) -> [u8; OWNERSHIP_PROOF_SIZE] {
        let mut out = [0u8; OWNERSHIP_PROOF_SIZE];
        out[..SCALAR_SIZE].copy_from_slice(&scalar_to_bytes(&self.challenge));
        out[SCALAR_SIZE..].copy_from_slice(&scalar_to_bytes(&self.response));
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ZkpError> {
        let mut r = ByteReader::new(bytes);
        let challenge = read_scalar(&mut r, "ownership.challenge")?;
        let response = read_scalar(&mut r, "ownership.response")?;
        r.finish()?;
        Ok(Self {
            challenge,
            response,
        })
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, ZkpError> {
        Self::from_bytes(&from_hex(s)?)
    }
}

impl Serialize for OwnershipProof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for OwnershipProof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
