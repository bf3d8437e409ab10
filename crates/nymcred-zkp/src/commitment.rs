//! # Blind Attribute Commitments
//!
//! For blind issuance the holder commits to attribute values the issuer
//! must not learn:
//!
//! `C = H_0^{s'} · Π_{i ∈ hidden} H_i^{m_i}`
//!
//! and proves knowledge of the opening `(s', m_i)` with a multi-base
//! Schnorr proof bound to the pseudonym, the issuer's nonce, and the list
//! of committed slots. The issuer signs over `C` and the holder adds `s'`
//! back into the signature's blinding exponent.

use group::Curve;
use nymcred_core::{ByteReader, ByteWriter, Nonce};
use nymcred_crypto::group::{dst, put_g1, put_scalar, read_g1, read_scalar};
use nymcred_crypto::{
    G1Affine, G1Projective, IssuerPublicKey, Pseudonym, Scalar, SecretScalar, NYM_SLOT,
};
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

use crate::error::ZkpError;
use crate::transcript::Transcript;

/// Commitment to hidden attribute values plus its proof of opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlindCommitment {
    pub commitment: G1Affine,
    /// Committed slots, strictly ascending.
    pub slots: Vec<usize>,
    challenge: Scalar,
    blinding_response: Scalar,
    message_responses: Vec<Scalar>,
}

fn check_slots(pk: &IssuerPublicKey, slots: &[usize]) -> Result<(), ZkpError> {
    if slots.is_empty() {
        return Err(ZkpError::Malformed("blind commitment covers no slots".into()));
    }
    if !slots.windows(2).all(|w| w[0] < w[1]) {
        return Err(ZkpError::Malformed(
            "committed slots must be strictly ascending".into(),
        ));
    }
    for &slot in slots {
        if slot == NYM_SLOT {
            return Err(ZkpError::Malformed(
                "the pseudonym slot cannot be committed blindly".into(),
            ));
        }
        pk.message_base(slot)?;
    }
    Ok(())
}

fn commitment_challenge(
    nym: &Pseudonym,
    nonce: &Nonce,
    commitment: &G1Affine,
    slots: &[usize],
    t: &G1Affine,
) -> Scalar {
    let mut tr = Transcript::new(dst::BLIND_COMMITMENT);
    tr.append_g1(b"nym", nym.as_point());
    tr.append_message(b"nonce", nonce.as_bytes());
    tr.append_g1(b"commitment", commitment);
    tr.append_u64(b"slot_count", slots.len() as u64);
    for &slot in slots {
        tr.append_u64(b"slot", slot as u64);
    }
    tr.append_g1(b"t", t);
    tr.challenge()
}

/// Commit to `hidden` (`(slot, m)` pairs, ascending by slot).
///
/// Returns the commitment and the blinding `s'` the holder must keep to
/// unblind the issuer's signature.
pub fn commit_attributes<R: RngCore + CryptoRng>(
    pk: &IssuerPublicKey,
    hidden: &[(usize, Scalar)],
    nym: &Pseudonym,
    nonce: &Nonce,
    rng: &mut R,
) -> Result<(BlindCommitment, SecretScalar), ZkpError> {
    let slots: Vec<usize> = hidden.iter().map(|(slot, _)| *slot).collect();
    check_slots(pk, &slots)?;
    let h0 = G1Projective::from(pk.blinding_base());

    let blinding = SecretScalar::random(rng);
    let t_blinding = SecretScalar::random(rng);
    let mut commitment = h0 * blinding.expose();
    let mut t = h0 * t_blinding.expose();
    let mut t_messages = Vec::with_capacity(hidden.len());
    for (slot, m) in hidden {
        let base = G1Projective::from(pk.message_base(*slot)?);
        let t_m = SecretScalar::random(rng);
        commitment += base * m;
        t += base * t_m.expose();
        t_messages.push(t_m);
    }
    let commitment = commitment.to_affine();
    let challenge = commitment_challenge(nym, nonce, &commitment, &slots, &t.to_affine());

    let message_responses = t_messages
        .iter()
        .zip(hidden)
        .map(|(t_m, (_, m))| t_m.expose() + challenge * m)
        .collect();
    let proof = BlindCommitment {
        commitment,
        slots,
        challenge,
        blinding_response: t_blinding.expose() + challenge * blinding.expose(),
        message_responses,
    };
    Ok((proof, blinding))
}

/// Verify the proof of opening carried by `bc`.
pub fn verify_commitment(
    pk: &IssuerPublicKey,
    bc: &BlindCommitment,
    nym: &Pseudonym,
    nonce: &Nonce,
) -> Result<(), ZkpError> {
    check_slots(pk, &bc.slots)?;
    if bc.message_responses.len() != bc.slots.len() {
        return Err(ZkpError::Malformed(format!(
            "{} responses for {} committed slots",
            bc.message_responses.len(),
            bc.slots.len()
        )));
    }
    let mut t = G1Projective::from(pk.blinding_base()) * bc.blinding_response
        - G1Projective::from(bc.commitment) * bc.challenge;
    for (slot, z) in bc.slots.iter().zip(&bc.message_responses) {
        t += G1Projective::from(pk.message_base(*slot)?) * z;
    }
    let expected = commitment_challenge(nym, nonce, &bc.commitment, &bc.slots, &t.to_affine());
    if bool::from(expected.ct_eq(&bc.challenge)) {
        Ok(())
    } else {
        Err(ZkpError::InvalidProof(
            "blind commitment proof does not verify".into(),
        ))
    }
}

impl BlindCommitment {
    /// `C || u16 count || (u16 slot)* || c || z_s' || z_i*`
    pub fn to_bytes(&self) -> Result<Vec<u8>, ZkpError> {
        let mut w = ByteWriter::new();
        put_g1(&mut w, &self.commitment);
        w.put_count("slots", self.slots.len())?;
        for &slot in &self.slots {
            w.put_count("slot", slot)?;
        }
        put_scalar(&mut w, &self.challenge);
        put_scalar(&mut w, &self.blinding_response);
        for z in &self.message_responses {
            put_scalar(&mut w, z);
        }
        Ok(w.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ZkpError> {
        let mut r = ByteReader::new(bytes);
        let commitment = read_g1(&mut r, "commitment")?;
        let count = r.read_u16("slots")? as usize;
        let slots = (0..count)
            .map(|_| r.read_u16("slot").map(usize::from))
            .collect::<Result<Vec<_>, _>>()?;
        let challenge = read_scalar(&mut r, "challenge")?;
        let blinding_response = read_scalar(&mut r, "blinding_response")?;
        let message_responses = (0..count)
            .map(|_| read_scalar(&mut r, "message_response"))
            .collect::<Result<Vec<_>, _>>()?;
        r.finish()?;
        Ok(Self {
            commitment,
            slots,
            challenge,
            blinding_response,
            message_responses,
        })
    }
}
