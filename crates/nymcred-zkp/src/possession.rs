//! # BBS+ Proof of Possession with Selective Disclosure
//!
//! Proves knowledge of a BBS+ signature `(A, e, s)` on a message vector
//! whose nym slot is the holder's pseudonym, revealing a chosen subset of
//! the remaining slots.
//!
//! ## Construction
//!
//! With `B = g1 · H_0^s · Π H_i^{m_i}` the prover samples `r1 ≠ 0`, `r2`
//! and sets
//!
//! - `A' = A^{r1}`, `Ā = A'^{-e} · B^{r1}` (so `Ā = A'^x`),
//! - `d = B^{r1} · H_0^{-r2}`, `r3 = r1^{-1}`, `s' = s − r2·r3`.
//!
//! It then proves, under one challenge `c`, knowledge of
//! `(e, r2, r3, s', sk, m_hidden)` with
//!
//! 1. `Ā / d = A'^{-e} · H_0^{r2}`
//! 2. `g1 · Π_{disclosed} H_j^{m_j} = d^{r3} · H_0^{-s'} · Π_{hidden} H_i^{-m_i}`
//! 3. `nym = g1^{sk}`
//!
//! and the verifier additionally checks `A' ≠ 1` and
//! `e(A', W) == e(Ā, g2)`. The nym slot is always disclosed: its message
//! is recomputed from the pseudonym by the verifier, and relation 3 shows
//! the presenter controls that pseudonym.
//!
//! ## Challenge
//!
//! `c = H(nonce, nym, A', Ā, d, T1, T2, T_nym, disclosed (slot, m_j),
//! hidden slot list, context)`. The issuer public key is not hashed: a
//! proof checked against the wrong key passes the challenge check and
//! fails the pairing equation.
//!
//! ## Wire layout
//!
//! `A' || Ā || d || T1 || T2 || T_nym || c || z_e || z_r2 || z_r3 ||
//! z_s' || z_sk || u16 count || (u16 slot || z_i)*`, hidden responses
//! ascending by slot.

use std::collections::{BTreeMap, BTreeSet};

use ff::Field;
use group::Curve;
use nymcred_core::{ByteReader, ByteWriter, EncodingError, Nonce};
use nymcred_crypto::bbs::message_commitment;
use nymcred_crypto::group::{
    dst, g1, g2, pairing_product_is_identity, put_g1, put_scalar, read_g1, read_scalar,
};
use nymcred_crypto::{
    BbsSignature, G1Affine, G1Projective, IssuerPublicKey, Pseudonym, Scalar, SecretScalar,
    NYM_SLOT,
};
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;

use crate::error::ZkpError;
use crate::transcript::Transcript;
use crate::trapdoor::TrapdoorSecret;

/// Public inputs shared by prover and verifier.
#[derive(Debug, Clone, Copy)]
pub struct PossessionStatement<'a> {
    pub issuer: &'a IssuerPublicKey,
    pub nym: &'a Pseudonym,
    /// Disclosed non-nym slots and their message scalars.
    pub disclosed: &'a BTreeMap<usize, Scalar>,
    pub nonce: &'a Nonce,
    /// Extra bytes bound into the challenge (schema id, attribute names
    /// and values as presented).
    pub context: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PossessionProof {
    pub a_prime: G1Affine,
    pub a_bar: G1Affine,
    pub d: G1Affine,
    pub t1: G1Affine,
    pub t2: G1Affine,
    pub t_nym: G1Affine,
    pub challenge: Scalar,
    pub z_e: Scalar,
    pub z_r2: Scalar,
    pub z_r3: Scalar,
    pub z_s: Scalar,
    pub z_sk: Scalar,
    /// Responses for hidden slots, keyed by slot.
    pub hidden_responses: BTreeMap<usize, Scalar>,
}

impl<'a> PossessionStatement<'a> {
    /// Hidden slots implied by the disclosed set.
    fn hidden_slots(&self) -> Result<BTreeSet<usize>, ZkpError> {
        let n = self.issuer.slot_count();
        for &slot in self.disclosed.keys() {
            if slot == NYM_SLOT {
                return Err(ZkpError::Malformed(
                    "the pseudonym slot is disclosed implicitly".into(),
                ));
            }
            if slot == 0 || slot > n {
                return Err(ZkpError::Malformed(format!(
                    "disclosed slot {slot} outside 1..={n}"
                )));
            }
        }
        Ok((NYM_SLOT + 1..=n)
            .filter(|slot| !self.disclosed.contains_key(slot))
            .collect())
    }

    /// `g1 · H_nym^{m_nym} · Π_{disclosed} H_j^{m_j}`.
    fn disclosed_base(&self) -> Result<G1Projective, ZkpError> {
        let mut acc = G1Projective::from(g1())
            + G1Projective::from(self.issuer.message_base(NYM_SLOT)?) * self.nym.message_scalar();
        for (&slot, m) in self.disclosed {
            acc += G1Projective::from(self.issuer.message_base(slot)?) * m;
        }
        Ok(acc)
    }

    fn challenge(&self, commitments: &Commitments, hidden: &BTreeSet<usize>) -> Scalar {
        let mut t = Transcript::new(dst::PRESENTATION);
        t.append_message(b"nonce", self.nonce.as_bytes());
        t.append_g1(b"nym", self.nym.as_point());
        t.append_g1(b"a_prime", &commitments.a_prime);
        t.append_g1(b"a_bar", &commitments.a_bar);
        t.append_g1(b"d", &commitments.d);
        t.append_g1(b"t1", &commitments.t1);
        t.append_g1(b"t2", &commitments.t2);
        t.append_g1(b"t_nym", &commitments.t_nym);
        t.append_u64(b"disclosed_count", self.disclosed.len() as u64);
        for (&slot, m) in self.disclosed {
            t.append_u64(b"disclosed_slot", slot as u64);
            t.append_scalar(b"disclosed_message", m);
        }
        t.append_u64(b"hidden_count", hidden.len() as u64);
        for &slot in hidden {
            t.append_u64(b"hidden_slot", slot as u64);
        }
        t.append_message(b"context", self.context);
        t.challenge()
    }
}

struct Commitments {
    a_prime: G1Affine,
    a_bar: G1Affine,
    d: G1Affine,
    t1: G1Affine,
    t2: G1Affine,
    t_nym: G1Affine,
}

impl PossessionProof {
    fn commitments(&self) -> Commitments {
        Commitments {
            a_prime: self.a_prime,
            a_bar: self.a_bar,
            d: self.d,
            t1: self.t1,
            t2: self.t2,
            t_nym: self.t_nym,
        }
    }
}

/// Build a proof of possession.
///
/// `messages` is the full signed vector (slot 1 first). The witness is
/// checked against the statement before any randomness is drawn.
pub fn prove_possession<R: RngCore + CryptoRng>(
    statement: &PossessionStatement<'_>,
    signature: &BbsSignature,
    messages: &[Scalar],
    trapdoor: &TrapdoorSecret,
    rng: &mut R,
) -> Result<PossessionProof, ZkpError> {
    let pk = statement.issuer;
    let hidden = statement.hidden_slots()?;
    if messages.len() != pk.slot_count() {
        return Err(ZkpError::InvalidWitness(format!(
            "{} messages for {} slots",
            messages.len(),
            pk.slot_count()
        )));
    }
    if trapdoor.pseudonym() != *statement.nym {
        return Err(ZkpError::InvalidWitness(
            "trapdoor does not derive the presented pseudonym".into(),
        ));
    }
    if messages[NYM_SLOT - 1] != statement.nym.message_scalar() {
        return Err(ZkpError::InvalidWitness(
            "credential is not bound to the presented pseudonym".into(),
        ));
    }
    for (&slot, m) in statement.disclosed {
        if messages[slot - 1] != *m {
            return Err(ZkpError::InvalidWitness(format!(
                "disclosed value for slot {slot} differs from the signed message"
            )));
        }
    }

    let h0 = G1Projective::from(pk.blinding_base());
    let b = message_commitment(pk, &signature.s, messages)?;

    let r1 = SecretScalar::random_nonzero(rng);
    let r2 = SecretScalar::random(rng);
    let r3: Option<Scalar> = r1.expose().invert().into();
    let r3 = SecretScalar::new(
        r3.ok_or_else(|| ZkpError::InvalidWitness("rerandomizer not invertible".into()))?,
    );
    let s_prime = SecretScalar::new(signature.s - r2.expose() * r3.expose());

    let a_prime = G1Projective::from(signature.a) * r1.expose();
    let b_r1 = b * r1.expose();
    let a_bar = a_prime * (-signature.e) + b_r1;
    let d = b_r1 - h0 * r2.expose();

    let t_e = SecretScalar::random(rng);
    let t_r2 = SecretScalar::random(rng);
    let t_r3 = SecretScalar::random(rng);
    let t_s = SecretScalar::random(rng);
    let t_sk = SecretScalar::random(rng);
    let t_hidden: Vec<(usize, SecretScalar)> = hidden
        .iter()
        .map(|&slot| (slot, SecretScalar::random(rng)))
        .collect();

    let t1 = a_prime * (-*t_e.expose()) + h0 * t_r2.expose();
    let mut t2 = d * t_r3.expose() - h0 * t_s.expose();
    for (slot, t_m) in &t_hidden {
        t2 -= G1Projective::from(pk.message_base(*slot)?) * t_m.expose();
    }
    let t_nym = G1Projective::generator() * t_sk.expose();

    let commitments = Commitments {
        a_prime: a_prime.to_affine(),
        a_bar: a_bar.to_affine(),
        d: d.to_affine(),
        t1: t1.to_affine(),
        t2: t2.to_affine(),
        t_nym: t_nym.to_affine(),
    };
    let c = statement.challenge(&commitments, &hidden);

    let hidden_responses = t_hidden
        .iter()
        .map(|(slot, t_m)| (*slot, t_m.expose() + c * messages[slot - 1]))
        .collect();

    Ok(PossessionProof {
        a_prime: commitments.a_prime,
        a_bar: commitments.a_bar,
        d: commitments.d,
        t1: commitments.t1,
        t2: commitments.t2,
        t_nym: commitments.t_nym,
        challenge: c,
        z_e: t_e.expose() + c * signature.e,
        z_r2: t_r2.expose() + c * r2.expose(),
        z_r3: t_r3.expose() + c * r3.expose(),
        z_s: t_s.expose() + c * s_prime.expose(),
        z_sk: t_sk.expose() + c * trapdoor.scalar(),
        hidden_responses,
    })
}

/// Verify a proof of possession.
///
/// # Errors
///
/// - `Malformed` if the hidden responses do not cover exactly the slots
///   the statement leaves undisclosed;
/// - `InvalidProof` if the recomputed challenge differs;
/// - `VerificationFailure` if the pairing check or any sigma equation fails.
pub fn verify_possession(
    statement: &PossessionStatement<'_>,
    proof: &PossessionProof,
) -> Result<(), ZkpError> {
    let hidden = statement.hidden_slots()?;
    if !proof.hidden_responses.keys().copied().eq(hidden.iter().copied()) {
        return Err(ZkpError::Malformed(
            "hidden responses do not match the undisclosed slots".into(),
        ));
    }

    let expected = statement.challenge(&proof.commitments(), &hidden);
    if !bool::from(expected.ct_eq(&proof.challenge)) {
        return Err(ZkpError::InvalidProof("challenge mismatch".into()));
    }

    if bool::from(proof.a_prime.is_identity()) {
        return Err(ZkpError::VerificationFailure("A' is the identity".into()));
    }
    if !pairing_product_is_identity(&[
        (proof.a_prime, *statement.issuer.w()),
        (-proof.a_bar, g2()),
    ]) {
        return Err(ZkpError::VerificationFailure(
            "pairing check e(A', W) == e(Ā, g2) failed".into(),
        ));
    }
    check_equations(statement, proof)
}

/// The three sigma-protocol equations, given the carried commitments and
/// challenge. Exposed so transcripts can be checked independently of the
/// Fiat–Shamir hash.
pub fn check_equations(
    statement: &PossessionStatement<'_>,
    proof: &PossessionProof,
) -> Result<(), ZkpError> {
    let pk = statement.issuer;
    let c = proof.challenge;
    let h0 = G1Projective::from(pk.blinding_base());
    let a_prime = G1Projective::from(proof.a_prime);
    let a_bar = G1Projective::from(proof.a_bar);
    let d = G1Projective::from(proof.d);

    let lhs1 = a_prime * (-proof.z_e) + h0 * proof.z_r2;
    let rhs1 = G1Projective::from(proof.t1) + (a_bar - d) * c;
    if lhs1 != rhs1 {
        return Err(ZkpError::VerificationFailure(
            "signature-exponent relation failed".into(),
        ));
    }

    let mut lhs2 = d * proof.z_r3 - h0 * proof.z_s;
    for (&slot, z) in &proof.hidden_responses {
        lhs2 -= G1Projective::from(pk.message_base(slot)?) * z;
    }
    let rhs2 = G1Projective::from(proof.t2) + statement.disclosed_base()? * c;
    if lhs2 != rhs2 {
        return Err(ZkpError::VerificationFailure(
            "message relation failed".into(),
        ));
    }

    let lhs3 = G1Projective::generator() * proof.z_sk;
    let rhs3 = G1Projective::from(proof.t_nym) + G1Projective::from(statement.nym.as_point()) * c;
    if lhs3 != rhs3 {
        return Err(ZkpError::VerificationFailure(
            "pseudonym ownership relation failed".into(),
        ));
    }
    Ok(())
}

/// Honest-verifier simulator: given the rerandomized signature
/// `(A', Ā, d)` and a challenge, produce commitments and responses that
/// satisfy [`check_equations`] without any witness.
pub fn simulate<R: RngCore + CryptoRng>(
    statement: &PossessionStatement<'_>,
    a_prime: G1Affine,
    a_bar: G1Affine,
    d: G1Affine,
    challenge: Scalar,
    rng: &mut R,
) -> Result<PossessionProof, ZkpError> {
    let pk = statement.issuer;
    let hidden = statement.hidden_slots()?;
    let h0 = G1Projective::from(pk.blinding_base());
    let c = challenge;

    let z_e = Scalar::random(&mut *rng);
    let z_r2 = Scalar::random(&mut *rng);
    let z_r3 = Scalar::random(&mut *rng);
    let z_s = Scalar::random(&mut *rng);
    let z_sk = Scalar::random(&mut *rng);
    let hidden_responses: BTreeMap<usize, Scalar> = hidden
        .iter()
        .map(|&slot| (slot, Scalar::random(&mut *rng)))
        .collect();

    let ap = G1Projective::from(a_prime);
    let dp = G1Projective::from(d);
    let t1 = ap * (-z_e) + h0 * z_r2 - (G1Projective::from(a_bar) - dp) * c;
    let mut t2 = dp * z_r3 - h0 * z_s - statement.disclosed_base()? * c;
    for (&slot, z) in &hidden_responses {
        t2 -= G1Projective::from(pk.message_base(slot)?) * z;
    }
    let t_nym =
        G1Projective::generator() * z_sk - G1Projective::from(statement.nym.as_point()) * c;

    Ok(PossessionProof {
        a_prime,
        a_bar,
        d,
        t1: t1.to_affine(),
        t2: t2.to_affine(),
        t_nym: t_nym.to_affine(),
        challenge: c,
        z_e,
        z_r2,
        z_r3,
        z_s,
        z_sk,
        hidden_responses,
    })
}

impl PossessionProof {
    pub fn write_to(&self, w: &mut ByteWriter) -> Result<(), EncodingError> {
        for p in [&self.a_prime, &self.a_bar, &self.d, &self.t1, &self.t2, &self.t_nym] {
            put_g1(w, p);
        }
        for s in [&self.challenge, &self.z_e, &self.z_r2, &self.z_r3, &self.z_s, &self.z_sk] {
            put_scalar(w, s);
        }
        w.put_count("hidden_responses", self.hidden_responses.len())?;
        for (&slot, z) in &self.hidden_responses {
            w.put_count("hidden_slot", slot)?;
            put_scalar(w, z);
        }
        Ok(())
    }

    /// Read a proof from `r`, requiring hidden slots strictly ascending.
    pub fn read_from(r: &mut ByteReader<'_>) -> Result<Self, ZkpError> {
        let a_prime = read_g1(r, "a_prime")?;
        let a_bar = read_g1(r, "a_bar")?;
        let d = read_g1(r, "d")?;
        let t1 = read_g1(r, "t1")?;
        let t2 = read_g1(r, "t2")?;
        let t_nym = read_g1(r, "t_nym")?;
        let challenge = read_scalar(r, "challenge")?;
        let z_e = read_scalar(r, "z_e")?;
        let z_r2 = read_scalar(r, "z_r2")?;
        let z_r3 = read_scalar(r, "z_r3")?;
        let z_s = read_scalar(r, "z_s")?;
        let z_sk = read_scalar(r, "z_sk")?;
        let count = r.read_u16("hidden_responses")? as usize;
        let mut hidden_responses = BTreeMap::new();
        let mut last: Option<usize> = None;
        for _ in 0..count {
            let slot = r.read_u16("hidden_slot")? as usize;
            if last.is_some_and(|prev| slot <= prev) {
                return Err(ZkpError::Malformed(
                    "hidden response slots must be strictly ascending".into(),
                ));
            }
            last = Some(slot);
            hidden_responses.insert(slot, read_scalar(r, "hidden_response")?);
        }
        Ok(Self {
            a_prime,
            a_bar,
            d,
            t1,
            t2,
            t_nym,
            challenge,
            z_e,
            z_r2,
            z_r3,
            z_s,
            z_sk,
            hidden_responses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trapdoor::TrapdoorIdentity;
    use nymcred_crypto::{keygen, sample_scalar, sign, IssuerKeyPair};
    use rand_core::OsRng;

    struct Fixture {
        kp: IssuerKeyPair,
        id: TrapdoorIdentity,
        messages: Vec<Scalar>,
        sig: BbsSignature,
        nonce: Nonce,
    }

    fn fixture(slots: usize) -> Fixture {
        let kp = keygen(slots, &mut OsRng).unwrap();
        let id = TrapdoorIdentity::generate(&mut OsRng);
        let mut messages = vec![id.pseudonym().message_scalar()];
        messages.extend((1..slots).map(|_| sample_scalar(&mut OsRng)));
        let sig = sign(&kp, &messages, &mut OsRng).unwrap();
        Fixture {
            kp,
            id,
            messages,
            sig,
            nonce: "abc123".parse().unwrap(),
        }
    }

    fn disclose(f: &Fixture, slots: &[usize]) -> BTreeMap<usize, Scalar> {
        slots.iter().map(|&s| (s, f.messages[s - 1])).collect()
    }

    fn statement<'a>(
        f: &'a Fixture,
        pk: &'a IssuerPublicKey,
        disclosed: &'a BTreeMap<usize, Scalar>,
    ) -> PossessionStatement<'a> {
        PossessionStatement {
            issuer: pk,
            nym: f.id.pseudonym(),
            disclosed,
            nonce: &f.nonce,
            context: b"ctx",
        }
    }

    fn prove(f: &Fixture, disclosed: &BTreeMap<usize, Scalar>) -> PossessionProof {
        let st = statement(f, f.kp.public(), disclosed);
        prove_possession(&st, &f.sig, &f.messages, f.id.secret(), &mut OsRng).unwrap()
    }

    #[test]
    fn completeness_for_every_disclosure_pattern() {
        let f = fixture(4);
        for mask in 0u8..8 {
            let slots: Vec<usize> = (2..=4).filter(|s| mask & (1 << (s - 2)) != 0).collect();
            let disclosed = disclose(&f, &slots);
            let proof = prove(&f, &disclosed);
            verify_possession(&statement(&f, f.kp.public(), &disclosed), &proof).unwrap();
            assert_eq!(proof.hidden_responses.len(), 3 - slots.len());
        }
    }

    #[test]
    fn nym_only_credential() {
        let f = fixture(1);
        let disclosed = BTreeMap::new();
        let proof = prove(&f, &disclosed);
        verify_possession(&statement(&f, f.kp.public(), &disclosed), &proof).unwrap();
    }

    #[test]
    fn wrong_issuer_key_is_a_verification_failure() {
        let f = fixture(4);
        let disclosed = disclose(&f, &[4]);
        let proof = prove(&f, &disclosed);
        let other = keygen(4, &mut OsRng).unwrap();
        assert!(matches!(
            verify_possession(&statement(&f, other.public(), &disclosed), &proof),
            Err(ZkpError::VerificationFailure(_))
        ));
    }

    #[test]
    fn altered_disclosure_breaks_challenge() {
        let f = fixture(4);
        let disclosed = disclose(&f, &[4]);
        let proof = prove(&f, &disclosed);
        let mut lied = disclosed.clone();
        lied.insert(4, sample_scalar(&mut OsRng));
        assert!(matches!(
            verify_possession(&statement(&f, f.kp.public(), &lied), &proof),
            Err(ZkpError::InvalidProof(_))
        ));
    }

    #[test]
    fn different_nonce_or_context_breaks_challenge() {
        let f = fixture(3);
        let disclosed = disclose(&f, &[2]);
        let proof = prove(&f, &disclosed);
        let other_nonce: Nonce = "xyz".parse().unwrap();
        let mut st = statement(&f, f.kp.public(), &disclosed);
        st.nonce = &other_nonce;
        assert!(matches!(verify_possession(&st, &proof), Err(ZkpError::InvalidProof(_))));
        let mut st = statement(&f, f.kp.public(), &disclosed);
        st.context = b"other";
        assert!(matches!(verify_possession(&st, &proof), Err(ZkpError::InvalidProof(_))));
    }

    #[test]
    fn response_tampering_is_a_verification_failure_after_rehash() {
        // A forger who controls the responses still has to satisfy the
        // equations; tampering with z_e leaves the challenge intact.
        let f = fixture(3);
        let disclosed = disclose(&f, &[3]);
        let mut proof = prove(&f, &disclosed);
        proof.z_e += Scalar::ONE;
        assert!(matches!(
            verify_possession(&statement(&f, f.kp.public(), &disclosed), &proof),
            Err(ZkpError::VerificationFailure(_))
        ));
    }

    #[test]
    fn mismatched_hidden_set_is_malformed() {
        let f = fixture(4);
        let disclosed = disclose(&f, &[4]);
        let mut proof = prove(&f, &disclosed);
        proof.hidden_responses.remove(&2);
        assert!(matches!(
            verify_possession(&statement(&f, f.kp.public(), &disclosed), &proof),
            Err(ZkpError::Malformed(_))
        ));
    }

    #[test]
    fn prover_refuses_foreign_trapdoor() {
        let f = fixture(2);
        let disclosed = BTreeMap::new();
        let st = statement(&f, f.kp.public(), &disclosed);
        let stranger = TrapdoorIdentity::generate(&mut OsRng);
        assert!(matches!(
            prove_possession(&st, &f.sig, &f.messages, stranger.secret(), &mut OsRng),
            Err(ZkpError::InvalidWitness(_))
        ));
    }

    #[test]
    fn simulated_transcript_satisfies_equations() {
        let f = fixture(4);
        let disclosed = disclose(&f, &[3]);
        let real = prove(&f, &disclosed);
        let st = statement(&f, f.kp.public(), &disclosed);
        let c = sample_scalar(&mut OsRng);
        let sim = simulate(&st, real.a_prime, real.a_bar, real.d, c, &mut OsRng).unwrap();
        check_equations(&st, &sim).unwrap();
        assert_eq!(sim.hidden_responses.len(), real.hidden_responses.len());
    }

    #[test]
    fn encoding_roundtrip() {
        let f = fixture(4);
        let disclosed = disclose(&f, &[2]);
        let proof = prove(&f, &disclosed);
        let mut w = ByteWriter::new();
        proof.write_to(&mut w).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 6 * 48 + 6 * 32 + 2 + 2 * (2 + 32));
        let mut r = ByteReader::new(&bytes);
        let decoded = PossessionProof::read_from(&mut r).unwrap();
        r.finish().unwrap();
        assert_eq!(decoded, proof);
    }
}
