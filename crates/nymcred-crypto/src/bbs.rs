//! # BBS+ Keyring and Signatures
//!
//! Issuer keys over a fixed number of message slots and the BBS+ signature
//! `(A, e, s)` on a message vector `m_1..m_n`.
//!
//! ## Key structure
//!
//! For `n` slots the secret key is `(x, y_0..y_n)`. The public key carries
//! `W = g2^x`, `Y_i = g2^{y_i}` and the G1 bases `H_i = g1^{y_i}`. `H_0`
//! blinds `s`; `H_i` (i ≥ 1) carries message `m_i`. Publishing the G1
//! bases lets holders prove and verifiers check without knowing `y_i`;
//! decoding checks `e(H_i, g2) == e(g1, Y_i)` for every slot, so a key
//! whose bases do not match its exponents is rejected.
//!
//! ## Signature
//!
//! With `B = g1 · H_0^s · Π H_i^{m_i}`, the signature is
//! `A = B^{1/(x+e)}` and verifies iff
//! `e(A, W · g2^e) == e(g1, g2 · Y_0^s · Π Y_i^{m_i})`.
//!
//! ## Wire formats
//!
//! - Public key: `u16 n || W || Y_0..Y_n || H_0..H_n`.
//! - Secret key: `u16 n || x || y_0..y_n` (written only by key generation
//!   tooling; held in `Zeroizing` buffers).
//! - Signature: `A (48) || e (32) || s (32)` = [`SIGNATURE_SIZE`] bytes.

use std::fmt;

use bls12_381::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use ff::Field;
use group::Curve;
use nymcred_core::{from_hex, to_hex, ByteReader, ByteWriter};
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::group::{
    g1, multi_exp_g1, pairing_product_is_identity, pairs_with_generators, put_g1, put_g2,
    put_scalar, read_g1, read_g2, read_scalar, G1_COMPRESSED_SIZE, SCALAR_SIZE,
};
use crate::secret::SecretScalar;

/// Byte length of an encoded [`BbsSignature`].
pub const SIGNATURE_SIZE: usize = G1_COMPRESSED_SIZE + 2 * SCALAR_SIZE;

/// Upper bound on message slots; slot counts travel as `u16`.
pub const MAX_SLOTS: usize = u16::MAX as usize - 1;

/// Message slot that carries the pseudonym in every credential.
pub const NYM_SLOT: usize = 1;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

pub struct IssuerSecretKey {
    x: SecretScalar,
    /// `y_0..y_n`; `y_0` pairs with the blinding base.
    y: Vec<SecretScalar>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct IssuerPublicKey {
    w: G2Affine,
    y: Vec<G2Affine>,
    h: Vec<G1Affine>,
}

/// Secret and public halves of an issuer key.
pub struct IssuerKeyPair {
    secret: IssuerSecretKey,
    public: IssuerPublicKey,
}

/// Generate an issuer key over `slot_count` message slots (nym slot included).
///
/// # Errors
///
/// `InvalidSchema` if `slot_count` is zero or exceeds [`MAX_SLOTS`].
pub fn keygen<R: RngCore + CryptoRng>(
    slot_count: usize,
    rng: &mut R,
) -> Result<IssuerKeyPair, CryptoError> {
    check_slot_count(slot_count)?;
    let x = SecretScalar::random_nonzero(rng);
    let y = (0..=slot_count)
        .map(|_| SecretScalar::random_nonzero(rng))
        .collect();
    Ok(IssuerKeyPair::from_secret(IssuerSecretKey { x, y }))
}

fn check_slot_count(slot_count: usize) -> Result<(), CryptoError> {
    if slot_count == 0 {
        return Err(CryptoError::InvalidSchema(
            "slot count must be at least 1 (the pseudonym slot)".into(),
        ));
    }
    if slot_count > MAX_SLOTS {
        return Err(CryptoError::InvalidSchema(format!(
            "slot count {slot_count} exceeds the maximum {MAX_SLOTS}"
        )));
    }
    Ok(())
}

impl IssuerSecretKey {
    pub fn slot_count(&self) -> usize {
        self.y.len() - 1
    }

    pub(crate) fn x(&self) -> &Scalar {
        self.x.expose()
    }

    pub fn public_key(&self) -> IssuerPublicKey {
        let g1 = G1Projective::generator();
        let g2 = G2Projective::generator();
        IssuerPublicKey {
            w: (g2 * self.x.expose()).to_affine(),
            y: self.y.iter().map(|y| (g2 * y.expose()).to_affine()).collect(),
            h: self.y.iter().map(|y| (g1 * y.expose()).to_affine()).collect(),
        }
    }

    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        let mut w = ByteWriter::with_capacity(2 + SCALAR_SIZE * (self.y.len() + 1));
        w.put_u16(self.slot_count() as u16);
        put_scalar(&mut w, self.x.expose());
        for y in &self.y {
            put_scalar(&mut w, y.expose());
        }
        Zeroizing::new(w.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut r = ByteReader::new(bytes);
        let n = r.read_u16("slot_count")? as usize;
        check_slot_count(n)?;
        let x = SecretScalar::new(read_scalar(&mut r, "x")?);
        let y = (0..=n)
            .map(|_| read_scalar(&mut r, "y").map(SecretScalar::new))
            .collect::<Result<Vec<_>, _>>()?;
        r.finish()?;
        if bool::from(x.expose().is_zero()) || y.iter().any(|v| bool::from(v.expose().is_zero())) {
            return Err(CryptoError::KeyError("secret key component is zero".into()));
        }
        Ok(Self { x, y })
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(to_hex(&self.to_bytes()))
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(from_hex(s)?);
        Self::from_bytes(&bytes)
    }
}

impl fmt::Debug for IssuerSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IssuerSecretKey(<redacted>, slots={})", self.slot_count())
    }
}

impl IssuerPublicKey {
    /// Number of message slots, nym slot included.
    pub fn slot_count(&self) -> usize {
        self.y.len() - 1
    }

    /// `W = g2^x`.
    pub fn w(&self) -> &G2Affine {
        &self.w
    }

    /// `H_0`, the base blinding `s`.
    pub fn blinding_base(&self) -> &G1Affine {
        &self.h[0]
    }

    /// `Y_0`.
    pub fn blinding_exponent_base(&self) -> &G2Affine {
        &self.y[0]
    }

    /// `H_i` for message slot `slot` (1-based; slot 1 is the nym).
    pub fn message_base(&self, slot: usize) -> Result<&G1Affine, CryptoError> {
        if slot == 0 || slot > self.slot_count() {
            return Err(CryptoError::SlotOutOfRange {
                slot,
                slot_count: self.slot_count(),
            });
        }
        Ok(&self.h[slot])
    }

    /// `H_1..H_n` in slot order.
    pub fn message_bases(&self) -> &[G1Affine] {
        &self.h[1..]
    }

    /// `Y_1..Y_n` in slot order.
    pub fn message_exponent_bases(&self) -> &[G2Affine] {
        &self.y[1..]
    }

    /// Check every `e(H_i, g2) == e(g1, Y_i)`.
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.y.len() != self.h.len() || self.y.len() < 2 {
            return Err(CryptoError::InvalidPublicKey(format!(
                "{} G2 bases and {} G1 bases",
                self.y.len(),
                self.h.len()
            )));
        }
        for (i, (h, y)) in self.h.iter().zip(&self.y).enumerate() {
            if !pairs_with_generators(h, y) {
                return Err(CryptoError::InvalidPublicKey(format!(
                    "G1 base {i} does not match G2 base {i}"
                )));
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.slot_count();
        let mut w = ByteWriter::with_capacity(2 + 96 * (n + 2) + 48 * (n + 1));
        w.put_u16(n as u16);
        put_g2(&mut w, &self.w);
        for y in &self.y {
            put_g2(&mut w, y);
        }
        for h in &self.h {
            put_g1(&mut w, h);
        }
        w.into_bytes()
    }

    /// Decode and validate an issuer public key.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut r = ByteReader::new(bytes);
        let n = r.read_u16("slot_count")? as usize;
        check_slot_count(n)?;
        let w = read_g2(&mut r, "W")?;
        let y = (0..=n)
            .map(|_| read_g2(&mut r, "Y"))
            .collect::<Result<Vec<_>, _>>()?;
        let h = (0..=n)
            .map(|_| read_g1(&mut r, "H"))
            .collect::<Result<Vec<_>, _>>()?;
        r.finish()?;
        let pk = Self { w, y, h };
        pk.validate()?;
        Ok(pk)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&from_hex(s)?)
    }

    /// SHA-256 of the encoded key, hex. Stable identifier for logs.
    pub fn fingerprint(&self) -> String {
        to_hex(&Sha256::digest(self.to_bytes()))
    }
}

impl fmt::Debug for IssuerPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IssuerPublicKey(slots={}, fingerprint={}...)",
            self.slot_count(),
            &self.fingerprint()[..16]
        )
    }
}

impl Serialize for IssuerPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for IssuerPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl IssuerKeyPair {
    pub fn from_secret(secret: IssuerSecretKey) -> Self {
        let public = secret.public_key();
        Self { secret, public }
    }

    pub fn secret(&self) -> &IssuerSecretKey {
        &self.secret
    }

    pub fn public(&self) -> &IssuerPublicKey {
        &self.public
    }

    pub fn slot_count(&self) -> usize {
        self.public.slot_count()
    }
}

impl fmt::Debug for IssuerKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuerKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

/// BBS+ signature `(A, e, s)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BbsSignature {
    pub a: G1Affine,
    pub e: Scalar,
    pub s: Scalar,
}

impl BbsSignature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_SIZE] {
        let mut out = [0u8; SIGNATURE_SIZE];
        out[..G1_COMPRESSED_SIZE].copy_from_slice(&self.a.to_compressed());
        out[G1_COMPRESSED_SIZE..G1_COMPRESSED_SIZE + SCALAR_SIZE].copy_from_slice(&self.e.to_bytes());
        out[G1_COMPRESSED_SIZE + SCALAR_SIZE..].copy_from_slice(&self.s.to_bytes());
        out
    }

    /// Decode exactly [`SIGNATURE_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let mut r = ByteReader::new(bytes);
        let a = read_g1(&mut r, "A")?;
        let e = read_scalar(&mut r, "e")?;
        let s = read_scalar(&mut r, "s")?;
        r.finish()?;
        Ok(Self { a, e, s })
    }
}

/// Issuer's half of a blind signature: `s` holds only the issuer's share
/// `s''` of the blinding exponent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlindSignature {
    pub a: G1Affine,
    pub e: Scalar,
    pub s_issuer: Scalar,
}

impl BlindSignature {
    /// Combine with the holder's commitment blinding `s'`.
    pub fn unblind(&self, s_holder: &SecretScalar) -> BbsSignature {
        BbsSignature {
            a: self.a,
            e: self.e,
            s: self.s_issuer + s_holder.expose(),
        }
    }
}

/// `B = g1 · H_0^s · Π H_i^{m_i}` for a full message vector.
pub fn message_commitment(
    pk: &IssuerPublicKey,
    s: &Scalar,
    messages: &[Scalar],
) -> Result<G1Projective, CryptoError> {
    if messages.len() != pk.slot_count() {
        return Err(CryptoError::MessageCount {
            expected: pk.slot_count(),
            got: messages.len(),
        });
    }
    let mut terms = Vec::with_capacity(messages.len() + 1);
    terms.push((G1Projective::from(pk.blinding_base()), *s));
    terms.extend(
        pk.message_bases()
            .iter()
            .zip(messages)
            .map(|(h, m)| (G1Projective::from(h), *m)),
    );
    Ok(G1Projective::from(g1()) + multi_exp_g1(&terms))
}

/// `A = B^{1/(x+e)}` with fresh `e`; resamples in the negligible case
/// `x + e == 0`.
fn exponentiate_base<R: RngCore + CryptoRng>(
    sk: &IssuerSecretKey,
    base: G1Projective,
    rng: &mut R,
) -> (G1Affine, Scalar) {
    loop {
        let e = Scalar::random(&mut *rng);
        let inv: Option<Scalar> = (sk.x() + e).invert().into();
        if let Some(inv) = inv {
            return ((base * inv).to_affine(), e);
        }
    }
}

/// Sign a full message vector (slot 1 first).
pub fn sign<R: RngCore + CryptoRng>(
    keypair: &IssuerKeyPair,
    messages: &[Scalar],
    rng: &mut R,
) -> Result<BbsSignature, CryptoError> {
    let s = Scalar::random(&mut *rng);
    let base = message_commitment(keypair.public(), &s, messages)?;
    let (a, e) = exponentiate_base(keypair.secret(), base, rng);
    Ok(BbsSignature { a, e, s })
}

/// Sign over a holder commitment `C = H_0^{s'} · Π_{blind} H_i^{m_i}` plus
/// the messages the issuer knows, given as `(slot, m)` pairs.
///
/// The caller must have verified the holder's proof of knowledge of the
/// commitment opening, and `known` must cover exactly the slots the
/// commitment does not.
pub fn sign_committed<R: RngCore + CryptoRng>(
    keypair: &IssuerKeyPair,
    commitment: &G1Affine,
    known: &[(usize, Scalar)],
    rng: &mut R,
) -> Result<BlindSignature, CryptoError> {
    let pk = keypair.public();
    let s_issuer = Scalar::random(&mut *rng);
    let mut terms = Vec::with_capacity(known.len() + 1);
    terms.push((G1Projective::from(pk.blinding_base()), s_issuer));
    for (slot, m) in known {
        terms.push((G1Projective::from(pk.message_base(*slot)?), *m));
    }
    let base = G1Projective::from(g1()) + G1Projective::from(commitment) + multi_exp_g1(&terms);
    let (a, e) = exponentiate_base(keypair.secret(), base, rng);
    Ok(BlindSignature { a, e, s_issuer })
}

/// Check `e(A, W · g2^e) == e(g1, g2 · Y_0^s · Π Y_i^{m_i})`.
pub fn verify_signature(
    pk: &IssuerPublicKey,
    signature: &BbsSignature,
    messages: &[Scalar],
) -> Result<(), CryptoError> {
    if messages.len() != pk.slot_count() {
        return Err(CryptoError::MessageCount {
            expected: pk.slot_count(),
            got: messages.len(),
        });
    }
    if bool::from(signature.a.is_identity()) {
        return Err(CryptoError::IdentityPoint { group: "G1" });
    }
    let g2p = G2Projective::generator();
    let w_e = (G2Projective::from(pk.w()) + g2p * signature.e).to_affine();
    let mut rhs = g2p + G2Projective::from(pk.blinding_exponent_base()) * signature.s;
    for (y, m) in pk.message_exponent_bases().iter().zip(messages) {
        rhs += G2Projective::from(y) * m;
    }
    if pairing_product_is_identity(&[(signature.a, w_e), (-g1(), rhs.to_affine())]) {
        Ok(())
    } else {
        Err(CryptoError::VerificationFailed(
            "BBS+ pairing equation does not hold".into(),
        ))
    }
}
