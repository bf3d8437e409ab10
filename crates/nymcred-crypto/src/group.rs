//! # Pairing Group Context
//!
//! The single place that touches BLS12-381 directly. Higher layers work
//! with the operations here plus the curve types re-exported from the
//! crate root.
//!
//! ## Protocol constants
//!
//! | Constant | Value |
//! |---|---|
//! | [`CURVE_ID`] | `BLS12-381` |
//! | [`G1_COMPRESSED_SIZE`] | 48 bytes |
//! | [`G2_COMPRESSED_SIZE`] | 96 bytes |
//! | [`SCALAR_SIZE`] | 32 bytes, little-endian canonical |
//!
//! The generators `g1`, `g2` and the prepared form of `g2` used in
//! multi-Miller loops are process-wide and initialized once.
//!
//! ## Decoding
//!
//! Every `*_from_bytes` and `read_*` function validates that points lie on
//! the curve and in the prime-order subgroup (`from_compressed` performs
//! both checks), rejects the identity, and rejects non-canonical scalars.

use std::sync::OnceLock;

use bls12_381::hash_to_curve::{ExpandMsgXmd, HashToCurve};
use bls12_381::{
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt, Scalar,
};
use ff::Field;
use group::Curve;
use nymcred_core::{ByteReader, ByteWriter};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use crate::error::CryptoError;

pub const CURVE_ID: &str = "BLS12-381";
pub const G1_COMPRESSED_SIZE: usize = 48;
pub const G2_COMPRESSED_SIZE: usize = 96;
pub const SCALAR_SIZE: usize = 32;

/// Domain separation tags. Each hash in the protocol uses exactly one.
pub mod dst {
    pub const NYM_MESSAGE: &[u8] = b"NYMCRED-V1:BLS12381:nym-message";
    pub const STRING_ATTRIBUTE: &[u8] = b"NYMCRED-V1:BLS12381:string-attribute";
    pub const OWNERSHIP: &[u8] = b"NYMCRED-V1:BLS12381:ownership-proof";
    pub const PRESENTATION: &[u8] = b"NYMCRED-V1:BLS12381:presentation-challenge";
    pub const BLIND_COMMITMENT: &[u8] = b"NYMCRED-V1:BLS12381:blind-commitment";
    pub const HASH_TO_G1: &[u8] = b"NYMCRED-V1:BLS12381G1_XMD:SHA-256_SSWU_RO_";
}

/// Generator of G1.
pub fn g1() -> G1Affine {
    G1Affine::generator()
}

/// Generator of G2.
pub fn g2() -> G2Affine {
    G2Affine::generator()
}

/// `g2` in Miller-loop-prepared form.
pub fn g2_prepared() -> &'static G2Prepared {
    static PREPARED: OnceLock<G2Prepared> = OnceLock::new();
    PREPARED.get_or_init(|| G2Prepared::from(G2Affine::generator()))
}

/// Uniform scalar from a cryptographically secure RNG.
pub fn sample_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    Scalar::random(rng)
}

/// Uniform non-zero scalar; used wherever the value is inverted or acts
/// as a rerandomizer.
pub fn sample_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let s = Scalar::random(&mut *rng);
        if !bool::from(s.is_zero()) {
            return s;
        }
    }
}

/// Domain-separated hash of a list of byte strings to a scalar.
///
/// SHA-512 over `len(dst) || dst || (len(part) || part)*`, reduced mod p
/// with a 64-byte wide reduction so the output is statistically uniform.
/// Lengths are big-endian `u32`, so part boundaries are unambiguous.
pub fn hash_to_scalar(dst: &[u8], parts: &[&[u8]]) -> Scalar {
    let mut hasher = Sha512::new();
    hasher.update((dst.len() as u32).to_be_bytes());
    hasher.update(dst);
    for part in parts {
        hasher.update((part.len() as u32).to_be_bytes());
        hasher.update(part);
    }
    scalar_from_wide_digest(hasher)
}

/// Finish a SHA-512 state and reduce it to a scalar.
pub(crate) fn scalar_from_wide_digest(hasher: Sha512) -> Scalar {
    let digest = hasher.finalize();
    let mut wide = [0u8; 64];
    wide.copy_from_slice(&digest);
    Scalar::from_bytes_wide(&wide)
}

/// RFC 9380 hash-to-curve into G1 (`expand_message_xmd` with SHA-256).
///
/// The SHA-256 here is the `sha2` 0.9 one that `bls12_381`'s expander is
/// written against.
pub fn hash_to_g1(dst: &[u8], msg: &[u8]) -> G1Projective {
    <G1Projective as HashToCurve<ExpandMsgXmd<sha2_09::Sha256>>>::hash_to_curve(msg, dst)
}

/// `Σ s_i · P_i` in G1.
pub fn multi_exp_g1(terms: &[(G1Projective, Scalar)]) -> G1Projective {
    terms
        .iter()
        .fold(G1Projective::identity(), |acc, (p, s)| acc + p * s)
}

/// `Σ s_i · Q_i` in G2.
pub fn multi_exp_g2(terms: &[(G2Projective, Scalar)]) -> G2Projective {
    terms
        .iter()
        .fold(G2Projective::identity(), |acc, (q, s)| acc + q * s)
}

/// `e(P, Q)`.
pub fn pairing(p: &G1Affine, q: &G2Affine) -> Gt {
    bls12_381::pairing(p, q)
}

/// `Π e(P_i, Q_i) == 1`, evaluated with one multi-Miller loop and a
/// single final exponentiation.
pub fn pairing_product_is_identity(terms: &[(G1Affine, G2Affine)]) -> bool {
    let prepared: Vec<(G1Affine, G2Prepared)> = terms
        .iter()
        .map(|(p, q)| (*p, G2Prepared::from(*q)))
        .collect();
    let refs: Vec<(&G1Affine, &G2Prepared)> = prepared.iter().map(|(p, q)| (p, q)).collect();
    multi_miller_loop(&refs).final_exponentiation() == Gt::identity()
}

/// `e(P, g2) == e(g1, Q)` using the cached prepared generator.
pub fn pairs_with_generators(p: &G1Affine, q: &G2Affine) -> bool {
    let neg_g1 = -g1();
    let q_prepared = G2Prepared::from(*q);
    multi_miller_loop(&[(p, g2_prepared()), (&neg_g1, &q_prepared)]).final_exponentiation()
        == Gt::identity()
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

pub fn g1_to_bytes(p: &G1Affine) -> [u8; G1_COMPRESSED_SIZE] {
    p.to_compressed()
}

pub fn g2_to_bytes(q: &G2Affine) -> [u8; G2_COMPRESSED_SIZE] {
    q.to_compressed()
}

pub fn scalar_to_bytes(s: &Scalar) -> [u8; SCALAR_SIZE] {
    s.to_bytes()
}

/// Decode a compressed G1 point, rejecting the identity.
pub fn g1_from_bytes(bytes: &[u8; G1_COMPRESSED_SIZE]) -> Result<G1Affine, CryptoError> {
    let p: G1Affine = Option::from(G1Affine::from_compressed(bytes))
        .ok_or(CryptoError::InvalidPoint { group: "G1" })?;
    if bool::from(p.is_identity()) {
        return Err(CryptoError::IdentityPoint { group: "G1" });
    }
    Ok(p)
}

/// Decode a compressed G2 point, rejecting the identity.
pub fn g2_from_bytes(bytes: &[u8; G2_COMPRESSED_SIZE]) -> Result<G2Affine, CryptoError> {
    let q: G2Affine = Option::from(G2Affine::from_compressed(bytes))
        .ok_or(CryptoError::InvalidPoint { group: "G2" })?;
    if bool::from(q.is_identity()) {
        return Err(CryptoError::IdentityPoint { group: "G2" });
    }
    Ok(q)
}

/// Decode a canonical little-endian scalar.
pub fn scalar_from_bytes(bytes: &[u8; SCALAR_SIZE]) -> Result<Scalar, CryptoError> {
    Option::from(Scalar::from_bytes(bytes)).ok_or(CryptoError::NonCanonicalScalar)
}

pub fn put_g1(w: &mut ByteWriter, p: &G1Affine) {
    w.put_fixed(&g1_to_bytes(p));
}

pub fn put_g1_projective(w: &mut ByteWriter, p: &G1Projective) {
    put_g1(w, &p.to_affine());
}

pub fn put_g2(w: &mut ByteWriter, q: &G2Affine) {
    w.put_fixed(&g2_to_bytes(q));
}

pub fn put_scalar(w: &mut ByteWriter, s: &Scalar) {
    w.put_fixed(&scalar_to_bytes(s));
}

pub fn read_g1(r: &mut ByteReader<'_>, field: &'static str) -> Result<G1Affine, CryptoError> {
    g1_from_bytes(&r.read_array::<G1_COMPRESSED_SIZE>(field)?)
}

pub fn read_g2(r: &mut ByteReader<'_>, field: &'static str) -> Result<G2Affine, CryptoError> {
    g2_from_bytes(&r.read_array::<G2_COMPRESSED_SIZE>(field)?)
}

pub fn read_scalar(r: &mut ByteReader<'_>, field: &'static str) -> Result<Scalar, CryptoError> {
    scalar_from_bytes(&r.read_array::<SCALAR_SIZE>(field)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use group::Group;
    use rand_core::OsRng;

    #[test]
    fn pairing_is_bilinear() {
        let a = sample_scalar(&mut OsRng);
        let b = sample_scalar(&mut OsRng);
        let p = (G1Projective::generator() * a).to_affine();
        let q = (G2Projective::generator() * b).to_affine();
        let lhs = pairing(&p, &q);
        let rhs = pairing(&g1(), &g2()) * (a * b);
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn pairing_product_detects_equality_and_inequality() {
        let y = sample_nonzero_scalar(&mut OsRng);
        let h = (G1Projective::generator() * y).to_affine();
        let big_y = (G2Projective::generator() * y).to_affine();
        assert!(pairs_with_generators(&h, &big_y));
        assert!(pairing_product_is_identity(&[(h, g2()), (-g1(), big_y)]));

        let other = (G2Projective::generator() * (y + Scalar::ONE)).to_affine();
        assert!(!pairs_with_generators(&h, &other));
    }

    #[test]
    fn hash_to_scalar_is_domain_separated_and_framed() {
        let a = hash_to_scalar(dst::NYM_MESSAGE, &[b"abc"]);
        let b = hash_to_scalar(dst::STRING_ATTRIBUTE, &[b"abc"]);
        assert_ne!(a, b);
        assert_eq!(a, hash_to_scalar(dst::NYM_MESSAGE, &[b"abc"]));
        // Length framing: ("ab","c") and ("a","bc") differ.
        assert_ne!(
            hash_to_scalar(dst::NYM_MESSAGE, &[b"ab", b"c"]),
            hash_to_scalar(dst::NYM_MESSAGE, &[b"a", b"bc"])
        );
    }

    #[test]
    fn hash_to_g1_lands_in_subgroup() {
        let p = hash_to_g1(dst::HASH_TO_G1, b"nymcred").to_affine();
        assert!(!bool::from(p.is_identity()));
        let decoded = g1_from_bytes(&g1_to_bytes(&p)).unwrap();
        assert_eq!(decoded, p);
    }

    #[test]
    fn hash_to_g1_is_deterministic_and_separated() {
        let p = hash_to_g1(dst::HASH_TO_G1, b"nymcred");
        assert_eq!(p, hash_to_g1(dst::HASH_TO_G1, b"nymcred"));
        assert_ne!(p, hash_to_g1(dst::HASH_TO_G1, b"nymcreD"));
        assert_ne!(p, hash_to_g1(b"NYMCRED-V1:other", b"nymcred"));
    }

    #[test]
    fn multi_exp_matches_naive_sum() {
        let s1 = sample_scalar(&mut OsRng);
        let s2 = sample_scalar(&mut OsRng);
        let p1 = G1Projective::random(&mut OsRng);
        let p2 = G1Projective::random(&mut OsRng);
        assert_eq!(multi_exp_g1(&[(p1, s1), (p2, s2)]), p1 * s1 + p2 * s2);
        let q = G2Projective::random(&mut OsRng);
        assert_eq!(multi_exp_g2(&[(q, s1), (q, s2)]), q * (s1 + s2));
    }

    #[test]
    fn identity_points_are_rejected() {
        assert!(matches!(
            g1_from_bytes(&G1Affine::identity().to_compressed()),
            Err(CryptoError::IdentityPoint { group: "G1" })
        ));
        assert!(matches!(
            g2_from_bytes(&G2Affine::identity().to_compressed()),
            Err(CryptoError::IdentityPoint { group: "G2" })
        ));
    }

    #[test]
    fn garbage_point_bytes_are_rejected() {
        // Compression flag set, x coordinate all 0xff: larger than the field modulus.
        let bytes = [0xffu8; G1_COMPRESSED_SIZE];
        assert!(matches!(
            g1_from_bytes(&bytes),
            Err(CryptoError::InvalidPoint { group: "G1" })
        ));
        // Compression flag clear is never a valid compressed encoding.
        let mut bytes = g1_to_bytes(&g1());
        bytes[0] &= 0x7f;
        assert!(g1_from_bytes(&bytes).is_err());
    }

    #[test]
    fn non_canonical_scalar_is_rejected() {
        // 2^256 - 1 exceeds the scalar field modulus.
        assert!(matches!(
            scalar_from_bytes(&[0xff; SCALAR_SIZE]),
            Err(CryptoError::NonCanonicalScalar)
        ));
        let s = sample_scalar(&mut OsRng);
        assert_eq!(scalar_from_bytes(&scalar_to_bytes(&s)).unwrap(), s);
    }

    #[test]
    fn reader_helpers_roundtrip() {
        let s = sample_scalar(&mut OsRng);
        let p = G1Projective::random(&mut OsRng).to_affine();
        let q = G2Projective::random(&mut OsRng).to_affine();
        let mut w = ByteWriter::new();
        put_g1(&mut w, &p);
        put_g2(&mut w, &q);
        put_scalar(&mut w, &s);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), G1_COMPRESSED_SIZE + G2_COMPRESSED_SIZE + SCALAR_SIZE);
        let mut r = ByteReader::new(&bytes);
        assert_eq!(read_g1(&mut r, "p").unwrap(), p);
        assert_eq!(read_g2(&mut r, "q").unwrap(), q);
        assert_eq!(read_scalar(&mut r, "s").unwrap(), s);
        r.finish().unwrap();
    }
}
