//! # nymcred-crypto — Cryptographic Primitives
//!
//! Group arithmetic, keys, and signatures that the proof layer
//! (`nymcred-zkp`) and the credential layer (`nymcred-vc`) build on.
//!
//! ## Modules
//!
//! - [`group`]: BLS12-381 context. Protocol constants, domain-separated
//!   hashing to scalars and to G1, pairings, multi-exponentiation, and
//!   validated point/scalar codecs.
//! - [`secret`]: zeroizing owned scalar wrapper for every secret value.
//! - [`pseudonym`]: the public `nym = g1^sk` type.
//! - [`bbs`]: BBS+ issuer keyring, signing (plain and over a holder
//!   commitment), and signature verification.
//! - [`ed25519`]: revocation-authority signatures over canonical bytes.
//! - [`mmr`]: Merkle Mountain Range over ledger transaction ids.
//!
//! ## Crate Policy
//!
//! - Every decoding path validates curve and subgroup membership.
//! - Secret material never implements `Serialize`, `Clone`, or a
//!   revealing `Debug`.
//! - No `unwrap()` outside tests.

pub mod bbs;
pub mod ed25519;
pub mod error;
pub mod group;
pub mod mmr;
pub mod pseudonym;
pub mod secret;

pub use bbs::{
    keygen, sign, sign_committed, verify_signature, BbsSignature, BlindSignature, IssuerKeyPair,
    IssuerPublicKey, IssuerSecretKey, NYM_SLOT, SIGNATURE_SIZE,
};
pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use error::CryptoError;
pub use group::{
    hash_to_g1, hash_to_scalar, sample_nonzero_scalar, sample_scalar, CURVE_ID,
    G1_COMPRESSED_SIZE, G2_COMPRESSED_SIZE, SCALAR_SIZE,
};
pub use mmr::{verify_inclusion_proof, InclusionProof, MerkleMountainRange};
pub use pseudonym::Pseudonym;
pub use secret::SecretScalar;

// Curve types are part of the public API of every layer above.
pub use bls12_381::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
