//! # nymcred-zkp — Proof Systems
//!
//! Sigma protocols made non-interactive with Fiat–Shamir:
//!
//! - [`ownership`]: Schnorr proof of knowledge of the trapdoor behind a
//!   pseudonym, bound to a nonce. Used at ledger registration and issuance.
//! - [`trapdoor`]: holder identity (trapdoor secret + pseudonym).
//! - [`commitment`]: proof of knowledge of the opening of a Pedersen-style
//!   commitment to attribute values, for blind issuance.
//! - [`possession`]: proof of possession of a BBS+ signature with
//!   selective disclosure, bound to the holder's pseudonym and a verifier
//!   nonce.
//!
//! Every challenge is derived through [`transcript::Transcript`], which
//! frames each input with a label and length so that no two distinct
//! transcripts hash the same byte string.

pub mod commitment;
pub mod error;
pub mod ownership;
pub mod possession;
pub mod transcript;
pub mod trapdoor;

pub use commitment::{commit_attributes, verify_commitment, BlindCommitment};
pub use error::ZkpError;
pub use ownership::{prove_ownership, verify_ownership, OwnershipProof, OWNERSHIP_PROOF_SIZE};
pub use possession::{prove_possession, verify_possession, PossessionProof, PossessionStatement};
pub use transcript::Transcript;
pub use trapdoor::{TrapdoorIdentity, TrapdoorSecret};
