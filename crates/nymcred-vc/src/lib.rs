//! # nymcred-vc — Attribute Credentials
//!
//! The protocol roles built on the cryptographic layers below:
//!
//! - [`schema`]: statically declared credential schemas and the injective
//!   encoding of attribute values into message scalars.
//! - [`credential`]: the `(A, e, s)` credential and its 112-byte encoding.
//! - [`issuer`]: [`CredentialIssuer`], plain and blind issuance, and the
//!   revocation authority.
//! - [`holder`]: holder-side blind issuance requests and completion.
//! - [`prover`]: [`ProofProver`], selective-disclosure presentations.
//! - [`proof`]: the presentation wire format.
//! - [`verifier`]: [`ProofVerifier`], which checks structure, nonce,
//!   challenge, pairing and sigma equations, access policy, ledger state,
//!   and replay, in that order.
//! - [`replay`]: bounded `(nonce, A')` cache.
//! - [`policy`] and [`config`]: verifier access policy and settings.
//!
//! ## Flow
//!
//! ```text
//! holder: TrapdoorIdentity ── register ──▶ IdentityLedger
//! holder ── nym + ownership proof + attributes ──▶ CredentialIssuer ──▶ Credential
//! holder: ProofProver(Credential, disclosure, nonce) ──▶ Proof
//! ProofVerifier(Proof, nonce, IdentityLedger) ──▶ Accept(disclosed) | Reject(reason)
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod holder;
pub mod issuer;
pub mod policy;
pub mod proof;
pub mod prover;
pub mod replay;
pub mod schema;
pub mod verifier;

pub use config::{ConfigError, VerifierConfig};
pub use credential::{Credential, CREDENTIAL_SIZE};
pub use error::{IssueError, PresentError, ProofDecodeError, SchemaError};
pub use holder::{complete_blind_issuance, BlindIssuanceRequest, PendingBlindIssuance};
pub use issuer::CredentialIssuer;
pub use policy::AccessPolicy;
pub use proof::{DisclosedAttribute, Proof, PROOF_VERSION};
pub use prover::ProofProver;
pub use replay::{ReplayCache, ReplayCheck};
pub use schema::{AttributeDecl, AttributeKind, AttributeSet, CredentialSchema, DisclosedAttributes};
pub use verifier::{ProofVerifier, RejectReason, Verdict};
