//! # nymcred-core — Foundational Types for Pseudonymous Credentials
//!
//! This crate is the leaf of the nymcred dependency graph. It defines the
//! byte-level and identifier primitives shared by the cryptographic,
//! ledger, and credential layers. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** Every digest over structured data
//!    (ledger transactions, revocation statements) flows through
//!    `CanonicalBytes::new()`. No raw `serde_json::to_vec()` for digests.
//!
//! 2. **Fixed-width codecs in one place.** [`encoding::ByteWriter`] and
//!    [`encoding::ByteReader`] are the only way protocol objects are laid
//!    out on the wire. The reader refuses truncated input and trailing bytes.
//!
//! 3. **Newtype identifiers.** `Nonce`, `TxId`, `LedgerId`, and `SchemaId`
//!    cannot be confused for one another or for bare byte strings.
//!
//! 4. **UTC-only timestamps** with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `nymcred-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use encoding::{from_hex, to_hex, ByteReader, ByteWriter};
pub use error::{CanonicalizationError, EncodingError, NymcredError};
pub use identity::{LedgerId, Nonce, SchemaId, TxId, NONCE_LEN};
pub use temporal::Timestamp;
