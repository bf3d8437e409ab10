//! # nymcred-ledger — Identity Ledger
//!
//! The registry of pseudonyms that verifiers consult after the proof math
//! has passed. A pseudonym is either unknown, registered, or registered
//! and revoked; revocation is keyed solely by the pseudonym.
//!
//! - [`IdentityLedger`] is the interface. Implementations must make
//!   registration an atomic compare-and-set and report outages as the
//!   transient [`LedgerError::Unavailable`].
//! - [`revocation`] defines the statement a revocation authority signs.
//! - [`InMemoryLedger`] is the reference implementation: a pending pool,
//!   sealed blocks and a Merkle Mountain Range over transaction ids.

pub mod error;
pub mod ledger;
pub mod memory;
pub mod revocation;

pub use error::LedgerError;
pub use ledger::{IdentityLedger, LedgerRecord, TxReceipt};
pub use memory::{Block, ChainInfo, InMemoryLedger, LedgerTransaction, TxInclusion};
pub use revocation::{Revocation, RevocationStatement};
