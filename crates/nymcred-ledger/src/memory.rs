//! # In-Memory Reference Ledger
//!
//! A single-process ledger with the shape of a small blockchain:
//!
//! - accepted transactions take effect on the pseudonym table immediately
//!   and wait in a pending pool;
//! - [`InMemoryLedger::seal_block()`] moves the pool into a block whose
//!   header commits to the previous block hash and to the root of a
//!   Merkle Mountain Range over every sealed transaction id;
//! - [`InMemoryLedger::inclusion_proof()`] returns an SPV-style proof that
//!   a sealed transaction is committed by a block header.
//!
//! All state sits behind one `parking_lot::RwLock`; registration and
//! revocation validate and mutate under a single write guard so that
//! concurrent requests for the same pseudonym cannot both succeed.
//! [`InMemoryLedger::set_available()`] simulates an outage.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use nymcred_core::{
    sha256_digest, CanonicalBytes, ContentDigest, LedgerId, Nonce, Timestamp, TxId, NONCE_LEN,
};
use nymcred_crypto::{
    verify_inclusion_proof, Ed25519PublicKey, Ed25519Signature, InclusionProof,
    MerkleMountainRange, Pseudonym,
};
use nymcred_zkp::{verify_ownership, OwnershipProof};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::ledger::{IdentityLedger, LedgerRecord, TxReceipt};
use crate::revocation::{Revocation, RevocationStatement};

/// Registration nonces are this tag followed by the 16-byte ledger UUID.
const REGISTRATION_TAG: &[u8; 16] = b"nymcred/register";

/// A state-changing ledger transaction. Its id is the SHA-256 of its
/// canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerTransaction {
    Register {
        ledger: LedgerId,
        nym: Pseudonym,
        proof: OwnershipProof,
    },
    Revoke {
        ledger: LedgerId,
        nym: Pseudonym,
        authority: Ed25519PublicKey,
        signature: Ed25519Signature,
    },
}

impl LedgerTransaction {
    pub fn txid(&self) -> Result<TxId, LedgerError> {
        Ok(TxId(sha256_digest(&CanonicalBytes::new(self)?)))
    }

    pub fn nym(&self) -> &Pseudonym {
        match self {
            Self::Register { nym, .. } | Self::Revoke { nym, .. } => nym,
        }
    }
}

/// A sealed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub prev_hash: ContentDigest,
    /// MMR root over all transaction ids sealed up to and including this
    /// block. All zeros while the range is empty.
    pub tx_root: ContentDigest,
    /// Number of MMR leaves committed by `tx_root`.
    pub tx_count: u64,
    pub timestamp: Timestamp,
    pub txids: Vec<TxId>,
}

#[derive(Serialize)]
struct BlockHeader<'a> {
    height: u64,
    prev_hash: &'a ContentDigest,
    tx_root: &'a ContentDigest,
    tx_count: u64,
    timestamp: &'a Timestamp,
}

impl Block {
    /// SHA-256 of the canonical header (the txid list is committed
    /// through `tx_root`).
    pub fn hash(&self) -> Result<ContentDigest, LedgerError> {
        let header = BlockHeader {
            height: self.height,
            prev_hash: &self.prev_hash,
            tx_root: &self.tx_root,
            tx_count: self.tx_count,
            timestamp: &self.timestamp,
        };
        Ok(sha256_digest(&CanonicalBytes::new(&header)?))
    }
}

/// Proof that a transaction is committed by the block at `block_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInclusion {
    pub txid: TxId,
    pub block_height: u64,
    pub proof: InclusionProof,
}

/// Summary of the chain, for status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub ledger: LedgerId,
    pub height: u64,
    pub tip_hash: ContentDigest,
    pub pending: usize,
    pub registered: usize,
    pub revoked: usize,
    pub sealed_transactions: u64,
}

#[derive(Debug)]
struct ChainState {
    records: HashMap<Pseudonym, LedgerRecord>,
    pending: Vec<(TxId, LedgerTransaction)>,
    blocks: Vec<Block>,
    tip_hash: ContentDigest,
    mmr: MerkleMountainRange,
    /// Sealed txid -> (block height, MMR leaf index).
    sealed: HashMap<TxId, (u64, u64)>,
}

impl ChainState {
    fn next_height(&self) -> u64 {
        self.blocks.len() as u64
    }

    fn enqueue(&mut self, tx: LedgerTransaction) -> Result<TxReceipt, LedgerError> {
        let txid = tx.txid()?;
        self.pending.push((txid, tx));
        Ok(TxReceipt {
            txid,
            block_height: self.next_height(),
        })
    }
}

#[derive(Debug)]
pub struct InMemoryLedger {
    id: LedgerId,
    authorities: RwLock<HashSet<Ed25519PublicKey>>,
    state: RwLock<ChainState>,
    available: AtomicBool,
}

impl InMemoryLedger {
    /// A fresh ledger holding only the genesis block.
    pub fn new() -> Self {
        Self::with_id(LedgerId::new())
    }

    pub fn with_id(id: LedgerId) -> Self {
        let genesis = Block {
            height: 0,
            prev_hash: ContentDigest::from_bytes([0u8; 32]),
            tx_root: ContentDigest::from_bytes([0u8; 32]),
            tx_count: 0,
            timestamp: Timestamp::now(),
            txids: Vec::new(),
        };
        // The genesis header contains no floats; canonicalization cannot fail.
        let tip_hash = genesis
            .hash()
            .unwrap_or_else(|_| ContentDigest::from_bytes([0u8; 32]));
        Self {
            id,
            authorities: RwLock::new(HashSet::new()),
            state: RwLock::new(ChainState {
                records: HashMap::new(),
                pending: Vec::new(),
                blocks: vec![genesis],
                tip_hash,
                mmr: MerkleMountainRange::new(),
                sealed: HashMap::new(),
            }),
            available: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> LedgerId {
        self.id
    }

    /// Allow `authority` to sign revocations.
    pub fn add_revocation_authority(&self, authority: Ed25519PublicKey) {
        tracing::info!(ledger = %self.id, authority = %authority, "revocation authority added");
        self.authorities.write().insert(authority);
    }

    pub fn remove_revocation_authority(&self, authority: &Ed25519PublicKey) -> bool {
        self.authorities.write().remove(authority)
    }

    /// Simulate an outage (`false`) or recovery (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        tracing::info!(ledger = %self.id, available, "ledger availability changed");
    }

    fn ensure_available(&self) -> Result<(), LedgerError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LedgerError::Unavailable(format!("{} is offline", self.id)))
        }
    }

    /// Seal the pending pool into a new block. Returns `None` when the
    /// pool is empty.
    pub fn seal_block(&self) -> Result<Option<Block>, LedgerError> {
        self.ensure_available()?;
        let mut state = self.state.write();
        if state.pending.is_empty() {
            return Ok(None);
        }
        let height = state.next_height();
        let pending = std::mem::take(&mut state.pending);
        let mut txids = Vec::with_capacity(pending.len());
        for (txid, _) in &pending {
            let leaf = state.mmr.append(txid.0);
            state.sealed.insert(*txid, (height, leaf));
            txids.push(*txid);
        }
        let block = Block {
            height,
            prev_hash: state.tip_hash,
            tx_root: state
                .mmr
                .root()
                .unwrap_or_else(|| ContentDigest::from_bytes([0u8; 32])),
            tx_count: state.mmr.len(),
            timestamp: Timestamp::now(),
            txids,
        };
        state.tip_hash = block.hash()?;
        state.blocks.push(block.clone());
        tracing::debug!(
            ledger = %self.id,
            height,
            transactions = block.txids.len(),
            "block sealed"
        );
        Ok(Some(block))
    }

    pub fn block(&self, height: u64) -> Option<Block> {
        let index = usize::try_from(height).ok()?;
        self.state.read().blocks.get(index).cloned()
    }

    pub fn chain_info(&self) -> ChainInfo {
        let state = self.state.read();
        ChainInfo {
            ledger: self.id,
            height: state.next_height() - 1,
            tip_hash: state.tip_hash,
            pending: state.pending.len(),
            registered: state.records.values().filter(|r| r.registered).count(),
            revoked: state.records.values().filter(|r| r.revoked).count(),
            sealed_transactions: state.mmr.len(),
        }
    }

    /// Inclusion proof for a sealed transaction against the current MMR
    /// root, which is the `tx_root` of the latest block.
    pub fn inclusion_proof(&self, txid: &TxId) -> Result<TxInclusion, LedgerError> {
        self.ensure_available()?;
        let state = self.state.read();
        let (block_height, leaf) = state
            .sealed
            .get(txid)
            .copied()
            .ok_or(LedgerError::UnknownTransaction(*txid))?;
        Ok(TxInclusion {
            txid: *txid,
            block_height,
            proof: state.mmr.prove(leaf)?,
        })
    }

    /// Check an inclusion proof against this ledger's block headers: the
    /// proof must be internally consistent, prove `txid`, and its root
    /// must equal the `tx_root` of the block that committed that many
    /// transactions.
    pub fn verify_inclusion(&self, inclusion: &TxInclusion) -> bool {
        if inclusion.proof.entry != inclusion.txid.0 || !verify_inclusion_proof(&inclusion.proof) {
            return false;
        }
        let state = self.state.read();
        state.blocks.iter().any(|b| {
            b.tx_count == inclusion.proof.size
                && b.tx_root == inclusion.proof.root
                && b.height >= inclusion.block_height
        })
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityLedger for InMemoryLedger {
    fn registration_nonce(&self) -> Nonce {
        let mut bytes = [0u8; NONCE_LEN];
        bytes[..REGISTRATION_TAG.len()].copy_from_slice(REGISTRATION_TAG);
        bytes[REGISTRATION_TAG.len()..].copy_from_slice(self.id.as_uuid().as_bytes());
        Nonce::from(bytes)
    }

    fn register(&self, nym: &Pseudonym, proof: &OwnershipProof) -> Result<TxReceipt, LedgerError> {
        self.ensure_available()?;
        if let Err(e) = verify_ownership(nym, proof, &self.registration_nonce()) {
            tracing::warn!(ledger = %self.id, nym = %nym, "registration rejected: invalid ownership proof");
            return Err(LedgerError::InvalidOwnershipProof(e.to_string()));
        }

        let mut state = self.state.write();
        if state.records.get(nym).is_some_and(|r| r.registered) {
            tracing::warn!(ledger = %self.id, nym = %nym, "registration rejected: already registered");
            return Err(LedgerError::AlreadyRegistered(*nym));
        }
        let receipt = state.enqueue(LedgerTransaction::Register {
            ledger: self.id,
            nym: *nym,
            proof: *proof,
        })?;
        state.records.insert(
            *nym,
            LedgerRecord {
                registered: true,
                revoked: false,
            },
        );
        tracing::info!(ledger = %self.id, nym = %nym, txid = %receipt.txid, "pseudonym registered");
        Ok(receipt)
    }

    fn lookup(&self, nym: &Pseudonym) -> Result<LedgerRecord, LedgerError> {
        self.ensure_available()?;
        Ok(self
            .state
            .read()
            .records
            .get(nym)
            .copied()
            .unwrap_or(LedgerRecord::UNKNOWN))
    }

    fn revoke(&self, nym: &Pseudonym, revocation: &Revocation) -> Result<TxReceipt, LedgerError> {
        self.ensure_available()?;
        if !self.authorities.read().contains(&revocation.authority) {
            tracing::warn!(ledger = %self.id, nym = %nym, "revocation rejected: unknown authority");
            return Err(LedgerError::UnauthorizedRevocation(format!(
                "{} is not a revocation authority for {}",
                revocation.authority, self.id
            )));
        }
        revocation.verify(&RevocationStatement::new(self.id, *nym))?;

        let mut state = self.state.write();
        match state.records.get(nym) {
            None => return Err(LedgerError::NotRegistered(*nym)),
            Some(r) if !r.registered => return Err(LedgerError::NotRegistered(*nym)),
            Some(r) if r.revoked => return Err(LedgerError::AlreadyRevoked(*nym)),
            Some(_) => {}
        }
        let receipt = state.enqueue(LedgerTransaction::Revoke {
            ledger: self.id,
            nym: *nym,
            authority: revocation.authority,
            signature: revocation.signature,
        })?;
        state.records.insert(
            *nym,
            LedgerRecord {
                registered: true,
                revoked: true,
            },
        );
        tracing::info!(ledger = %self.id, nym = %nym, txid = %receipt.txid, "pseudonym revoked");
        Ok(receipt)
    }
}
