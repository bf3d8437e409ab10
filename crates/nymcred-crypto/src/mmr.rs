//! # Merkle Mountain Range
//!
//! Append-only accumulator over 32-byte entries (ledger transaction ids).
//! Each block header commits to the range root at seal time, and any
//! transaction can be shown to be included with a logarithmic proof.
//!
//! ## Hashing
//!
//! - leaf: `SHA256(0x00 || entry)`
//! - node: `SHA256(0x01 || left || right)`
//! - root: peaks bagged right to left, `node(peak_i, bag(peaks_{i+1..}))`
//!
//! The distinct prefixes keep a leaf from being reinterpreted as an inner
//! node.

use nymcred_core::ContentDigest;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CryptoError;

type Hash32 = [u8; 32];

fn sha256(parts: &[&[u8]]) -> Hash32 {
    let mut h = Sha256::new();
    for p in parts {
        h.update(p);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&h.finalize());
    out
}

pub fn leaf_hash(entry: &ContentDigest) -> ContentDigest {
    ContentDigest::from_bytes(sha256(&[&[0x00], entry.as_bytes()]))
}

pub fn node_hash(left: &ContentDigest, right: &ContentDigest) -> ContentDigest {
    ContentDigest::from_bytes(sha256(&[&[0x01], left.as_bytes(), right.as_bytes()]))
}

/// Root of a perfect subtree and its height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peak {
    pub height: u32,
    pub hash: ContentDigest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// Sibling on the path from a leaf to its peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub side: Side,
    pub hash: ContentDigest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    /// Number of leaves when the proof was built.
    pub size: u64,
    pub root: ContentDigest,
    pub leaf_index: u64,
    /// The committed entry (not its leaf hash).
    pub entry: ContentDigest,
    pub peak_index: usize,
    pub peak_height: u32,
    pub path: Vec<PathStep>,
    pub peaks: Vec<Peak>,
}

fn bag_peaks(peaks: &[Peak]) -> Option<ContentDigest> {
    let (last, rest) = peaks.split_last()?;
    Some(
        rest.iter()
            .rev()
            .fold(last.hash, |bag, p| node_hash(&p.hash, &bag)),
    )
}

/// `(height, leaf_count)` of each peak, left to right, for a range of `size`.
fn peak_plan(size: u64) -> Vec<(u32, u64)> {
    let mut out = Vec::new();
    let mut n = size;
    while n > 0 {
        let h = u64::BITS - n.leading_zeros() - 1;
        let cnt = 1u64 << h;
        out.push((h, cnt));
        n -= cnt;
    }
    out
}

/// `(peak_index, first_leaf, height)` of the peak covering `leaf_index`.
fn locate_peak(size: u64, leaf_index: u64) -> Option<(usize, u64, u32)> {
    if leaf_index >= size {
        return None;
    }
    let mut start = 0u64;
    for (i, (h, cnt)) in peak_plan(size).into_iter().enumerate() {
        if leaf_index < start + cnt {
            return Some((i, start, h));
        }
        start += cnt;
    }
    None
}

#[derive(Debug, Clone, Default)]
pub struct MerkleMountainRange {
    peaks: Vec<Peak>,
    leaf_hashes: Vec<ContentDigest>,
    entries: Vec<ContentDigest>,
}

impl MerkleMountainRange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Bagged root; `None` while empty.
    pub fn root(&self) -> Option<ContentDigest> {
        bag_peaks(&self.peaks)
    }

    /// Append an entry and return its leaf index.
    pub fn append(&mut self, entry: ContentDigest) -> u64 {
        let leaf = leaf_hash(&entry);
        self.entries.push(entry);
        self.leaf_hashes.push(leaf);

        let mut cur = Peak { height: 0, hash: leaf };
        while let Some(top) = self.peaks.last().copied() {
            if top.height != cur.height {
                break;
            }
            self.peaks.pop();
            cur = Peak {
                height: cur.height + 1,
                hash: node_hash(&top.hash, &cur.hash),
            };
        }
        self.peaks.push(cur);
        self.len() - 1
    }

    /// Inclusion proof for the entry at `leaf_index` against the current root.
    pub fn prove(&self, leaf_index: u64) -> Result<InclusionProof, CryptoError> {
        let size = self.len();
        let root = self
            .root()
            .ok_or_else(|| CryptoError::Mmr("cannot prove against an empty range".into()))?;
        let (peak_index, start, peak_height) = locate_peak(size, leaf_index).ok_or_else(|| {
            CryptoError::Mmr(format!("leaf index {leaf_index} out of range for size {size}"))
        })?;

        let first = start as usize;
        let mut level: Vec<ContentDigest> =
            self.leaf_hashes[first..first + (1usize << peak_height)].to_vec();
        let mut pos = (leaf_index - start) as usize;
        let mut path = Vec::with_capacity(peak_height as usize);
        while level.len() > 1 {
            let sibling = pos ^ 1;
            path.push(PathStep {
                side: if sibling < pos { Side::Left } else { Side::Right },
                hash: level[sibling],
            });
            level = level
                .chunks_exact(2)
                .map(|pair| node_hash(&pair[0], &pair[1]))
                .collect();
            pos /= 2;
        }

        Ok(InclusionProof {
            size,
            root,
            leaf_index,
            entry: self.entries[leaf_index as usize],
            peak_index,
            peak_height,
            path,
            peaks: self.peaks.clone(),
        })
    }
}

/// Check an inclusion proof for internal consistency and against its root.
///
/// Callers must separately compare `proof.root` with a root they trust
/// (for example the one in a block header).
pub fn verify_inclusion_proof(proof: &InclusionProof) -> bool {
    let Some((exp_index, _, exp_height)) = locate_peak(proof.size, proof.leaf_index) else {
        return false;
    };
    if exp_index != proof.peak_index
        || exp_height != proof.peak_height
        || proof.path.len() != proof.peak_height as usize
        || proof.peaks.len() != peak_plan(proof.size).len()
    {
        return false;
    }
    match proof.peaks.get(proof.peak_index) {
        Some(p) if p.height == proof.peak_height => {}
        _ => return false,
    }

    let computed_peak = proof
        .path
        .iter()
        .fold(leaf_hash(&proof.entry), |cur, step| match step.side {
            Side::Left => node_hash(&step.hash, &cur),
            Side::Right => node_hash(&cur, &step.hash),
        });

    let mut peaks = proof.peaks.clone();
    peaks[proof.peak_index].hash = computed_peak;
    bag_peaks(&peaks) == Some(proof.root)
}
