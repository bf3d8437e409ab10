//! Fiat–Shamir transcript.
//!
//! Inputs are buffered as `label || len || bytes` frames and hashed to a
//! scalar in one shot with the transcript's domain separation tag.

use nymcred_crypto::group::{g1_to_bytes, hash_to_scalar, scalar_to_bytes};
use nymcred_crypto::{G1Affine, Scalar};

#[derive(Debug, Clone)]
pub struct Transcript {
    dst: &'static [u8],
    buf: Vec<u8>,
}

impl Transcript {
    pub fn new(dst: &'static [u8]) -> Self {
        Self {
            dst,
            buf: Vec::with_capacity(512),
        }
    }

    pub fn append_message(&mut self, label: &'static [u8], bytes: &[u8]) {
        self.buf.push(label.len() as u8);
        self.buf.extend_from_slice(label);
        self.buf.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
        self.buf.extend_from_slice(bytes);
    }

    pub fn append_g1(&mut self, label: &'static [u8], point: &G1Affine) {
        self.append_message(label, &g1_to_bytes(point));
    }

    pub fn append_scalar(&mut self, label: &'static [u8], scalar: &Scalar) {
        self.append_message(label, &scalar_to_bytes(scalar));
    }

    pub fn append_u64(&mut self, label: &'static [u8], value: u64) {
        self.append_message(label, &value.to_be_bytes());
    }

    pub fn challenge(self) -> Scalar {
        hash_to_scalar(self.dst, &[&self.buf])
    }
}
