//! # Identifier Newtypes
//!
//! Type-level distinction between the byte strings and identifiers that
//! flow between holder, issuer, verifier, and ledger. A verifier nonce can
//! never be passed where a transaction id is expected.

use std::fmt;

use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::digest::ContentDigest;
use crate::encoding::{from_hex, to_hex};
use crate::error::NymcredError;

/// Length of nonces produced by [`Nonce::random()`].
pub const NONCE_LEN: usize = 32;

/// Largest nonce accepted anywhere in the protocol (u16 length prefix).
const MAX_NONCE_LEN: usize = u16::MAX as usize;

/// Freshness value chosen by a verifier (or ledger, or issuer) and bound
/// into a Fiat–Shamir challenge.
///
/// Serialized as hex. Arbitrary byte strings are allowed so that
/// caller-chosen textual nonces such as `"abc123"` work unchanged.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonce(Vec<u8>);

impl Nonce {
    /// Sample a fresh [`NONCE_LEN`]-byte nonce.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = vec![0u8; NONCE_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap caller-supplied bytes.
    ///
    /// # Errors
    ///
    /// Empty nonces and nonces longer than the wire prefix allows are rejected.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, NymcredError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(NymcredError::Validation("nonce must not be empty".into()));
        }
        if bytes.len() > MAX_NONCE_LEN {
            return Err(NymcredError::Validation(format!(
                "nonce of {} bytes exceeds {MAX_NONCE_LEN}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }
}

impl From<[u8; NONCE_LEN]> for Nonce {
    fn from(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes.to_vec())
    }
}

impl std::str::FromStr for Nonce {
    type Err = NymcredError;

    /// The UTF-8 bytes of `s` become the nonce.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes().to_vec())
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce({})", self.to_hex())
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Nonce {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Nonce {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = from_hex(&s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(bytes).map_err(serde::de::Error::custom)
    }
}

/// Ledger transaction identifier: SHA-256 of the canonical transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub ContentDigest);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

/// Identifier of a ledger instance. Bound into registration contexts and
/// revocation statements so they cannot be replayed against another ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerId(pub Uuid);

impl LedgerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LedgerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ledger:{}", self.0)
    }
}

/// Identifier of a credential schema.
///
/// Lowercase ASCII letters, digits, `-`, `_`, `.` and `:`; 1 to 128 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SchemaId(String);

impl SchemaId {
    pub fn new(id: impl Into<String>) -> Result<Self, NymcredError> {
        let id = id.into();
        let valid_char =
            |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || "-_.:".contains(c);
        if id.is_empty() || id.len() > 128 || !id.chars().all(valid_char) {
            return Err(NymcredError::Validation(format!("invalid schema id: {id:?}")));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for SchemaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn random_nonces_are_distinct_and_sized() {
        let a = Nonce::random(&mut OsRng);
        let b = Nonce::random(&mut OsRng);
        assert_eq!(a.as_bytes().len(), NONCE_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn textual_nonce_uses_utf8_bytes() {
        let n: Nonce = "abc123".parse().unwrap();
        assert_eq!(n.as_bytes(), b"abc123");
        assert_eq!(n.to_hex(), "616263313233");
    }

    #[test]
    fn empty_nonce_rejected() {
        assert!(Nonce::from_bytes(Vec::new()).is_err());
        assert!("".parse::<Nonce>().is_err());
    }

    #[test]
    fn nonce_serde_is_hex() {
        let n: Nonce = "abc123".parse().unwrap();
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, "\"616263313233\"");
        let back: Nonce = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
    }

    #[test]
    fn schema_id_validation() {
        assert!(SchemaId::new("university.enrolment:v1").is_ok());
        assert!(SchemaId::new("").is_err());
        assert!(SchemaId::new("Has Spaces").is_err());
        assert!(serde_json::from_str::<SchemaId>("\"UPPER\"").is_err());
    }

    #[test]
    fn ledger_ids_are_unique() {
        assert_ne!(LedgerId::new(), LedgerId::new());
    }
}
