//! # Pseudonyms
//!
//! A pseudonym is `nym = g1^sk` for the holder's trapdoor `sk`. It is the
//! ledger key for registration and revocation and occupies the first
//! message slot of every credential, as the scalar
//! `H(NYM_MESSAGE, compressed(nym))`.

use std::fmt;
use std::hash::{Hash, Hasher};

use bls12_381::{G1Affine, G1Projective, Scalar};
use group::Curve;
use nymcred_core::{from_hex, to_hex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::group::{dst, g1_from_bytes, hash_to_scalar, G1_COMPRESSED_SIZE};
use crate::secret::SecretScalar;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Pseudonym(G1Affine);

impl Pseudonym {
    /// `g1^sk`. Deterministic: the same trapdoor always yields the same nym.
    pub fn derive(sk: &SecretScalar) -> Self {
        Self((G1Projective::generator() * sk.expose()).to_affine())
    }

    /// Wrap a point received from elsewhere. The identity is never a nym.
    pub fn from_point(point: G1Affine) -> Result<Self, CryptoError> {
        if bool::from(point.is_identity()) {
            return Err(CryptoError::IdentityPoint { group: "G1" });
        }
        Ok(Self(point))
    }

    pub fn as_point(&self) -> &G1Affine {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; G1_COMPRESSED_SIZE] {
        self.0.to_compressed()
    }

    /// Decode from compressed bytes with full subgroup validation.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; G1_COMPRESSED_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::KeyError(format!(
                "pseudonym must be {G1_COMPRESSED_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        g1_from_bytes(&arr).map(Self)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&from_hex(s)?)
    }

    /// The message scalar signed in the nym slot.
    pub fn message_scalar(&self) -> Scalar {
        hash_to_scalar(dst::NYM_MESSAGE, &[&self.to_bytes()])
    }
}

impl Hash for Pseudonym {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl fmt::Debug for Pseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pseudonym({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Pseudonym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Pseudonym {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Pseudonym {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
