//! # Credentials
//!
//! A credential is a BBS+ signature `(A, e, s)` over
//! `[m_nym, attr_2, ..., attr_n]`. It carries neither the attribute values
//! nor the pseudonym: the holder keeps those alongside it, and a
//! credential is only meaningful together with them and the issuer key.
//!
//! Encoding: `A (48) || e (32) || s (32)`, [`CREDENTIAL_SIZE`] bytes; hex
//! in JSON.

use nymcred_core::{from_hex, to_hex};
use nymcred_crypto::{
    verify_signature, BbsSignature, CryptoError, IssuerPublicKey, Pseudonym, SIGNATURE_SIZE,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::{AttributeSet, CredentialSchema};

pub const CREDENTIAL_SIZE: usize = SIGNATURE_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential(BbsSignature);

impl Credential {
    pub fn from_signature(signature: BbsSignature) -> Self {
        Self(signature)
    }

    pub fn signature(&self) -> &BbsSignature {
        &self.0
    }

    pub fn to_bytes(&self) -> [u8; CREDENTIAL_SIZE] {
        self.0.to_bytes()
    }

    /// Decode exactly [`CREDENTIAL_SIZE`] bytes, validating `A`, `e`, `s`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        BbsSignature::from_bytes(bytes).map(Self)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.to_bytes())
    }

    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&from_hex(s)?)
    }

    /// Check the pairing equation for `nym` and `attributes` under `issuer`.
    pub fn verify(
        &self,
        issuer: &IssuerPublicKey,
        schema: &CredentialSchema,
        nym: &Pseudonym,
        attributes: &AttributeSet,
    ) -> Result<(), CryptoError> {
        let messages = schema
            .message_vector(nym, attributes)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))?;
        verify_signature(issuer, &self.0, &messages)
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
