//! # Presentation Encoding
//!
//! ```text
//! version (u8 = 0x01)
//! nym (48)
//! A' || Ā || d || T1 || T2 || T_nym          6 × 48
//! c || z_e || z_r2 || z_r3 || z_s' || z_sk   6 × 32
//! u16 hidden count, then (u16 slot || z_i)*            ascending
//! u16 disclosed count, then
//!   (u16 slot || u16 name_len || name || m_j || u32 value_len || value)*  ascending
//! u16 nonce_len || nonce
//! ```
//!
//! Decoding checks lengths, point and scalar validity, ordering and the
//! absence of trailing bytes. Whether the contents make sense for a given
//! schema is the verifier's job.

use std::collections::BTreeMap;

use nymcred_core::{from_hex, to_hex, ByteReader, ByteWriter, EncodingError, Nonce, SchemaId};
use nymcred_crypto::group::{put_scalar, read_scalar};
use nymcred_crypto::{Pseudonym, Scalar, G1_COMPRESSED_SIZE};
use nymcred_zkp::PossessionProof;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProofDecodeError;
use crate::schema::DisclosedAttributes;

pub const PROOF_VERSION: u8 = 0x01;

/// One disclosed attribute: its slot, name and value as presented, and
/// the message scalar the proof was computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosedAttribute {
    pub slot: usize,
    pub name: String,
    pub value: String,
    pub scalar: Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    pub nym: Pseudonym,
    pub possession: PossessionProof,
    /// Ascending by slot.
    pub disclosed: Vec<DisclosedAttribute>,
    pub nonce: Nonce,
}

impl Proof {
    /// Slot → scalar map for the possession statement.
    pub fn disclosed_scalars(&self) -> BTreeMap<usize, Scalar> {
        self.disclosed.iter().map(|d| (d.slot, d.scalar)).collect()
    }

    pub fn disclosed_attributes(&self) -> DisclosedAttributes {
        self.disclosed
            .iter()
            .map(|d| (d.name.clone(), d.value.clone()))
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodingError> {
        let mut w = ByteWriter::new();
        w.put_u8(PROOF_VERSION);
        w.put_fixed(&self.nym.to_bytes());
        self.possession.write_to(&mut w)?;
        w.put_count("disclosed", self.disclosed.len())?;
        for d in &self.disclosed {
            w.put_count("disclosed_slot", d.slot)?;
            w.put_bytes_u16("disclosed_name", d.name.as_bytes())?;
            put_scalar(&mut w, &d.scalar);
            w.put_bytes_u32("disclosed_value", d.value.as_bytes())?;
        }
        w.put_bytes_u16("nonce", self.nonce.as_bytes())?;
        Ok(w.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProofDecodeError> {
        let mut r = ByteReader::new(bytes);
        let version = r.read_u8("version")?;
        if version != PROOF_VERSION {
            return Err(EncodingError::UnknownTag {
                field: "version",
                tag: version,
            }
            .into());
        }
        let nym = Pseudonym::from_bytes(&r.read_array::<G1_COMPRESSED_SIZE>("nym")?)?;
        let possession = PossessionProof::read_from(&mut r)?;

        let count = r.read_u16("disclosed")? as usize;
        let mut disclosed: Vec<DisclosedAttribute> = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let slot = r.read_u16("disclosed_slot")? as usize;
            if disclosed.last().is_some_and(|prev| slot <= prev.slot) {
                return Err(ProofDecodeError::Malformed(
                    "disclosed slots must be strictly ascending".into(),
                ));
            }
            let name = r.read_string_u16("disclosed_name")?;
            let scalar = read_scalar(&mut r, "disclosed_message")?;
            let value = r.read_string_u32("disclosed_value")?;
            disclosed.push(DisclosedAttribute {
                slot,
                name,
                value,
                scalar,
            });
        }

        let nonce = Nonce::from_bytes(r.read_bytes_u16("nonce")?.to_vec())
            .map_err(|e| ProofDecodeError::Malformed(e.to_string()))?;
        r.finish()?;
        Ok(Self {
            nym,
            possession,
            disclosed,
            nonce,
        })
    }

    pub fn to_hex(&self) -> Result<String, EncodingError> {
        Ok(to_hex(&self.to_bytes()?))
    }

    pub fn from_hex(s: &str) -> Result<Self, ProofDecodeError> {
        Self::from_bytes(&from_hex(s)?)
    }
}

/// Extra challenge input binding the schema and the presented strings.
///
/// Disclosed scalars are already hashed by the possession transcript;
/// this adds the names and values so that a presentation cannot be
/// relabelled without invalidating the challenge.
pub(crate) fn presentation_context(
    schema: &SchemaId,
    disclosed: &[DisclosedAttribute],
) -> Result<Vec<u8>, EncodingError> {
    let mut w = ByteWriter::new();
    w.put_bytes_u16("schema_id", schema.as_str().as_bytes())?;
    w.put_count("disclosed", disclosed.len())?;
    for d in disclosed {
        w.put_count("disclosed_slot", d.slot)?;
        w.put_bytes_u16("disclosed_name", d.name.as_bytes())?;
        w.put_bytes_u32("disclosed_value", d.value.as_bytes())?;
    }
    Ok(w.into_bytes())
}

impl Serialize for Proof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let hex = self.to_hex().map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&hex)
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nymcred_zkp::TrapdoorIdentity;
    use rand_core::OsRng;

    use crate::issuer::CredentialIssuer;
    use crate::prover::ProofProver;
    use crate::schema::{AttributeDecl, AttributeSet, CredentialSchema};

    fn sample_proof(disclose: &[&str]) -> Proof {
        let schema = CredentialSchema::new(
            SchemaId::new("university-id").unwrap(),
            vec![
                AttributeDecl::string("m1"),
                AttributeDecl::integer("m2"),
                AttributeDecl::enumeration("m3", ["student", "staff"]),
            ],
        )
        .unwrap();
        let issuer = CredentialIssuer::new(schema, &mut OsRng).unwrap();
        let alice = TrapdoorIdentity::generate(&mut OsRng);
        let attrs: AttributeSet = [("m1", "alice"), ("m2", "-7"), ("m3", "staff")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let nonce = issuer.issue_nonce(&mut OsRng);
        let ownership = alice.prove_ownership(&nonce, &mut OsRng);
        let cred = issuer
            .issue(alice.pseudonym(), &attrs, &ownership, &nonce, &mut OsRng)
            .unwrap();
        ProofProver::new(issuer.public_key(), issuer.schema())
            .unwrap()
            .present(
                &cred,
                &attrs,
                disclose.iter().copied(),
                &"abc123".parse().unwrap(),
                alice.secret(),
                &mut OsRng,
            )
            .unwrap()
    }

    #[test]
    fn encoding_roundtrip() {
        let proof = sample_proof(&["m1", "m3"]);
        let bytes = proof.to_bytes().unwrap();
        assert_eq!(bytes[0], PROOF_VERSION);
        assert_eq!(Proof::from_bytes(&bytes).unwrap(), proof);
        assert_eq!(Proof::from_hex(&proof.to_hex().unwrap()).unwrap(), proof);

        let json = serde_json::to_string(&proof).unwrap();
        let back: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
        assert_eq!(back.disclosed_attributes()["m3"], "staff");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = sample_proof(&["m2"]).to_bytes().unwrap();
        bytes[0] = 0x02;
        assert!(matches!(
            Proof::from_bytes(&bytes),
            Err(ProofDecodeError::Encoding(EncodingError::UnknownTag { field: "version", tag: 0x02 }))
        ));
    }

    #[test]
    fn truncated_and_trailing_input_is_rejected() {
        let bytes = sample_proof(&["m2"]).to_bytes().unwrap();
        assert!(matches!(
            Proof::from_bytes(&bytes[..bytes.len() - 1]),
            Err(ProofDecodeError::Encoding(EncodingError::Truncated { .. }))
        ));
        let mut long = bytes.clone();
        long.extend_from_slice(&[0, 0]);
        assert!(matches!(
            Proof::from_bytes(&long),
            Err(ProofDecodeError::Encoding(EncodingError::TrailingBytes(2)))
        ));
        assert!(Proof::from_bytes(&[]).is_err());
    }

    #[test]
    fn disclosed_slots_must_ascend() {
        let mut proof = sample_proof(&["m1", "m3"]);
        proof.disclosed.reverse();
        let bytes = proof.to_bytes().unwrap();
        assert!(matches!(
            Proof::from_bytes(&bytes),
            Err(ProofDecodeError::Malformed(_))
        ));
    }

    #[test]
    fn identity_nym_is_rejected() {
        let mut bytes = sample_proof(&[]).to_bytes().unwrap();
        // Compressed identity: infinity flag set, all other bits zero.
        bytes[1] = 0xc0;
        bytes[2..1 + G1_COMPRESSED_SIZE].fill(0);
        assert!(Proof::from_bytes(&bytes).is_err());
    }

    #[test]
    fn context_binds_names_and_values() {
        let proof = sample_proof(&["m1"]);
        let id = SchemaId::new("university-id").unwrap();
        let base = presentation_context(&id, &proof.disclosed).unwrap();
        let mut relabelled = proof.disclosed.clone();
        relabelled[0].value = "bob".into();
        assert_ne!(presentation_context(&id, &relabelled).unwrap(), base);
        let other = SchemaId::new("library-card").unwrap();
        assert_ne!(presentation_context(&other, &proof.disclosed).unwrap(), base);
    }
}
