//! # Credential Schemas
//!
//! A schema fixes, before any credential exists, which attribute lives in
//! which message slot and how its string value becomes a scalar. Slot 1
//! is always the pseudonym; declared attributes take slots `2..=n` in
//! declaration order.
//!
//! ## Encodings
//!
//! | kind | value | scalar |
//! |---|---|---|
//! | `integer` | canonical decimal `i64` | `v` for `v ≥ 0`, `-(|v|)` otherwise |
//! | `string` | any UTF-8 | `H(STRING_ATTRIBUTE, name, value)` |
//! | `enum` | one declared variant | `index + 1` |
//!
//! Integers embed injectively because `|v| ≤ 2^63` is far below half the
//! group order. Integer values must be in canonical form (`"22"`, not
//! `"+22"` or `"022"`) so that every scalar has exactly one presentable
//! string.

use std::collections::{BTreeMap, HashSet};

use nymcred_core::SchemaId;
use nymcred_crypto::bbs::MAX_SLOTS;
use nymcred_crypto::group::dst;
use nymcred_crypto::{hash_to_scalar, Pseudonym, Scalar, NYM_SLOT};
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Attribute name → value, as supplied to the issuer and the prover.
pub type AttributeSet = BTreeMap<String, String>;

/// Attribute name → value, as accepted by a verifier.
pub type DisclosedAttributes = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeKind {
    Integer,
    String,
    Enum { variants: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDecl {
    pub name: String,
    #[serde(flatten)]
    pub kind: AttributeKind,
}

impl AttributeDecl {
    pub fn integer(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Integer,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::String,
        }
    }

    pub fn enumeration<S: Into<String>>(
        name: impl Into<String>,
        variants: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Enum {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Encode one value of this attribute.
    pub fn encode(&self, value: &str) -> Result<Scalar, SchemaError> {
        let invalid = |reason: String| SchemaError::InvalidAttributeEncoding {
            name: self.name.clone(),
            reason,
        };
        match &self.kind {
            AttributeKind::Integer => {
                let v: i64 = value
                    .parse()
                    .map_err(|e| invalid(format!("{value:?} is not a 64-bit integer: {e}")))?;
                if v.to_string() != value {
                    return Err(invalid(format!("{value:?} is not in canonical decimal form")));
                }
                let magnitude = Scalar::from(v.unsigned_abs());
                Ok(if v < 0 { -magnitude } else { magnitude })
            }
            AttributeKind::String => Ok(hash_to_scalar(
                dst::STRING_ATTRIBUTE,
                &[self.name.as_bytes(), value.as_bytes()],
            )),
            AttributeKind::Enum { variants } => variants
                .iter()
                .position(|v| v == value)
                .map(|i| Scalar::from(i as u64 + 1))
                .ok_or_else(|| {
                    invalid(format!("{value:?} is not one of {}", variants.join(", ")))
                }),
        }
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() || self.name.len() > u16::MAX as usize {
            return Err(SchemaError::InvalidSchema(format!(
                "attribute name {:?} must be 1..=65535 bytes",
                self.name
            )));
        }
        if let AttributeKind::Enum { variants } = &self.kind {
            if variants.is_empty() {
                return Err(SchemaError::InvalidSchema(format!(
                    "enum attribute {} declares no variants",
                    self.name
                )));
            }
            let mut seen = HashSet::new();
            if let Some(dup) = variants.iter().find(|v| !seen.insert(v.as_str())) {
                return Err(SchemaError::InvalidSchema(format!(
                    "enum attribute {} repeats variant {dup:?}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// An ordered, validated attribute layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SchemaDecl", into = "SchemaDecl")]
pub struct CredentialSchema {
    id: SchemaId,
    attributes: Vec<AttributeDecl>,
}

#[derive(Serialize, Deserialize)]
struct SchemaDecl {
    id: SchemaId,
    attributes: Vec<AttributeDecl>,
}

impl TryFrom<SchemaDecl> for CredentialSchema {
    type Error = SchemaError;

    fn try_from(decl: SchemaDecl) -> Result<Self, Self::Error> {
        Self::new(decl.id, decl.attributes)
    }
}

impl From<CredentialSchema> for SchemaDecl {
    fn from(schema: CredentialSchema) -> Self {
        Self {
            id: schema.id,
            attributes: schema.attributes,
        }
    }
}

impl CredentialSchema {
    pub fn new(id: SchemaId, attributes: Vec<AttributeDecl>) -> Result<Self, SchemaError> {
        if attributes.len() + NYM_SLOT > MAX_SLOTS {
            return Err(SchemaError::InvalidSchema(format!(
                "{} attributes exceed the slot limit",
                attributes.len()
            )));
        }
        let mut names = HashSet::new();
        for attr in &attributes {
            attr.validate()?;
            if !names.insert(attr.name.as_str()) {
                return Err(SchemaError::InvalidSchema(format!(
                    "attribute {} declared twice",
                    attr.name
                )));
            }
        }
        Ok(Self { id, attributes })
    }

    pub fn id(&self) -> &SchemaId {
        &self.id
    }

    pub fn attributes(&self) -> &[AttributeDecl] {
        &self.attributes
    }

    /// Message slots including the pseudonym slot.
    pub fn slot_count(&self) -> usize {
        self.attributes.len() + NYM_SLOT
    }

    /// Slot of a declared attribute.
    pub fn slot_of(&self, name: &str) -> Result<usize, SchemaError> {
        self.attributes
            .iter()
            .position(|a| a.name == name)
            .map(|i| i + NYM_SLOT + 1)
            .ok_or_else(|| SchemaError::UnknownAttribute(name.to_string()))
    }

    /// Declaration occupying `slot`, if it is an attribute slot.
    pub fn attribute_at(&self, slot: usize) -> Option<&AttributeDecl> {
        slot.checked_sub(NYM_SLOT + 1)
            .and_then(|i| self.attributes.get(i))
    }

    /// Encode a complete attribute set in slot order (pseudonym excluded).
    ///
    /// # Errors
    ///
    /// `UnmappedAttribute` for names the schema does not declare,
    /// `MissingAttribute` for declared names without a value, and
    /// `InvalidAttributeEncoding` for values outside the declared type.
    pub fn encode(&self, attributes: &AttributeSet) -> Result<Vec<Scalar>, SchemaError> {
        if let Some(extra) = attributes
            .keys()
            .find(|name| !self.attributes.iter().any(|a| &a.name == *name))
        {
            return Err(SchemaError::UnmappedAttribute(extra.clone()));
        }
        self.attributes
            .iter()
            .map(|decl| {
                let value = attributes
                    .get(&decl.name)
                    .ok_or_else(|| SchemaError::MissingAttribute(decl.name.clone()))?;
                decl.encode(value)
            })
            .collect()
    }

    /// The full signed message vector `[m_nym, m_2, ..., m_n]`.
    pub fn message_vector(
        &self,
        nym: &Pseudonym,
        attributes: &AttributeSet,
    ) -> Result<Vec<Scalar>, SchemaError> {
        let mut messages = Vec::with_capacity(self.slot_count());
        messages.push(nym.message_scalar());
        messages.extend(self.encode(attributes)?);
        Ok(messages)
    }
}
