//! # Canonical Serialization
//!
//! `CanonicalBytes` is the sole construction path for bytes that feed a
//! digest over structured data: ledger transaction identifiers, block
//! hashes, and the statements revocation authorities sign.
//!
//! ## Invariant
//!
//! The inner buffer is private. The only constructor runs the coercion
//! pipeline below and then serializes with `serde_jcs` (RFC 8785): sorted
//! keys, compact separators, deterministic bytes. Any function that needs
//! canonical bytes takes `&CanonicalBytes`, so a digest over ad-hoc
//! `serde_json::to_vec()` output cannot be computed by accident.
//!
//! Coercion rules:
//!
//! 1. `null`, `bool`, `string`, and integers pass through.
//! 2. Non-integral numbers are rejected with `FloatRejected`.
//! 3. Objects and arrays are coerced recursively.
//!
//! Binary protocol values (points, scalars) are serialized as lowercase hex
//! strings by their `Serialize` impls before they reach this pipeline.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `FloatRejected` if the value contains a non-integral number,
    /// `SerializationFailed` if serde cannot represent it as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        let coerced = coerce(value)?;
        let s = serde_jcs::to_string(&coerced)?;
        Ok(Self(s.into_bytes()))
    }

    /// The canonical byte sequence.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn coerce(value: Value) -> Result<Value, CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(value),
        Value::Number(ref n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(value)
        }
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| coerce(v).map(|v| (k, v)))
            .collect::<Result<serde_json::Map<_, _>, _>>()
            .map(Value::Object),
        Value::Array(items) => items
            .into_iter()
            .map(coerce)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn json_without_floats() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| serde_json::json!(n)),
            "[a-f0-9]{0,40}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn canonicalization_is_deterministic(v in json_without_floats()) {
            let a = CanonicalBytes::new(&v).unwrap();
            let b = CanonicalBytes::new(&v).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn canonical_output_reparses_to_same_value(v in json_without_floats()) {
            let cb = CanonicalBytes::new(&v).unwrap();
            let parsed: Value = serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, v);
        }
    }
}
