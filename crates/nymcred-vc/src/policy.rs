//! # Verifier Access Policy
//!
//! Optional requirements a verifier places on what a presentation
//! discloses, checked only after the proof itself has verified:
//!
//! - `require`: attribute → exact value that must be disclosed;
//! - `disclose`: attributes that must be disclosed with any value.
//!
//! ```yaml
//! policy:
//!   require: { m3: student }
//!   disclose: [m2]
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::schema::{CredentialSchema, DisclosedAttributes};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub require: BTreeMap<String, String>,
    #[serde(default)]
    pub disclose: BTreeSet<String>,
}

impl AccessPolicy {
    pub fn requiring(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut policy = Self::default();
        policy.require.insert(name.into(), value.into());
        policy
    }

    pub fn is_empty(&self) -> bool {
        self.require.is_empty() && self.disclose.is_empty()
    }

    /// Every named attribute must exist in `schema` and every required
    /// value must be encodable.
    pub fn validate(&self, schema: &CredentialSchema) -> Result<(), SchemaError> {
        for name in &self.disclose {
            schema.slot_of(name)?;
        }
        for (name, value) in &self.require {
            let slot = schema.slot_of(name)?;
            if let Some(decl) = schema.attribute_at(slot) {
                decl.encode(value)?;
            }
        }
        Ok(())
    }

    /// Returns a description of the first unmet requirement.
    pub fn check(&self, disclosed: &DisclosedAttributes) -> Result<(), String> {
        for (name, expected) in &self.require {
            match disclosed.get(name) {
                Some(v) if v == expected => {}
                Some(v) => return Err(format!("{name} is {v:?}, policy requires {expected:?}")),
                None => return Err(format!("{name} must be disclosed")),
            }
        }
        if let Some(name) = self.disclose.iter().find(|n| !disclosed.contains_key(*n)) {
            return Err(format!("{name} must be disclosed"));
        }
        Ok(())
    }
}
