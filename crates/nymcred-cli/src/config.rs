//! # CLI Configuration
//!
//! Optional YAML file (`--config`) with environment overrides for the
//! verifier's replay settings. Every section has a default, so an empty
//! file and no file at all both yield the university-id scenario:
//!
//! ```yaml
//! schema:
//!   id: university-id
//!   attributes:
//!     - { name: m1, type: string }
//!     - { name: m2, type: integer }
//!     - { name: m3, type: enum, variants: [student, staff, faculty] }
//! verifier:
//!   replay_window_secs: 300
//!   replay_capacity: 100000
//!   policy:
//!     require: { m3: student }
//! demo:
//!   attributes: { m1: alice, m2: "22", m3: student }
//!   disclose: [m3]
//!   nonce: abc123
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use nymcred_core::SchemaId;
use nymcred_vc::config::{DEFAULT_REPLAY_CAPACITY, DEFAULT_REPLAY_WINDOW};
use nymcred_vc::{AccessPolicy, AttributeDecl, AttributeSet, CredentialSchema, VerifierConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NymcredConfig {
    /// Falls back to [`default_schema()`] when absent.
    pub schema: Option<CredentialSchema>,
    pub verifier: VerifierSection,
    pub demo: DemoSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierSection {
    pub replay_window_secs: u64,
    pub replay_capacity: usize,
    pub policy: Option<AccessPolicy>,
}

impl Default for VerifierSection {
    fn default() -> Self {
        Self {
            replay_window_secs: DEFAULT_REPLAY_WINDOW.as_secs(),
            replay_capacity: DEFAULT_REPLAY_CAPACITY,
            policy: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemoSection {
    pub attributes: AttributeSet,
    pub disclose: Vec<String>,
    /// UTF-8 nonce text; `null` draws a random nonce.
    pub nonce: Option<String>,
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            attributes: [("m1", "alice"), ("m2", "22"), ("m3", "student")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            disclose: vec!["m3".to_string()],
            nonce: Some("abc123".to_string()),
        }
    }
}

/// `university-id`: `m1` string, `m2` integer, `m3` enum.
pub fn default_schema() -> Result<CredentialSchema> {
    let schema = CredentialSchema::new(
        SchemaId::new("university-id")?,
        vec![
            AttributeDecl::string("m1"),
            AttributeDecl::integer("m2"),
            AttributeDecl::enumeration("m3", ["student", "staff", "faculty"]),
        ],
    )?;
    Ok(schema)
}

impl NymcredConfig {
    /// Load from `path` (if any), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file: {}", path.display()))?;
                Self::from_yaml_str(&raw)
                    .with_context(|| format!("invalid config file: {}", path.display()))?
            }
            None => Self::default(),
        };
        cfg.apply_env_overrides(|var| std::env::var(var).ok())?;
        tracing::debug!(config = ?cfg, "configuration loaded");
        Ok(cfg)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `NYMCRED_REPLAY_WINDOW_SECS` and `NYMCRED_REPLAY_CAPACITY`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut verifier = self.verifier_config_unchecked();
        verifier.apply_overrides(lookup)?;
        self.verifier.replay_window_secs = verifier.replay_window.as_secs();
        self.verifier.replay_capacity = verifier.replay_capacity;
        Ok(())
    }

    pub fn schema(&self) -> Result<CredentialSchema> {
        match &self.schema {
            Some(schema) => Ok(schema.clone()),
            None => default_schema(),
        }
    }

    pub fn verifier_config(&self) -> Result<VerifierConfig> {
        anyhow::ensure!(
            self.verifier.replay_window_secs > 0,
            "verifier.replay_window_secs must be greater than zero"
        );
        anyhow::ensure!(
            self.verifier.replay_capacity > 0,
            "verifier.replay_capacity must be greater than zero"
        );
        Ok(self.verifier_config_unchecked())
    }

    fn verifier_config_unchecked(&self) -> VerifierConfig {
        VerifierConfig {
            replay_window: Duration::from_secs(self.verifier.replay_window_secs),
            replay_capacity: self.verifier.replay_capacity,
            policy: self.verifier.policy.clone(),
        }
    }
}
