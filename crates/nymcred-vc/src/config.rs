//! Verifier configuration.
//!
//! Replay retention defaults to five minutes and 100 000 entries. Override
//! via environment variables or explicit construction.

use std::time::Duration;

use crate::error::SchemaError;
use crate::policy::AccessPolicy;

pub const REPLAY_WINDOW_VAR: &str = "NYMCRED_REPLAY_WINDOW_SECS";
pub const REPLAY_CAPACITY_VAR: &str = "NYMCRED_REPLAY_CAPACITY";

pub const DEFAULT_REPLAY_WINDOW: Duration = Duration::from_secs(300);
pub const DEFAULT_REPLAY_CAPACITY: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// How long a `(nonce, A')` pair is remembered.
    pub replay_window: Duration,
    /// Maximum remembered pairs; the oldest is evicted first.
    pub replay_capacity: usize,
    pub policy: Option<AccessPolicy>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            replay_window: DEFAULT_REPLAY_WINDOW,
            replay_capacity: DEFAULT_REPLAY_CAPACITY,
            policy: None,
        }
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `NYMCRED_REPLAY_WINDOW_SECS` (default: 300)
    /// - `NYMCRED_REPLAY_CAPACITY` (default: 100000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`VerifierConfig::from_env()`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        cfg.apply_overrides(lookup)?;
        Ok(cfg)
    }

    /// Replace fields whose variable is set, leaving the rest untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(REPLAY_WINDOW_VAR) {
            self.replay_window = Duration::from_secs(parse_positive(REPLAY_WINDOW_VAR, &raw)?);
        }
        if let Some(raw) = lookup(REPLAY_CAPACITY_VAR) {
            let capacity = parse_positive(REPLAY_CAPACITY_VAR, &raw)?;
            self.replay_capacity = usize::try_from(capacity).map_err(|_| ConfigError::InvalidValue {
                var: REPLAY_CAPACITY_VAR.to_string(),
                value: raw.clone(),
                reason: "too large".to_string(),
            })?;
        }
        Ok(())
    }

    pub fn with_policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

fn parse_positive(var: &str, raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid("must be greater than zero")),
        Ok(n) => Ok(n),
        Err(e) => Err(invalid(&e.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
    #[error("issuer key has {key_slots} slots but schema {schema} needs {schema_slots}")]
    SchemaMismatch {
        schema: String,
        schema_slots: usize,
        key_slots: usize,
    },
    #[error("access policy does not fit the schema: {0}")]
    Policy(#[from] SchemaError),
}
