//! # Presentation Verification
//!
//! [`ProofVerifier::verify()`] runs its checks in a fixed order and stops
//! at the first failure:
//!
//! 1. the expected nonce (`NonceMismatch`);
//! 2. structure against the schema (`Malformed`);
//! 3. the Fiat–Shamir challenge (`InvalidProof`);
//! 4. `A' ≠ 1`, the pairing check and the sigma equations
//!    (`VerificationFailure`);
//! 5. the access policy, if any (`PolicyViolation`);
//! 6. ledger state of the disclosed pseudonym (`UnknownPseudonym`,
//!    `RevokedCredential`);
//! 7. replay (`Replayed`).
//!
//! A ledger outage is returned as `Err` and is not a rejection: the
//! caller may retry, and the replay cache has not been touched.

use std::collections::BTreeSet;

use nymcred_core::Nonce;
use nymcred_crypto::{IssuerPublicKey, NYM_SLOT};
use nymcred_ledger::{IdentityLedger, LedgerError};
use nymcred_zkp::{verify_possession, PossessionStatement, ZkpError};
use rand_core::{CryptoRng, RngCore};

use crate::config::{ConfigError, VerifierConfig};
use crate::policy::AccessPolicy;
use crate::proof::{presentation_context, Proof};
use crate::replay::{ReplayCache, ReplayCheck};
use crate::schema::{CredentialSchema, DisclosedAttributes};

/// Why a presentation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    Malformed,
    NonceMismatch,
    InvalidProof,
    VerificationFailure,
    PolicyViolation,
    UnknownPseudonym,
    RevokedCredential,
    Replayed,
}

impl RejectReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::NonceMismatch => "nonce_mismatch",
            Self::InvalidProof => "invalid_proof",
            Self::VerificationFailure => "verification_failure",
            Self::PolicyViolation => "policy_violation",
            Self::UnknownPseudonym => "unknown_pseudonym",
            Self::RevokedCredential => "revoked_credential",
            Self::Replayed => "replayed",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept(DisclosedAttributes),
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::Accept(_))
    }

    pub fn disclosed(&self) -> Option<&DisclosedAttributes> {
        match self {
            Self::Accept(d) => Some(d),
            Self::Reject(_) => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accept(_) => None,
            Self::Reject(r) => Some(*r),
        }
    }
}

/// Internal short-circuit: a reason plus a detail for the log line.
struct Rejection(RejectReason, String);

impl Rejection {
    fn new(reason: RejectReason, detail: impl Into<String>) -> Self {
        Self(reason, detail.into())
    }
}

impl From<ZkpError> for Rejection {
    fn from(e: ZkpError) -> Self {
        let reason = match &e {
            ZkpError::InvalidProof(_) => RejectReason::InvalidProof,
            ZkpError::VerificationFailure(_) => RejectReason::VerificationFailure,
            _ => RejectReason::Malformed,
        };
        Self(reason, e.to_string())
    }
}

/// Verifies presentations for one issuer key and schema.
///
/// Shareable across threads; the replay cache is the only mutable state.
#[derive(Debug)]
pub struct ProofVerifier {
    issuer: IssuerPublicKey,
    schema: CredentialSchema,
    policy: Option<AccessPolicy>,
    replay: ReplayCache,
}

impl ProofVerifier {
    /// # Errors
    ///
    /// `SchemaMismatch` if the key and schema disagree on the slot count,
    /// `Policy` if the configured policy names attributes the schema lacks.
    pub fn new(
        issuer: IssuerPublicKey,
        schema: CredentialSchema,
        config: &VerifierConfig,
    ) -> Result<Self, ConfigError> {
        if issuer.slot_count() != schema.slot_count() {
            return Err(ConfigError::SchemaMismatch {
                schema: schema.id().to_string(),
                schema_slots: schema.slot_count(),
                key_slots: issuer.slot_count(),
            });
        }
        if let Some(policy) = &config.policy {
            policy.validate(&schema)?;
        }
        Ok(Self {
            issuer,
            schema,
            policy: config.policy.clone().filter(|p| !p.is_empty()),
            replay: ReplayCache::new(config.replay_window, config.replay_capacity),
        })
    }

    /// Replace the access policy.
    pub fn with_policy(mut self, policy: AccessPolicy) -> Result<Self, ConfigError> {
        policy.validate(&self.schema)?;
        self.policy = Some(policy).filter(|p| !p.is_empty());
        Ok(self)
    }

    pub fn issuer(&self) -> &IssuerPublicKey {
        &self.issuer
    }

    pub fn schema(&self) -> &CredentialSchema {
        &self.schema
    }

    pub fn policy(&self) -> Option<&AccessPolicy> {
        self.policy.as_ref()
    }

    pub fn replay_cache(&self) -> &ReplayCache {
        &self.replay
    }

    /// A fresh challenge nonce for the holder.
    pub fn issue_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Nonce {
        Nonce::random(rng)
    }

    /// Verify `proof` against `expected_nonce` and the ledger.
    ///
    /// # Errors
    ///
    /// Only ledger failures; every verification outcome is a [`Verdict`].
    pub fn verify(
        &self,
        proof: &Proof,
        expected_nonce: &Nonce,
        ledger: &dyn IdentityLedger,
    ) -> Result<Verdict, LedgerError> {
        match self.check(proof, expected_nonce, ledger)? {
            Ok(disclosed) => {
                tracing::info!(
                    schema = %self.schema.id(),
                    nym = %proof.nym,
                    disclosed = disclosed.len(),
                    "presentation accepted"
                );
                Ok(Verdict::Accept(disclosed))
            }
            Err(Rejection(reason, detail)) => {
                tracing::warn!(
                    schema = %self.schema.id(),
                    reason = reason.code(),
                    %detail,
                    "presentation rejected"
                );
                Ok(Verdict::Reject(reason))
            }
        }
    }

    /// Decode and verify. Undecodable input is `Reject(Malformed)`.
    pub fn verify_bytes(
        &self,
        bytes: &[u8],
        expected_nonce: &Nonce,
        ledger: &dyn IdentityLedger,
    ) -> Result<Verdict, LedgerError> {
        match Proof::from_bytes(bytes) {
            Ok(proof) => self.verify(&proof, expected_nonce, ledger),
            Err(e) => {
                tracing::warn!(
                    schema = %self.schema.id(),
                    reason = RejectReason::Malformed.code(),
                    detail = %e,
                    "presentation rejected"
                );
                Ok(Verdict::Reject(RejectReason::Malformed))
            }
        }
    }

    fn check(
        &self,
        proof: &Proof,
        expected_nonce: &Nonce,
        ledger: &dyn IdentityLedger,
    ) -> Result<Result<DisclosedAttributes, Rejection>, LedgerError> {
        if let Err(rejection) = self.check_proof(proof, expected_nonce) {
            return Ok(Err(rejection));
        }
        let disclosed = proof.disclosed_attributes();
        if let Some(policy) = &self.policy {
            if let Err(detail) = policy.check(&disclosed) {
                return Ok(Err(Rejection::new(RejectReason::PolicyViolation, detail)));
            }
        }

        let record = ledger.lookup(&proof.nym)?;
        if !record.registered {
            return Ok(Err(Rejection::new(
                RejectReason::UnknownPseudonym,
                format!("{} is not registered", proof.nym),
            )));
        }
        if record.revoked {
            return Ok(Err(Rejection::new(
                RejectReason::RevokedCredential,
                format!("{} is revoked", proof.nym),
            )));
        }

        match self
            .replay
            .check_and_insert(&proof.nonce, &proof.possession.a_prime)
        {
            ReplayCheck::Fresh => Ok(Ok(disclosed)),
            ReplayCheck::Replayed => Ok(Err(Rejection::new(
                RejectReason::Replayed,
                "presentation already accepted under this nonce",
            ))),
            // Unrecorded presentations are refused.
            ReplayCheck::Full => Ok(Err(Rejection::new(
                RejectReason::Replayed,
                "replay cache full of live entries",
            ))),
        }
    }

    /// Steps 1 to 4: everything that depends only on the proof.
    fn check_proof(&self, proof: &Proof, expected_nonce: &Nonce) -> Result<(), Rejection> {
        if proof.nonce != *expected_nonce {
            return Err(Rejection::new(
                RejectReason::NonceMismatch,
                format!("expected {expected_nonce}, got {}", proof.nonce),
            ));
        }
        self.check_structure(proof)?;
        let context = presentation_context(self.schema.id(), &proof.disclosed)
            .map_err(|e| Rejection::new(RejectReason::Malformed, e.to_string()))?;
        let scalars = proof.disclosed_scalars();
        let statement = PossessionStatement {
            issuer: &self.issuer,
            nym: &proof.nym,
            disclosed: &scalars,
            nonce: &proof.nonce,
            context: &context,
        };
        verify_possession(&statement, &proof.possession)?;
        Ok(())
    }

    fn check_structure(&self, proof: &Proof) -> Result<(), Rejection> {
        let malformed = |detail: String| Rejection::new(RejectReason::Malformed, detail);
        let mut disclosed_slots = BTreeSet::new();
        for d in &proof.disclosed {
            let decl = self
                .schema
                .attribute_at(d.slot)
                .ok_or_else(|| malformed(format!("slot {} is not an attribute slot", d.slot)))?;
            if decl.name != d.name {
                return Err(malformed(format!(
                    "slot {} holds {}, not {}",
                    d.slot, decl.name, d.name
                )));
            }
            let scalar = decl
                .encode(&d.value)
                .map_err(|e| malformed(e.to_string()))?;
            if scalar != d.scalar {
                return Err(malformed(format!(
                    "value of {} does not encode to the carried message",
                    d.name
                )));
            }
            if !disclosed_slots.insert(d.slot) {
                return Err(malformed(format!("slot {} disclosed twice", d.slot)));
            }
        }

        let hidden = (NYM_SLOT + 1..=self.schema.slot_count()).filter(|s| !disclosed_slots.contains(s));
        if !proof
            .possession
            .hidden_responses
            .keys()
            .copied()
            .eq(hidden)
        {
            return Err(malformed(
                "hidden responses do not cover exactly the undisclosed slots".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nymcred_core::SchemaId;
    use nymcred_crypto::{sample_nonzero_scalar, Scalar};
    use nymcred_ledger::InMemoryLedger;
    use nymcred_zkp::TrapdoorIdentity;
    use rand_core::OsRng;

    use crate::credential::Credential;
    use crate::issuer::CredentialIssuer;
    use crate::prover::ProofProver;
    use crate::schema::{AttributeDecl, AttributeSet};

    struct Fixture {
        issuer: CredentialIssuer,
        alice: TrapdoorIdentity,
        attrs: AttributeSet,
        cred: Credential,
        ledger: InMemoryLedger,
    }

    impl Fixture {
        fn new() -> Self {
            let schema = CredentialSchema::new(
                SchemaId::new("university-id").unwrap(),
                vec![
                    AttributeDecl::string("m1"),
                    AttributeDecl::integer("m2"),
                    AttributeDecl::enumeration("m3", ["student", "staff", "faculty"]),
                ],
            )
            .unwrap();
            let issuer = CredentialIssuer::new(schema, &mut OsRng).unwrap();
            let alice = TrapdoorIdentity::generate(&mut OsRng);
            let ledger = InMemoryLedger::new();
            ledger.add_revocation_authority(issuer.authority_public_key());
            let reg = alice.prove_ownership(&ledger.registration_nonce(), &mut OsRng);
            ledger.register(alice.pseudonym(), &reg).unwrap();

            let attrs: AttributeSet = [("m1", "alice"), ("m2", "22"), ("m3", "student")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            let nonce = issuer.issue_nonce(&mut OsRng);
            let ownership = alice.prove_ownership(&nonce, &mut OsRng);
            let cred = issuer
                .issue(alice.pseudonym(), &attrs, &ownership, &nonce, &mut OsRng)
                .unwrap();
            Self {
                issuer,
                alice,
                attrs,
                cred,
                ledger,
            }
        }

        fn verifier(&self, config: &VerifierConfig) -> ProofVerifier {
            ProofVerifier::new(
                self.issuer.public_key().clone(),
                self.issuer.schema().clone(),
                config,
            )
            .unwrap()
        }

        fn present(&self, disclose: &[&str], nonce: &Nonce) -> Proof {
            ProofProver::new(self.issuer.public_key(), self.issuer.schema())
                .unwrap()
                .present(
                    &self.cred,
                    &self.attrs,
                    disclose.iter().copied(),
                    nonce,
                    self.alice.secret(),
                    &mut OsRng,
                )
                .unwrap()
        }
    }

    fn nonce(s: &str) -> Nonce {
        s.parse().unwrap()
    }

    #[test]
    fn accepts_and_returns_disclosed_attributes() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let proof = fx.present(&["m3"], &nonce("abc123"));
        let verdict = verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap();
        let disclosed = verdict.disclosed().unwrap();
        assert_eq!(disclosed.len(), 1);
        assert_eq!(disclosed["m3"], "student");
    }

    #[test]
    fn replay_is_rejected_after_first_accept() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let proof = fx.present(&["m2"], &nonce("n1"));
        assert!(verifier.verify(&proof, &nonce("n1"), &fx.ledger).unwrap().is_accept());
        assert_eq!(
            verifier.verify(&proof, &nonce("n1"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Replayed)
        );
        // A fresh presentation under the same nonce has a different A'.
        let again = fx.present(&["m2"], &nonce("n1"));
        assert!(verifier.verify(&again, &nonce("n1"), &fx.ledger).unwrap().is_accept());
    }

    #[test]
    fn nonce_mismatch() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let proof = fx.present(&["m3"], &nonce("abc123"));
        assert_eq!(
            verifier.verify(&proof, &nonce("xyz789"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::NonceMismatch)
        );
    }

    #[test]
    fn nonce_is_checked_before_structure() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let mut proof = fx.present(&["m3"], &nonce("abc123"));
        proof.disclosed[0].value = "faculty".into();
        assert_eq!(
            verifier.verify(&proof, &nonce("xyz789"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::NonceMismatch)
        );
        assert_eq!(
            verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Malformed)
        );
    }

    #[test]
    fn relabelled_nonce_fails_the_challenge() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let mut proof = fx.present(&["m3"], &nonce("abc123"));
        proof.nonce = nonce("xyz789");
        assert_eq!(
            verifier.verify(&proof, &nonce("xyz789"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::InvalidProof)
        );
    }

    #[test]
    fn swapped_disclosed_value_is_rejected() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let mut proof = fx.present(&["m3"], &nonce("abc123"));

        // Value changed without the scalar: structure check.
        proof.disclosed[0].value = "faculty".into();
        assert_eq!(
            verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Malformed)
        );

        // Value and scalar changed consistently: challenge no longer matches.
        let decl = fx.issuer.schema().attribute_at(4).unwrap();
        proof.disclosed[0].scalar = decl.encode("faculty").unwrap();
        assert_eq!(
            verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::InvalidProof)
        );
    }

    #[test]
    fn tampered_response_is_a_verification_failure() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let mut proof = fx.present(&["m1"], &nonce("abc123"));
        proof.possession.z_e += Scalar::from(1u64);
        assert_eq!(
            verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::VerificationFailure)
        );
    }

    #[test]
    fn dropped_hidden_response_is_malformed() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let mut proof = fx.present(&["m1"], &nonce("abc123"));
        proof.possession.hidden_responses.remove(&3);
        assert_eq!(
            verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Malformed)
        );
        proof
            .possession
            .hidden_responses
            .insert(3, sample_nonzero_scalar(&mut OsRng));
        proof
            .possession
            .hidden_responses
            .insert(2, sample_nonzero_scalar(&mut OsRng));
        assert_eq!(
            verifier.verify(&proof, &nonce("abc123"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Malformed)
        );
    }

    #[test]
    fn unregistered_and_revoked_pseudonyms() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let proof = fx.present(&["m3"], &nonce("n-1"));

        let empty = InMemoryLedger::new();
        assert_eq!(
            verifier.verify(&proof, &nonce("n-1"), &empty).unwrap(),
            Verdict::Reject(RejectReason::UnknownPseudonym)
        );

        let revocation = fx
            .issuer
            .revocation(fx.ledger.id(), fx.alice.pseudonym())
            .unwrap();
        fx.ledger.revoke(fx.alice.pseudonym(), &revocation).unwrap();
        assert_eq!(
            verifier.verify(&proof, &nonce("n-1"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::RevokedCredential)
        );
        assert!(verifier.replay_cache().is_empty());
    }

    #[test]
    fn ledger_outage_is_an_error_and_not_recorded() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let proof = fx.present(&["m3"], &nonce("n-2"));
        fx.ledger.set_available(false);
        let err = verifier.verify(&proof, &nonce("n-2"), &fx.ledger).unwrap_err();
        assert!(err.is_transient());
        assert!(verifier.replay_cache().is_empty());

        fx.ledger.set_available(true);
        assert!(verifier.verify(&proof, &nonce("n-2"), &fx.ledger).unwrap().is_accept());
    }

    #[test]
    fn policy_requires_value_and_disclosure() {
        let fx = Fixture::new();
        let config = VerifierConfig::default().with_policy(AccessPolicy::requiring("m3", "student"));
        let verifier = fx.verifier(&config);

        let hidden = fx.present(&["m2"], &nonce("p1"));
        assert_eq!(
            verifier.verify(&hidden, &nonce("p1"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::PolicyViolation)
        );
        let shown = fx.present(&["m3"], &nonce("p2"));
        assert!(verifier.verify(&shown, &nonce("p2"), &fx.ledger).unwrap().is_accept());

        let staff_only = fx
            .verifier(&VerifierConfig::default())
            .with_policy(AccessPolicy::requiring("m3", "staff"))
            .unwrap();
        let shown = fx.present(&["m3"], &nonce("p3"));
        assert_eq!(
            staff_only.verify(&shown, &nonce("p3"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::PolicyViolation)
        );
    }

    #[test]
    fn construction_checks_key_schema_and_policy() {
        let fx = Fixture::new();
        let other = CredentialSchema::new(
            SchemaId::new("short").unwrap(),
            vec![AttributeDecl::string("m1")],
        )
        .unwrap();
        assert!(matches!(
            ProofVerifier::new(fx.issuer.public_key().clone(), other, &VerifierConfig::default()),
            Err(ConfigError::SchemaMismatch { .. })
        ));
        let bad_policy = VerifierConfig::default().with_policy(AccessPolicy::requiring("m9", "x"));
        assert!(matches!(
            ProofVerifier::new(
                fx.issuer.public_key().clone(),
                fx.issuer.schema().clone(),
                &bad_policy
            ),
            Err(ConfigError::Policy(_))
        ));
    }

    #[test]
    fn garbage_bytes_are_malformed() {
        let fx = Fixture::new();
        let verifier = fx.verifier(&VerifierConfig::default());
        let proof = fx.present(&["m1"], &nonce("b1"));
        let mut bytes = proof.to_bytes().unwrap();
        assert!(verifier.verify_bytes(&bytes, &nonce("b1"), &fx.ledger).unwrap().is_accept());
        bytes.push(0);
        assert_eq!(
            verifier.verify_bytes(&bytes, &nonce("b1"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Malformed)
        );
        assert_eq!(
            verifier.verify_bytes(&[0x01, 0x02], &nonce("b1"), &fx.ledger).unwrap(),
            Verdict::Reject(RejectReason::Malformed)
        );
    }
}
