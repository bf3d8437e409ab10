//! Shared fixtures: the university-id schema and a registered holder with
//! an issued credential.

#![allow(dead_code)]

use nymcred_core::{Nonce, SchemaId};
use nymcred_ledger::{IdentityLedger, InMemoryLedger};
use nymcred_vc::{
    AttributeDecl, AttributeSet, Credential, CredentialIssuer, CredentialSchema, Proof, ProofProver,
    ProofVerifier, VerifierConfig,
};
use nymcred_zkp::TrapdoorIdentity;
use rand_core::OsRng;

pub fn university_schema() -> CredentialSchema {
    CredentialSchema::new(
        SchemaId::new("university-id").unwrap(),
        vec![
            AttributeDecl::string("m1"),
            AttributeDecl::integer("m2"),
            AttributeDecl::enumeration("m3", ["student", "staff", "faculty"]),
        ],
    )
    .unwrap()
}

pub fn attrs(pairs: &[(&str, &str)]) -> AttributeSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn alice_attrs() -> AttributeSet {
    attrs(&[("m1", "alice"), ("m2", "22"), ("m3", "student")])
}

pub fn nonce(text: &str) -> Nonce {
    text.parse().unwrap()
}

/// Register `holder` on `ledger`.
pub fn register(ledger: &InMemoryLedger, holder: &TrapdoorIdentity) {
    let proof = holder.prove_ownership(&ledger.registration_nonce(), &mut OsRng);
    ledger.register(holder.pseudonym(), &proof).unwrap();
}

/// Issue a credential to `holder` over `attributes`.
pub fn issue(issuer: &CredentialIssuer, holder: &TrapdoorIdentity, attributes: &AttributeSet) -> Credential {
    let n = issuer.issue_nonce(&mut OsRng);
    let ownership = holder.prove_ownership(&n, &mut OsRng);
    issuer
        .issue(holder.pseudonym(), attributes, &ownership, &n, &mut OsRng)
        .unwrap()
}

/// Issuer, ledger (with the issuer as revocation authority) and a
/// registered holder carrying a credential.
pub struct World {
    pub issuer: CredentialIssuer,
    pub ledger: InMemoryLedger,
    pub holder: TrapdoorIdentity,
    pub attributes: AttributeSet,
    pub credential: Credential,
}

impl World {
    pub fn new() -> Self {
        Self::with_attributes(alice_attrs())
    }

    pub fn with_attributes(attributes: AttributeSet) -> Self {
        let issuer = CredentialIssuer::new(university_schema(), &mut OsRng).unwrap();
        let ledger = InMemoryLedger::new();
        ledger.add_revocation_authority(issuer.authority_public_key());
        let holder = TrapdoorIdentity::generate(&mut OsRng);
        register(&ledger, &holder);
        let credential = issue(&issuer, &holder, &attributes);
        Self {
            issuer,
            ledger,
            holder,
            attributes,
            credential,
        }
    }

    pub fn verifier(&self) -> ProofVerifier {
        self.verifier_with(&VerifierConfig::default())
    }

    pub fn verifier_with(&self, config: &VerifierConfig) -> ProofVerifier {
        ProofVerifier::new(
            self.issuer.public_key().clone(),
            self.issuer.schema().clone(),
            config,
        )
        .unwrap()
    }

    pub fn present(&self, disclose: &[&str], nonce: &Nonce) -> Proof {
        ProofProver::new(self.issuer.public_key(), self.issuer.schema())
            .unwrap()
            .present(
                &self.credential,
                &self.attributes,
                disclose.iter().copied(),
                nonce,
                self.holder.secret(),
                &mut OsRng,
            )
            .unwrap()
    }
}
