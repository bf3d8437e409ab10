//! # Credential Issuance
//!
//! [`CredentialIssuer`] owns a BBS+ key pair sized to its schema and an
//! Ed25519 revocation-authority key.
//!
//! Plain issuance sees every attribute value. Blind issuance signs over a
//! holder commitment to the values the issuer must not learn (see
//! [`crate::holder`]). Both verify the holder's proof of pseudonym
//! ownership against a nonce the issuer chose, and neither touches the
//! ledger: registering the pseudonym first is the caller's job.

use nymcred_core::{LedgerId, Nonce};
use nymcred_crypto::{
    keygen, sign, sign_committed, BlindSignature, Ed25519KeyPair, Ed25519PublicKey,
    IssuerKeyPair, IssuerPublicKey, Pseudonym, Scalar, NYM_SLOT,
};
use nymcred_ledger::{Revocation, RevocationStatement};
use nymcred_zkp::{verify_commitment, verify_ownership, OwnershipProof};
use rand_core::{CryptoRng, RngCore};

use crate::credential::Credential;
use crate::error::{IssueError, SchemaError};
use crate::holder::BlindIssuanceRequest;
use crate::schema::{AttributeSet, CredentialSchema};

pub struct CredentialIssuer {
    keypair: IssuerKeyPair,
    schema: CredentialSchema,
    authority: Ed25519KeyPair,
}

impl std::fmt::Debug for CredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialIssuer")
            .field("schema", self.schema.id())
            .field("public_key", &self.keypair.public().fingerprint())
            .field("authority", &self.authority.public_key())
            .finish_non_exhaustive()
    }
}

impl CredentialIssuer {
    /// Generate fresh issuer and authority keys for `schema`.
    pub fn new<R: RngCore + CryptoRng>(
        schema: CredentialSchema,
        rng: &mut R,
    ) -> Result<Self, IssueError> {
        let keypair = keygen(schema.slot_count(), rng)?;
        let authority = Ed25519KeyPair::generate(rng);
        Ok(Self {
            keypair,
            schema,
            authority,
        })
    }

    /// Assemble an issuer from existing keys.
    ///
    /// # Errors
    ///
    /// `InvalidSchema` if the key's slot count differs from the schema's.
    pub fn from_keys(
        schema: CredentialSchema,
        keypair: IssuerKeyPair,
        authority: Ed25519KeyPair,
    ) -> Result<Self, IssueError> {
        if keypair.slot_count() != schema.slot_count() {
            return Err(SchemaError::InvalidSchema(format!(
                "schema {} needs {} slots, key has {}",
                schema.id(),
                schema.slot_count(),
                keypair.slot_count()
            ))
            .into());
        }
        Ok(Self {
            keypair,
            schema,
            authority,
        })
    }

    pub fn public_key(&self) -> &IssuerPublicKey {
        self.keypair.public()
    }

    pub fn schema(&self) -> &CredentialSchema {
        &self.schema
    }

    pub fn authority_public_key(&self) -> Ed25519PublicKey {
        self.authority.public_key()
    }

    /// A fresh nonce for the holder's ownership (and commitment) proof.
    pub fn issue_nonce<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Nonce {
        Nonce::random(rng)
    }

    /// Issue a credential over `nym` and `attributes`.
    ///
    /// All-or-nothing: the signature is verified before it is returned.
    pub fn issue<R: RngCore + CryptoRng>(
        &self,
        nym: &Pseudonym,
        attributes: &AttributeSet,
        ownership: &OwnershipProof,
        nonce: &Nonce,
        rng: &mut R,
    ) -> Result<Credential, IssueError> {
        if let Err(e) = verify_ownership(nym, ownership, nonce) {
            tracing::warn!(schema = %self.schema.id(), nym = %nym, "issuance refused: invalid ownership proof");
            return Err(IssueError::InvalidOwnershipProof(e));
        }
        let messages = self.schema.message_vector(nym, attributes)?;
        let credential = Credential::from_signature(sign(&self.keypair, &messages, rng)?);
        credential
            .verify(self.public_key(), &self.schema, nym, attributes)
            .map_err(IssueError::SelfCheck)?;
        tracing::info!(schema = %self.schema.id(), nym = %nym, "credential issued");
        Ok(credential)
    }

    /// Sign over a holder commitment plus the attribute values the issuer
    /// knows. `known` must cover exactly the attributes not committed.
    pub fn issue_blind<R: RngCore + CryptoRng>(
        &self,
        request: &BlindIssuanceRequest,
        known: &AttributeSet,
        nonce: &Nonce,
        rng: &mut R,
    ) -> Result<BlindSignature, IssueError> {
        let nym = &request.nym;
        if let Err(e) = verify_ownership(nym, &request.ownership, nonce) {
            tracing::warn!(schema = %self.schema.id(), nym = %nym, "blind issuance refused: invalid ownership proof");
            return Err(IssueError::InvalidOwnershipProof(e));
        }
        if let Err(e) = verify_commitment(self.public_key(), &request.commitment, nym, nonce) {
            tracing::warn!(schema = %self.schema.id(), nym = %nym, "blind issuance refused: invalid commitment proof");
            return Err(IssueError::InvalidCommitmentProof(e));
        }

        let committed = &request.commitment.slots;
        let mut signed: Vec<(usize, Scalar)> = vec![(NYM_SLOT, nym.message_scalar())];
        if let Some(extra) = known
            .keys()
            .find(|name| self.schema.slot_of(name).is_err())
        {
            return Err(SchemaError::UnmappedAttribute(extra.clone()).into());
        }
        for (i, decl) in self.schema.attributes().iter().enumerate() {
            let slot = i + NYM_SLOT + 1;
            match (committed.contains(&slot), known.get(&decl.name)) {
                (true, None) => {}
                (true, Some(_)) => {
                    return Err(SchemaError::InvalidAttributeEncoding {
                        name: decl.name.clone(),
                        reason: "value is committed by the holder".into(),
                    }
                    .into())
                }
                (false, Some(value)) => signed.push((slot, decl.encode(value)?)),
                (false, None) => return Err(SchemaError::MissingAttribute(decl.name.clone()).into()),
            }
        }

        let signature = sign_committed(&self.keypair, &request.commitment.commitment, &signed, rng)?;
        tracing::info!(
            schema = %self.schema.id(),
            nym = %nym,
            blind_slots = committed.len(),
            "blind credential issued"
        );
        Ok(signature)
    }

    /// Sign a revocation of `nym` on `ledger` with the authority key.
    pub fn revocation(&self, ledger: LedgerId, nym: &Pseudonym) -> Result<Revocation, IssueError> {
        let revocation = Revocation::sign(&self.authority, &RevocationStatement::new(ledger, *nym))?;
        tracing::info!(ledger = %ledger, nym = %nym, "revocation signed");
        Ok(revocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nymcred_core::SchemaId;
    use nymcred_zkp::TrapdoorIdentity;
    use rand_core::OsRng;

    use crate::schema::AttributeDecl;

    fn schema() -> CredentialSchema {
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

    fn alice_attrs() -> AttributeSet {
        [("m1", "alice"), ("m2", "22"), ("m3", "student")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn issue_produces_verifying_credential() {
        let issuer = CredentialIssuer::new(schema(), &mut OsRng).unwrap();
        let alice = TrapdoorIdentity::generate(&mut OsRng);
        let nonce = issuer.issue_nonce(&mut OsRng);
        let proof = alice.prove_ownership(&nonce, &mut OsRng);
        let cred = issuer
            .issue(alice.pseudonym(), &alice_attrs(), &proof, &nonce, &mut OsRng)
            .unwrap();
        cred.verify(issuer.public_key(), issuer.schema(), alice.pseudonym(), &alice_attrs())
            .unwrap();
    }

    #[test]
    fn ownership_proof_must_match_issuer_nonce() {
        let issuer = CredentialIssuer::new(schema(), &mut OsRng).unwrap();
        let alice = TrapdoorIdentity::generate(&mut OsRng);
        let proof = alice.prove_ownership(&issuer.issue_nonce(&mut OsRng), &mut OsRng);
        let other_nonce = issuer.issue_nonce(&mut OsRng);
        assert!(matches!(
            issuer.issue(alice.pseudonym(), &alice_attrs(), &proof, &other_nonce, &mut OsRng),
            Err(IssueError::InvalidOwnershipProof(_))
        ));
    }

    #[test]
    fn schema_errors_surface() {
        let issuer = CredentialIssuer::new(schema(), &mut OsRng).unwrap();
        let alice = TrapdoorIdentity::generate(&mut OsRng);
        let nonce = issuer.issue_nonce(&mut OsRng);
        let proof = alice.prove_ownership(&nonce, &mut OsRng);

        let mut bad = alice_attrs();
        bad.insert("m3".into(), "janitor".into());
        assert!(matches!(
            issuer.issue(alice.pseudonym(), &bad, &proof, &nonce, &mut OsRng),
            Err(IssueError::Schema(SchemaError::InvalidAttributeEncoding { .. }))
        ));

        let mut extra = alice_attrs();
        extra.insert("m4".into(), "x".into());
        assert!(matches!(
            issuer.issue(alice.pseudonym(), &extra, &proof, &nonce, &mut OsRng),
            Err(IssueError::Schema(SchemaError::UnmappedAttribute(_)))
        ));

        let mut missing = alice_attrs();
        missing.remove("m1");
        assert!(matches!(
            issuer.issue(alice.pseudonym(), &missing, &proof, &nonce, &mut OsRng),
            Err(IssueError::Schema(SchemaError::MissingAttribute(_)))
        ));
    }

    #[test]
    fn from_keys_checks_slot_count() {
        let kp = keygen(2, &mut OsRng).unwrap();
        let authority = Ed25519KeyPair::generate(&mut OsRng);
        assert!(matches!(
            CredentialIssuer::from_keys(schema(), kp, authority),
            Err(IssueError::Schema(SchemaError::InvalidSchema(_)))
        ));
    }

    #[test]
    fn debug_does_not_leak_keys() {
        let issuer = CredentialIssuer::new(schema(), &mut OsRng).unwrap();
        let shown = format!("{issuer:?}");
        assert!(shown.contains("university-id"));
        assert!(!shown.contains(issuer.keypair.secret().to_hex().as_str()));
    }
}
