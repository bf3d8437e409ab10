//! # Presentations
//!
//! [`ProofProver`] turns a credential into a [`Proof`] that discloses a
//! chosen subset of attributes and hides the rest. The pseudonym is always
//! disclosed; the proof also shows control of its trapdoor, so a stolen
//! credential cannot be presented without the holder's secret.

use std::collections::BTreeMap;

use nymcred_core::Nonce;
use nymcred_crypto::{IssuerPublicKey, Scalar};
use nymcred_zkp::{prove_possession, PossessionStatement, TrapdoorSecret};
use rand_core::{CryptoRng, RngCore};

use crate::credential::Credential;
use crate::error::{PresentError, SchemaError};
use crate::proof::{presentation_context, DisclosedAttribute, Proof};
use crate::schema::{AttributeSet, CredentialSchema};

#[derive(Debug, Clone, Copy)]
pub struct ProofProver<'a> {
    issuer: &'a IssuerPublicKey,
    schema: &'a CredentialSchema,
}

impl<'a> ProofProver<'a> {
    pub fn new(
        issuer: &'a IssuerPublicKey,
        schema: &'a CredentialSchema,
    ) -> Result<Self, PresentError> {
        if issuer.slot_count() != schema.slot_count() {
            return Err(SchemaError::InvalidSchema(format!(
                "schema {} has {} slots, issuer key has {}",
                schema.id(),
                schema.slot_count(),
                issuer.slot_count()
            ))
            .into());
        }
        Ok(Self { issuer, schema })
    }

    /// Present `credential`, disclosing the attributes named in
    /// `disclosure` and binding the proof to `nonce`.
    ///
    /// # Errors
    ///
    /// - `UnknownAttribute` if a disclosure name is not in the schema;
    /// - `InvalidCredential` if the credential does not verify for the
    ///   trapdoor's pseudonym and `attributes` (nothing is proven about an
    ///   invalid credential).
    pub fn present<R, I, S>(
        &self,
        credential: &Credential,
        attributes: &AttributeSet,
        disclosure: I,
        nonce: &Nonce,
        trapdoor: &TrapdoorSecret,
        rng: &mut R,
    ) -> Result<Proof, PresentError>
    where
        R: RngCore + CryptoRng,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let nym = trapdoor.pseudonym();
        let messages = self.schema.message_vector(&nym, attributes)?;

        let mut disclosed = BTreeMap::new();
        for name in disclosure {
            let name = name.as_ref();
            let slot = self.schema.slot_of(name)?;
            disclosed.insert(slot, name.to_string());
        }

        credential
            .verify(self.issuer, self.schema, &nym, attributes)
            .map_err(PresentError::InvalidCredential)?;

        let disclosed: Vec<DisclosedAttribute> = disclosed
            .into_iter()
            .map(|(slot, name)| {
                let value = attributes
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| SchemaError::MissingAttribute(name.clone()))?;
                Ok(DisclosedAttribute {
                    slot,
                    scalar: messages[slot - 1],
                    name,
                    value,
                })
            })
            .collect::<Result<_, SchemaError>>()?;

        let scalars: BTreeMap<usize, Scalar> = disclosed.iter().map(|d| (d.slot, d.scalar)).collect();
        let context = presentation_context(self.schema.id(), &disclosed)?;
        let statement = PossessionStatement {
            issuer: self.issuer,
            nym: &nym,
            disclosed: &scalars,
            nonce,
            context: &context,
        };
        let possession =
            prove_possession(&statement, credential.signature(), &messages, trapdoor, rng)?;

        tracing::debug!(
            schema = %self.schema.id(),
            disclosed = disclosed.len(),
            hidden = possession.hidden_responses.len(),
            "presentation built"
        );
        Ok(Proof {
            nym,
            possession,
            disclosed,
            nonce: nonce.clone(),
        })
    }
}
