//! # Demo Subcommand
//!
//! Runs the whole protocol in-process against an [`InMemoryLedger`]:
//!
//! 1. the holder registers a fresh pseudonym and the block is sealed;
//! 2. the issuer checks the holder's ownership proof and issues a
//!    credential over the configured attributes;
//! 3. the holder presents it, disclosing the chosen attributes;
//! 4. the verifier checks the presentation, then the same bytes again
//!    (a replay);
//! 5. with `--revoke`, the issuer revokes the pseudonym and a fresh
//!    presentation is checked once more.
//!
//! The report is printed as JSON. Exit code 0 when the first
//! presentation is accepted, 2 otherwise.

use anyhow::{Context, Result};
use clap::Args;
use nymcred_core::{LedgerId, Nonce, TxId};
use nymcred_crypto::Pseudonym;
use nymcred_ledger::{Block, ChainInfo, IdentityLedger, InMemoryLedger, TxReceipt};
use nymcred_vc::{
    CredentialIssuer, DisclosedAttributes, ProofProver, ProofVerifier, Verdict,
};
use nymcred_zkp::TrapdoorIdentity;
use rand_core::OsRng;
use serde::Serialize;

use crate::config::NymcredConfig;

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Attribute to disclose; repeat for several. Overrides `demo.disclose`.
    #[arg(long = "disclose", value_name = "NAME")]
    pub disclose: Vec<String>,
    /// Presentation nonce text. Overrides `demo.nonce`.
    #[arg(long)]
    pub nonce: Option<String>,
    /// Revoke the pseudonym afterwards and verify once more.
    #[arg(long)]
    pub revoke: bool,
}

#[derive(Debug, Serialize)]
pub struct VerdictReport {
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclosed: Option<DisclosedAttributes>,
}

impl From<&Verdict> for VerdictReport {
    fn from(verdict: &Verdict) -> Self {
        Self {
            accepted: verdict.is_accept(),
            reason: verdict.reject_reason().map(|r| r.code()),
            disclosed: verdict.disclosed().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub schema: String,
    pub issuer_fingerprint: String,
    pub ledger: LedgerId,
    pub nym: Pseudonym,
    pub registration: TxReceipt,
    pub registration_block: Option<Block>,
    pub registration_included: bool,
    pub credential: String,
    pub nonce: Nonce,
    pub proof_bytes: usize,
    pub verification: VerdictReport,
    pub replay: VerdictReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation: Option<TxId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_revocation: Option<VerdictReport>,
    pub chain: ChainInfo,
}

pub fn run_demo(args: &DemoArgs, config: &NymcredConfig) -> Result<u8> {
    let report = run_scenario(args, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.verification.accepted { 0 } else { 2 })
}

pub fn run_scenario(args: &DemoArgs, config: &NymcredConfig) -> Result<DemoReport> {
    let schema = config.schema()?;
    let attributes = &config.demo.attributes;
    let disclose: &[String] = if args.disclose.is_empty() {
        &config.demo.disclose
    } else {
        &args.disclose
    };

    let issuer = CredentialIssuer::new(schema, &mut OsRng)?;
    let ledger = InMemoryLedger::new();
    ledger.add_revocation_authority(issuer.authority_public_key());

    let holder = TrapdoorIdentity::generate(&mut OsRng);
    let registration_proof = holder.prove_ownership(&ledger.registration_nonce(), &mut OsRng);
    let registration = ledger
        .register(holder.pseudonym(), &registration_proof)
        .context("pseudonym registration failed")?;
    let registration_block = ledger.seal_block()?;
    let inclusion = ledger.inclusion_proof(&registration.txid)?;
    let registration_included = ledger.verify_inclusion(&inclusion);

    let issue_nonce = issuer.issue_nonce(&mut OsRng);
    let ownership = holder.prove_ownership(&issue_nonce, &mut OsRng);
    let credential = issuer
        .issue(holder.pseudonym(), attributes, &ownership, &issue_nonce, &mut OsRng)
        .context("issuance failed")?;

    let verifier = ProofVerifier::new(
        issuer.public_key().clone(),
        issuer.schema().clone(),
        &config.verifier_config()?,
    )?;
    let nonce = match args.nonce.as_ref().or(config.demo.nonce.as_ref()) {
        Some(text) => text.parse::<Nonce>()?,
        None => verifier.issue_nonce(&mut OsRng),
    };

    let prover = ProofProver::new(issuer.public_key(), issuer.schema())?;
    let proof = prover
        .present(&credential, attributes, disclose, &nonce, holder.secret(), &mut OsRng)
        .context("presentation failed")?;
    let proof_bytes = proof.to_bytes()?;

    let verification = verifier.verify_bytes(&proof_bytes, &nonce, &ledger)?;
    let replay = verifier.verify_bytes(&proof_bytes, &nonce, &ledger)?;

    let (revocation, after_revocation) = if args.revoke {
        let signed = issuer.revocation(ledger.id(), holder.pseudonym())?;
        let receipt = ledger.revoke(holder.pseudonym(), &signed)?;
        ledger.seal_block()?;
        let fresh = verifier.issue_nonce(&mut OsRng);
        let proof = prover.present(&credential, attributes, disclose, &fresh, holder.secret(), &mut OsRng)?;
        let verdict = verifier.verify(&proof, &fresh, &ledger)?;
        (Some(receipt.txid), Some(VerdictReport::from(&verdict)))
    } else {
        (None, None)
    };

    Ok(DemoReport {
        schema: issuer.schema().id().to_string(),
        issuer_fingerprint: issuer.public_key().fingerprint(),
        ledger: ledger.id(),
        nym: *holder.pseudonym(),
        registration,
        registration_block,
        registration_included,
        credential: credential.to_hex(),
        nonce,
        proof_bytes: proof_bytes.len(),
        verification: VerdictReport::from(&verification),
        replay: VerdictReport::from(&replay),
        revocation,
        after_revocation,
        chain: ledger.chain_info(),
    })
}
