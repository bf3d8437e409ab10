//! # Keygen Subcommand
//!
//! Generates a BBS+ issuer key pair and writes it as two hex files:
//! `{prefix}.key` (secret) and `{prefix}.pub` (public).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use nymcred_crypto::{keygen, NYM_SLOT};
use rand_core::OsRng;

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Number of attribute slots; the pseudonym slot is added on top.
    #[arg(long)]
    pub slots: usize,
    /// Output directory for the key files.
    #[arg(long, short, default_value = ".")]
    pub out: PathBuf,
    /// Prefix for the key filenames.
    #[arg(long, default_value = "issuer")]
    pub prefix: String,
}

pub fn run_keygen(args: &KeygenArgs) -> Result<u8> {
    cmd_keygen(&args.out, &args.prefix, args.slots)
}

fn cmd_keygen(output_dir: &Path, prefix: &str, attribute_slots: usize) -> Result<u8> {
    let keypair = keygen(attribute_slots + NYM_SLOT, &mut OsRng)
        .with_context(|| format!("cannot generate a key for {attribute_slots} attributes"))?;

    std::fs::create_dir_all(output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            output_dir.display()
        )
    })?;

    let sk_path = output_dir.join(format!("{prefix}.key"));
    let pk_path = output_dir.join(format!("{prefix}.pub"));
    let pk_hex = keypair.public().to_hex();

    std::fs::write(&sk_path, keypair.secret().to_hex().as_bytes())
        .with_context(|| format!("failed to write secret key: {}", sk_path.display()))?;
    std::fs::write(&pk_path, &pk_hex)
        .with_context(|| format!("failed to write public key: {}", pk_path.display()))?;

    tracing::info!(
        slots = keypair.slot_count(),
        fingerprint = %keypair.public().fingerprint(),
        "issuer key generated"
    );
    println!("OK: generated BBS+ issuer key ({} slots)", keypair.slot_count());
    println!("  Secret key:  {}", sk_path.display());
    println!("  Public key:  {}", pk_path.display());
    println!("  Fingerprint: {}", keypair.public().fingerprint());

    Ok(0)
}
