//! # nymcred-cli — Command-Line Interface
//!
//! ## Subcommands
//!
//! - `keygen` — generate a BBS+ issuer key pair as hex files
//! - `schema` — print the effective credential schema
//! - `demo` — register a pseudonym, issue a credential, present it and
//!   verify the presentation against an in-memory ledger
//!
//! Argument parsing lives in `main.rs`; each module here exposes an
//! `Args` struct and a `run_*` handler returning the process exit code.

pub mod config;
pub mod demo;
pub mod keygen;
pub mod schema;
