//! # nymcred CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nymcred_cli::config::NymcredConfig;
use nymcred_cli::demo::{run_demo, DemoArgs};
use nymcred_cli::keygen::{run_keygen, KeygenArgs};
use nymcred_cli::schema::{run_schema, SchemaArgs};

/// nymcred — pseudonymous attribute credentials.
///
/// Generates BBS+ issuer keys, inspects credential schemas, and runs the
/// register / issue / present / verify flow end to end.
#[derive(Parser, Debug)]
#[command(name = "nymcred", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit log events as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a BBS+ issuer key pair.
    Keygen(KeygenArgs),

    /// Print the effective credential schema.
    Schema(SchemaArgs),

    /// Run registration, issuance, presentation and verification in-process.
    Demo(DemoArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    tracing::debug!("nymcred CLI starting");

    let result = match &cli.command {
        Commands::Keygen(args) => run_keygen(args),
        Commands::Schema(args) => {
            NymcredConfig::load(cli.config.as_deref()).and_then(|cfg| run_schema(args, &cfg))
        }
        Commands::Demo(args) => {
            NymcredConfig::load(cli.config.as_deref()).and_then(|cfg| run_demo(args, &cfg))
        }
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
