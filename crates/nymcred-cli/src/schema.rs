//! # Schema Subcommand
//!
//! Prints the effective credential schema with its slot layout.

use anyhow::Result;
use clap::Args;
use nymcred_crypto::NYM_SLOT;
use nymcred_vc::{AttributeKind, CredentialSchema};
use serde::Serialize;

use crate::config::NymcredConfig;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Print YAML instead of JSON.
    #[arg(long)]
    pub yaml: bool,
}

#[derive(Debug, Serialize)]
pub struct SchemaReport {
    pub schema: CredentialSchema,
    pub slot_count: usize,
    pub slots: Vec<SlotEntry>,
}

#[derive(Debug, Serialize)]
pub struct SlotEntry {
    pub slot: usize,
    pub name: String,
    pub kind: &'static str,
}

impl SchemaReport {
    pub fn new(schema: CredentialSchema) -> Self {
        let mut slots = vec![SlotEntry {
            slot: NYM_SLOT,
            name: "nym".to_string(),
            kind: "pseudonym",
        }];
        slots.extend(schema.attributes().iter().enumerate().map(|(i, decl)| SlotEntry {
            slot: NYM_SLOT + 1 + i,
            name: decl.name.clone(),
            kind: match decl.kind {
                AttributeKind::Integer => "integer",
                AttributeKind::String => "string",
                AttributeKind::Enum { .. } => "enum",
            },
        }));
        Self {
            slot_count: schema.slot_count(),
            schema,
            slots,
        }
    }
}

pub fn run_schema(args: &SchemaArgs, config: &NymcredConfig) -> Result<u8> {
    let report = SchemaReport::new(config.schema()?);
    if args.yaml {
        print!("{}", serde_yaml::to_string(&report)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_slots_in_order() {
        let report = SchemaReport::new(crate::config::default_schema().unwrap());
        assert_eq!(report.slot_count, 4);
        let names: Vec<&str> = report.slots.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["nym", "m1", "m2", "m3"]);
        assert_eq!(report.slots[3].slot, 4);
        assert_eq!(report.slots[3].kind, "enum");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["schema"]["id"], "university-id");
        assert_eq!(json["schema"]["attributes"][2]["variants"][0], "student");
    }

    #[test]
    fn run_schema_succeeds_for_default_config() {
        let args = SchemaArgs { yaml: true };
        assert_eq!(run_schema(&args, &NymcredConfig::default()).unwrap(), 0);
    }
}
