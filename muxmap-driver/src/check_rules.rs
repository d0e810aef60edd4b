// SPDX-License-Identifier: Apache-2.0

//! `check-rules`: validates every rule in a rule file (or the built-in rules)
//! and reports the state each one reaches.

use std::path::Path;

use clap::ArgMatches;
use colored::Colorize;
use muxmap::builtin::builtin_rule_table;
use muxmap::cell_library::CellLibrary;
use muxmap::rule_file::RuleFile;
use muxmap::{RuleEntry, RuleState, RuleTable, RuleTableOptions, Validator};
use serde_json::json;

use crate::common::get_bool_flag;
use crate::mapping_config::{get_require_functional, get_rules_path, MappingConfig};
use crate::report_cli_error::{report_cli_error_and_exit, report_rule_error_and_exit};

const SUBCOMMAND: &str = "check-rules";

fn load_entries(path: &str) -> anyhow::Result<Vec<RuleEntry>> {
    let file = RuleFile::from_path(Path::new(path))?;
    let builtin = CellLibrary::builtin()?;
    Ok(file.to_entries(&builtin)?)
}

pub fn handle_check_rules(matches: &ArgMatches, config: &Option<MappingConfig>) {
    let require_functional = get_require_functional(matches, config);
    let json_output = get_bool_flag(matches, "json");

    let entries: Vec<RuleEntry> = match get_rules_path(matches, config) {
        Some(path) => match load_entries(&path) {
            Ok(entries) => entries,
            Err(e) => report_cli_error_and_exit(
                &format!("could not load rules: {:#}", e),
                Some(SUBCOMMAND),
                vec![("rules", path.as_str())],
            ),
        },
        None => match builtin_rule_table() {
            Ok(table) => table.iter().map(|r| r.entry().clone()).collect(),
            Err(e) => report_rule_error_and_exit(&e, Some(SUBCOMMAND)),
        },
    };

    let validator = Validator::new();
    let mut table = RuleTable::with_options(RuleTableOptions { require_functional });
    let mut failures = 0usize;
    let mut records = Vec::new();
    for entry in entries {
        let report = validator.validate(&entry);
        let label = format!(
            "{} -> {} (arity {})",
            entry.primitive().name(),
            entry.cell().cell_type(),
            entry.arity()
        );
        let primitive = entry.primitive().name().to_string();
        let cell = entry.cell().cell_type().to_string();
        let arity = entry.arity().data_inputs();

        // Registration adds the table-level checks (duplicate arity, strict
        // functional requirement) on top of the per-rule report.
        let (state, error) = match table.register(entry) {
            Ok(state) => (state, None),
            Err(e) => (RuleState::Rejected, Some(report.error.unwrap_or(e))),
        };
        if state == RuleState::Rejected {
            failures += 1;
        }

        if json_output {
            records.push(json!({
                "primitive": primitive,
                "cell": cell,
                "arity": arity,
                "state": state.to_string(),
                "error": error.as_ref().map(|e| e.to_string()),
            }));
        } else {
            let state_str = match state {
                RuleState::FunctionallyValid => state.to_string().green(),
                RuleState::Rejected => state.to_string().red().bold(),
                _ => state.to_string().yellow(),
            };
            match &error {
                Some(e) => println!("{}: {}: {}", label, state_str, e),
                None => println!("{}: {}", label, state_str),
            }
        }
    }

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
        );
    }
    if failures > 0 {
        report_cli_error_and_exit(
            &format!("{} rule(s) rejected", failures),
            Some(SUBCOMMAND),
            vec![],
        );
    }
}
