// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use muxmap::RuleError;
use serde_json::json;

use crate::common::{get_arity, get_bool_flag, load_table};
use crate::mapping_config::MappingConfig;
use crate::report_cli_error::{report_cli_error_and_exit, report_rule_error_and_exit};

const SUBCOMMAND: &str = "lookup";

pub fn handle_lookup(matches: &ArgMatches, config: &Option<MappingConfig>) {
    let table = load_table(matches, config, SUBCOMMAND);
    let arity = get_arity(matches, SUBCOMMAND);
    let json_output = get_bool_flag(matches, "json");

    let rule = match table.lookup(arity) {
        Ok(rule) => rule,
        Err(RuleError::NotFound(_)) => {
            if json_output {
                println!("{}", json!({ "arity": arity.data_inputs(), "rule": null }));
            } else {
                println!("arity {}: no rule; primitive is left abstract", arity);
            }
            return;
        }
        Err(e) => report_rule_error_and_exit(&e, Some(SUBCOMMAND)),
    };

    if json_output {
        match serde_json::to_string_pretty(rule) {
            Ok(text) => println!("{}", text),
            Err(e) => report_cli_error_and_exit(&e.to_string(), Some(SUBCOMMAND), vec![]),
        }
        return;
    }

    println!(
        "{} -> {} (arity {}, {})",
        rule.primitive().name(),
        rule.cell().cell_type(),
        arity,
        rule.state()
    );
    for (prim_port, cell_port) in rule.correspondence().connections() {
        println!("  {} -> {}", prim_port, cell_port);
    }
    for (cell_port, value) in rule.correspondence().ties() {
        println!("  {} = {}", cell_port, if *value { 1 } else { 0 });
    }
}
