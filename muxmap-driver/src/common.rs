// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use clap::ArgMatches;
use muxmap::builtin::builtin_rule_table;
use muxmap::rule_file::load_rule_table;
use muxmap::{Arity, RuleTable, RuleTableOptions};

use crate::mapping_config::{get_require_functional, get_rules_path, MappingConfig};
use crate::report_cli_error::{report_cli_error_and_exit, report_rule_error_and_exit};

/// Builds the rule table named by `--rules` / the config, or the built-in
/// table when neither names one. Exits with a CLI error on failure.
pub fn load_table(
    matches: &ArgMatches,
    config: &Option<MappingConfig>,
    subcommand: &str,
) -> RuleTable {
    let options = RuleTableOptions {
        require_functional: get_require_functional(matches, config),
    };
    let result = match get_rules_path(matches, config) {
        Some(path) => load_rule_table(Path::new(&path), options),
        None => {
            log::info!("no rule file given; using the built-in rule table");
            builtin_rule_table()
        }
    };
    match result {
        Ok(table) => table,
        Err(e) => report_rule_error_and_exit(&e, Some(subcommand)),
    }
}

/// Parses the `--arity` flag (number of data inputs).
pub fn get_arity(matches: &ArgMatches, subcommand: &str) -> Arity {
    let text = matches
        .get_one::<String>("arity")
        .expect("arity is required");
    match text.parse::<Arity>() {
        Ok(arity) => arity,
        Err(e) => report_cli_error_and_exit(
            &e.to_string(),
            Some(subcommand),
            vec![("arity", text.as_str())],
        ),
    }
}

pub fn get_bool_flag(matches: &ArgMatches, name: &str) -> bool {
    matches
        .get_one::<String>(name)
        .map(|s| s == "true")
        .unwrap_or(false)
}
