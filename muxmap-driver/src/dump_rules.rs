// SPDX-License-Identifier: Apache-2.0

//! `dump-rules`: writes the active rule table back out as a rule file.

use clap::ArgMatches;
use muxmap::rule_file::RuleFile;

use crate::common::load_table;
use crate::mapping_config::MappingConfig;
use crate::report_cli_error::report_rule_error_and_exit;

const SUBCOMMAND: &str = "dump-rules";

pub fn handle_dump_rules(matches: &ArgMatches, config: &Option<MappingConfig>) {
    let table = load_table(matches, config, SUBCOMMAND);
    let file = RuleFile::from_entries(table.iter().map(|rule| rule.entry()));
    let format = matches
        .get_one::<String>("format")
        .map(|s| s.as_str())
        .unwrap_or("toml");
    let text = match format {
        "json" => file.to_json_string(),
        _ => file.to_toml_string(),
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => report_rule_error_and_exit(&e, Some(SUBCOMMAND)),
    }
}
