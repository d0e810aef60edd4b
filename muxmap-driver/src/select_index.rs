// SPDX-License-Identifier: Apache-2.0

//! `select-index`: shows which data input a select pattern chooses under the
//! rule for an arity.

use clap::ArgMatches;

use crate::common::{get_arity, load_table};
use crate::mapping_config::MappingConfig;
use crate::report_cli_error::{report_cli_error_and_exit, report_rule_error_and_exit};

const SUBCOMMAND: &str = "select-index";

fn parse_select_values(text: &str) -> Result<Vec<bool>, String> {
    text.split(',')
        .map(|s| match s.trim() {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(format!("select value '{}' is not 0 or 1", other)),
        })
        .collect()
}

pub fn handle_select_index(matches: &ArgMatches, config: &Option<MappingConfig>) {
    let table = load_table(matches, config, SUBCOMMAND);
    let arity = get_arity(matches, SUBCOMMAND);
    let select_text = matches
        .get_one::<String>("select")
        .expect("select is required");

    let values = match parse_select_values(select_text) {
        Ok(values) => values,
        Err(e) => report_cli_error_and_exit(&e, Some(SUBCOMMAND), vec![("select", select_text)]),
    };
    let rule = match table.lookup(arity) {
        Ok(rule) => rule,
        Err(e) => report_rule_error_and_exit(&e, Some(SUBCOMMAND)),
    };
    let encoder = rule.encoder();
    let selected = encoder
        .encode(&values)
        .and_then(|index| encoder.decode(index).map(|port| (index, port)));
    match selected {
        Ok((index, port)) => println!("index {} selects {}", index, port),
        Err(e) => report_rule_error_and_exit(&e, Some(SUBCOMMAND)),
    }
}
