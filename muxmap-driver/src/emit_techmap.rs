// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use muxmap::techmap::emit_table;

use crate::common::{get_bool_flag, load_table};
use crate::mapping_config::MappingConfig;
use crate::report_cli_error::report_cli_error_and_exit;

const SUBCOMMAND: &str = "emit-techmap";

pub fn handle_emit_techmap(matches: &ArgMatches, config: &Option<MappingConfig>) {
    let table = load_table(matches, config, SUBCOMMAND);
    let include_unproven = get_bool_flag(matches, "include_unproven");
    let text = emit_table(&table, include_unproven);

    match matches.get_one::<String>("output") {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &text) {
                report_cli_error_and_exit(
                    &format!("could not write techmap: {}", e),
                    Some(SUBCOMMAND),
                    vec![("output", path.as_str())],
                );
            }
            log::info!("wrote techmap for {} rule(s) to {}", table.len(), path);
        }
        None => print!("{}", text),
    }
}
