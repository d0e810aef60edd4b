// SPDX-License-Identifier: Apache-2.0

//! Command line driver for the mux mapping rule table.
//!
//! Commands are given like:
//!
//! ```text
//! muxmap-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - check-rules: Validates every rule and reports the state it reaches.
//! - lookup: Shows the rule registered for an arity.
//! - select-index: Shows which data input a select pattern chooses.
//! - emit-techmap: Writes the rule table as Yosys techmap Verilog.
//! - map-instance: Maps one primitive instance to a cell instantiation.
//! - dump-rules: Writes the active rule table as a TOML or JSON rule file.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- check-rules --rules=muxmap/rules/mux_rules.toml
//! $ cargo run -- select-index --arity=8 --select=1,0,1
//! $ cargo run -- map-instance --arity=2 --bind=A=a,B=b,S=sel,Y=y
//! ```

mod check_rules;
mod common;
mod dump_rules;
mod emit_techmap;
mod lookup;
mod map_instance;
mod mapping_config;
mod report_cli_error;
mod select_index;

use clap::{Arg, ArgAction};
use report_cli_error::report_cli_error_and_exit;
use serde::Deserialize;

use crate::mapping_config::MappingConfig;

const DEFAULT_CONFIG_FILE: &str = "muxmap.toml";

#[derive(Deserialize)]
struct MuxmapToml {
    mapping: MappingConfig,
}

trait AppExt {
    fn add_rules_args(self) -> Self;
    fn add_arity_arg(self) -> Self;
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self;
}

impl AppExt for clap::Command {
    fn add_rules_args(self) -> Self {
        (self as clap::Command)
            .arg(
                Arg::new("rules")
                    .long("rules")
                    .value_name("RULES_FILE")
                    .help("Rule file (TOML, or JSON by extension) to use instead of the built-in rules")
                    .action(ArgAction::Set),
            )
            .add_bool_arg(
                "require_functional",
                "Reject rules whose cell has no output function (default true)",
            )
    }

    fn add_arity_arg(self) -> Self {
        (self as clap::Command).arg(
            Arg::new("arity")
                .long("arity")
                .value_name("DATA_INPUTS")
                .help("Number of data inputs of the mux primitive")
                .required(true)
                .action(ArgAction::Set),
        )
    }

    /// Adds a boolean argument taking an explicit `true` / `false` value.
    fn add_bool_arg(self, long: &'static str, help: &'static str) -> Self {
        (self as clap::Command).arg(
            Arg::new(long)
                .long(long)
                .value_name("BOOL")
                .action(ArgAction::Set)
                .value_parser(["true", "false"])
                .num_args(1)
                .help(help),
        )
    }
}

fn load_config(path: Option<String>) -> Option<MappingConfig> {
    let path = path.or_else(|| {
        let cwd = std::env::current_dir().ok()?;
        let cwd_toml_path = cwd.join(DEFAULT_CONFIG_FILE);
        if cwd_toml_path.exists() {
            log::info!(
                "Using {} in current directory: {}",
                DEFAULT_CONFIG_FILE,
                cwd_toml_path.display()
            );
            Some(cwd_toml_path.display().to_string())
        } else {
            None
        }
    })?;

    let toml_str = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => report_cli_error_and_exit(
            &format!("could not read config file: {}", e),
            None,
            vec![("path", path.as_str())],
        ),
    };
    match toml::from_str::<MuxmapToml>(&toml_str) {
        Ok(config) => Some(config.mapping),
        Err(e) => report_cli_error_and_exit(
            &format!("could not parse config file: {}", e),
            None,
            vec![("path", path.as_str())],
        ),
    }
}

fn main() {
    let _ = env_logger::try_init();

    log::info!(
        "muxmap-driver starting; version: {}",
        env!("CARGO_PKG_VERSION")
    );

    let matches = clap::Command::new("muxmap-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Command line driver for mux-to-cell mapping rules")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to a muxmap.toml file")
                .action(ArgAction::Set),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("check-rules")
                .about("Validates every rule and reports its state")
                .add_rules_args()
                .add_bool_arg("json", "Print the reports as JSON"),
        )
        .subcommand(
            clap::Command::new("lookup")
                .about("Shows the rule registered for an arity")
                .add_rules_args()
                .add_arity_arg()
                .add_bool_arg("json", "Print the rule as JSON"),
        )
        .subcommand(
            clap::Command::new("select-index")
                .about("Shows which data input a select pattern chooses")
                .add_rules_args()
                .add_arity_arg()
                .arg(
                    Arg::new("select")
                        .long("select")
                        .value_name("BITS")
                        .help("Comma-separated select values, in the primitive's declared select order")
                        .required(true)
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            clap::Command::new("emit-techmap")
                .about("Writes the rule table as Yosys techmap Verilog")
                .add_rules_args()
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_name("OUTPUT_PATH")
                        .help("File to write instead of stdout")
                        .action(ArgAction::Set),
                )
                .add_bool_arg(
                    "include_unproven",
                    "Also emit rules that were not functionally validated",
                ),
        )
        .subcommand(
            clap::Command::new("map-instance")
                .about("Maps one primitive instance to a cell instantiation")
                .add_rules_args()
                .add_arity_arg()
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .value_name("PORT=SIGNAL,...")
                        .help("Port bindings of the instance; 0/1/1'b0/1'b1 are constants")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("instance_name")
                        .long("instance_name")
                        .value_name("NAME")
                        .help("Instance name in the emitted Verilog (default u_mux)")
                        .action(ArgAction::Set),
                )
                .add_bool_arg(
                    "include_unproven",
                    "Also apply rules that were not functionally validated",
                )
                .add_bool_arg("json", "Print the mapping outcome as JSON"),
        )
        .subcommand(
            clap::Command::new("dump-rules")
                .about("Writes the active rule table as a rule file")
                .add_rules_args()
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_name("FORMAT")
                        .value_parser(["toml", "json"])
                        .default_value("toml")
                        .action(ArgAction::Set),
                ),
        )
        .get_matches();

    let config = load_config(matches.get_one::<String>("config").map(|s| s.to_string()));

    if let Some(matches) = matches.subcommand_matches("check-rules") {
        check_rules::handle_check_rules(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("lookup") {
        lookup::handle_lookup(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("select-index") {
        select_index::handle_select_index(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("emit-techmap") {
        emit_techmap::handle_emit_techmap(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("map-instance") {
        map_instance::handle_map_instance(matches, &config);
    } else if let Some(matches) = matches.subcommand_matches("dump-rules") {
        dump_rules::handle_dump_rules(matches, &config);
    } else if let Some(_matches) = matches.subcommand_matches("version") {
        println!("{}", env!("CARGO_PKG_VERSION"));
    } else {
        report_cli_error_and_exit("No valid subcommand provided.", None, vec![]);
    }
}
