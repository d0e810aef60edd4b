// SPDX-License-Identifier: Apache-2.0

//! `map-instance`: maps a single primitive instance described on the command
//! line and prints the resulting cell instantiation.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use muxmap::substitute::{map_instance, MapOutcome, MappingRequest, Signal};
use muxmap::techmap::emit_instance;

use crate::common::{get_arity, get_bool_flag, load_table};
use crate::mapping_config::MappingConfig;
use crate::report_cli_error::report_cli_error_and_exit;

const SUBCOMMAND: &str = "map-instance";

fn parse_signal(text: &str) -> Signal {
    match text {
        "0" | "1'b0" => Signal::Const(false),
        "1" | "1'b1" => Signal::Const(true),
        net => Signal::net(net),
    }
}

/// Parses `PORT=signal,PORT=signal,...`.
fn parse_bindings(text: &str) -> anyhow::Result<BTreeMap<String, Signal>> {
    let mut bindings = BTreeMap::new();
    for item in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (port, signal) = item
            .split_once('=')
            .ok_or_else(|| anyhow!("binding '{}' is not of the form PORT=SIGNAL", item))?;
        let (port, signal) = (port.trim(), signal.trim());
        if port.is_empty() || signal.is_empty() {
            return Err(anyhow!("binding '{}' has an empty port or signal", item));
        }
        if bindings
            .insert(port.to_string(), parse_signal(signal))
            .is_some()
        {
            return Err(anyhow!("port '{}' is bound more than once", port));
        }
    }
    Ok(bindings)
}

fn run(matches: &ArgMatches, config: &Option<MappingConfig>) -> anyhow::Result<()> {
    let table = load_table(matches, config, SUBCOMMAND);
    let arity = get_arity(matches, SUBCOMMAND);
    let bind_text = matches
        .get_one::<String>("bind")
        .expect("bind is required");
    let bindings = parse_bindings(bind_text).context("parsing --bind")?;
    let request = MappingRequest { arity, bindings };

    let include_unproven = get_bool_flag(matches, "include_unproven");
    let outcome = map_instance(&table, &request, include_unproven)
        .with_context(|| format!("mapping arity-{} primitive instance", arity))?;
    if get_bool_flag(matches, "json") {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match outcome {
        MapOutcome::Mapped(inst) => {
            let name = matches
                .get_one::<String>("instance_name")
                .map(|s| s.as_str())
                .unwrap_or("u_mux");
            println!("{}", emit_instance(&inst, name));
        }
        MapOutcome::LeftAbstract => {
            println!(
                "arity {}: no functionally validated rule; primitive is left abstract",
                arity
            );
        }
    }
    Ok(())
}

pub fn handle_map_instance(matches: &ArgMatches, config: &Option<MappingConfig>) {
    if let Err(e) = run(matches, config) {
        report_cli_error_and_exit(&format!("{:#}", e), Some(SUBCOMMAND), vec![]);
    }
}
