// SPDX-License-Identifier: Apache-2.0

//! Verilog emission of rules as Yosys techmap modules, and of mapped
//! instances as cell instantiations.

use std::fmt::Write;

use crate::rule::{RuleEntry, RuleState};
use crate::rule_table::RuleTable;
use crate::signature::PortRole;
use crate::substitute::{CellInstantiation, Signal};

/// Verilog identifier for `name`, escaped when it is not a simple identifier.
fn verilog_ident(name: &str) -> String {
    let simple = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false)
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        name.to_string()
    } else {
        format!("\\{} ", name)
    }
}

fn tie_literal(value: bool) -> &'static str {
    if value {
        "1'b1"
    } else {
        "1'b0"
    }
}

/// Emits one techmap module replacing the rule's primitive with its cell.
pub fn emit_rule(entry: &RuleEntry) -> String {
    let prim = entry.primitive();
    let cell = entry.cell();
    let corr = entry.correspondence();
    let mut out = String::new();

    let port_names: Vec<String> = prim
        .ports()
        .iter()
        .map(|(name, _)| verilog_ident(name))
        .collect();
    let _ = writeln!(
        out,
        "module {}({});",
        verilog_ident(prim.name()),
        port_names.join(", ")
    );
    for (name, role) in prim.ports() {
        let dir = match role {
            PortRole::Output => "output",
            _ => "input",
        };
        let _ = writeln!(out, "  {} {};", dir, verilog_ident(name));
    }
    out.push('\n');

    let _ = writeln!(out, "  {} _TECHMAP_REPLACE_ (", verilog_ident(cell.cell_type()));
    let cell_ports = cell.ports();
    let last = cell_ports.len().saturating_sub(1);
    for (i, (cell_port, _)) in cell_ports.iter().enumerate() {
        let driver = match corr.tie_for(cell_port) {
            Some(value) => tie_literal(value).to_string(),
            None => corr
                .primitive_port_for(cell_port)
                .map(verilog_ident)
                .unwrap_or_default(),
        };
        let sep = if i == last { "" } else { "," };
        let _ = writeln!(out, "    .{}({}){}", verilog_ident(cell_port), driver, sep);
    }
    out.push_str("  );\nendmodule\n");
    out
}

/// Emits a techmap file with one module per rule in `table`.
///
/// Only functionally validated rules are emitted unless `include_unproven`
/// is set.
pub fn emit_table(table: &RuleTable, include_unproven: bool) -> String {
    let mut out = String::new();
    for rule in table.iter() {
        if rule.state() != RuleState::FunctionallyValid && !include_unproven {
            log::warn!(
                "skipping techmap for {}: rule is {}",
                rule.primitive().name(),
                rule.state()
            );
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "// {} -> {} (arity {})",
            rule.primitive().name(),
            rule.cell().cell_type(),
            rule.arity()
        );
        out.push_str(&emit_rule(rule.entry()));
    }
    out
}

/// Emits a cell instantiation statement named `instance_name`.
pub fn emit_instance(inst: &CellInstantiation, instance_name: &str) -> String {
    let conns: Vec<String> = inst
        .connections
        .iter()
        .map(|(port, signal)| {
            let expr = match signal {
                Signal::Net(net) => verilog_ident(net),
                Signal::Const(value) => tie_literal(*value).to_string(),
            };
            format!(".{}({})", verilog_ident(port), expr)
        })
        .collect();
    format!(
        "{} {} ({});",
        verilog_ident(&inst.cell_type),
        verilog_ident(instance_name),
        conns.join(", ")
    )
}
