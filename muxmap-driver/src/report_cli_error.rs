// SPDX-License-Identifier: Apache-2.0

use colored::Colorize;
use muxmap::RuleError;

pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let prefix = match subcommand {
        Some(subcommand) => format!("muxmap-driver: {}: ", subcommand),
        None => "muxmap-driver: ".to_string(),
    };
    eprintln!("{}{}", prefix, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key.dimmed(), value);
    }
    std::process::exit(1);
}

/// Reports a rule error, listing the fields it carries as details.
pub fn report_rule_error_and_exit(error: &RuleError, subcommand: Option<&str>) -> ! {
    let details: Vec<(&str, String)> = match error {
        RuleError::PortMismatch { port, kind } => {
            vec![("port", port.clone()), ("kind", kind.to_string())]
        }
        RuleError::FunctionalMismatch(index) => vec![("select index", index.to_string())],
        RuleError::DuplicateArity(arity) | RuleError::NotFound(arity) => {
            vec![("arity", arity.to_string())]
        }
        RuleError::UnboundPort(port) | RuleError::UnknownPort(port) => {
            vec![("port", port.clone())]
        }
        RuleError::Formula { cell, .. } => vec![("cell", cell.clone())],
        RuleError::Io { path, .. } => vec![("path", path.clone())],
        _ => vec![],
    };
    report_cli_error_and_exit(
        &error.to_string(),
        subcommand,
        details.iter().map(|(k, v)| (*k, v.as_str())).collect(),
    )
}
