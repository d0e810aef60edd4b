// SPDX-License-Identifier: Apache-2.0

//! Port signatures of the abstract mux primitive and of the concrete cell it
//! is mapped onto.
//!
//! Both sides declare ordered data inputs, select inputs and a single output.
//! Each select input carries an explicit `bit` giving its weight in the
//! select index, so reordering the declaration never silently permutes the
//! function.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::arity::Arity;
use crate::error::{RuleError, RuleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PortRole {
    Data,
    Select,
    Output,
}

impl std::fmt::Display for PortRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PortRole::Data => "data",
            PortRole::Select => "select",
            PortRole::Output => "output",
        };
        write!(f, "{}", s)
    }
}

/// A select input and its bit position in the select index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectPort {
    pub name: String,
    pub bit: u32,
}

impl SelectPort {
    pub fn new(name: &str, bit: u32) -> Self {
        SelectPort {
            name: name.to_string(),
            bit,
        }
    }
}

/// Assigns bits by declaration order: the first select is the LSB.
pub fn positional_selects(names: &[&str]) -> Vec<SelectPort> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| SelectPort::new(name, i as u32))
        .collect()
}

/// Checks the invariants shared by both signature kinds and returns the
/// implied arity.
fn check_mux_ports(
    what: &str,
    name: &str,
    data_inputs: &[String],
    selects: &[SelectPort],
    output: &str,
) -> RuleResult<Arity> {
    if name.is_empty() {
        return Err(RuleError::MalformedEntry(format!("{} has an empty name", what)));
    }
    if selects.is_empty() {
        return Err(RuleError::MalformedEntry(format!(
            "{} '{}' declares no select inputs",
            what, name
        )));
    }
    let arity = Arity::from_select_width(selects.len() as u32).map_err(|_| {
        RuleError::MalformedEntry(format!(
            "{} '{}' declares too many select inputs ({})",
            what,
            name,
            selects.len()
        ))
    })?;
    if data_inputs.len() != arity.data_inputs() {
        return Err(RuleError::MalformedEntry(format!(
            "{} '{}' has {} data inputs but {} select inputs; expected {} data inputs",
            what,
            name,
            data_inputs.len(),
            selects.len(),
            arity.data_inputs()
        )));
    }

    let mut seen_bits = vec![false; selects.len()];
    for select in selects {
        let slot = seen_bits.get_mut(select.bit as usize).ok_or_else(|| {
            RuleError::MalformedEntry(format!(
                "{} '{}' select '{}' has bit {} outside 0..{}",
                what,
                name,
                select.name,
                select.bit,
                selects.len()
            ))
        })?;
        if *slot {
            return Err(RuleError::MalformedEntry(format!(
                "{} '{}' assigns select bit {} more than once",
                what, name, select.bit
            )));
        }
        *slot = true;
    }

    let mut names: HashSet<&str> = HashSet::new();
    let all = data_inputs
        .iter()
        .map(|s| s.as_str())
        .chain(selects.iter().map(|s| s.name.as_str()))
        .chain(std::iter::once(output));
    for port in all {
        if port.is_empty() {
            return Err(RuleError::MalformedEntry(format!(
                "{} '{}' has an empty port name",
                what, name
            )));
        }
        if !names.insert(port) {
            return Err(RuleError::MalformedEntry(format!(
                "{} '{}' declares port '{}' more than once",
                what, name, port
            )));
        }
    }
    Ok(arity)
}

/// Abstract, technology-independent mux primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimitiveSignature {
    name: String,
    data_inputs: Vec<String>,
    selects: Vec<SelectPort>,
    output: String,
    #[serde(skip)]
    arity: Arity,
}

impl PrimitiveSignature {
    pub fn new(
        name: &str,
        data_inputs: Vec<String>,
        selects: Vec<SelectPort>,
        output: &str,
    ) -> RuleResult<Self> {
        let arity = check_mux_ports("primitive", name, &data_inputs, &selects, output)?;
        Ok(PrimitiveSignature {
            name: name.to_string(),
            data_inputs,
            selects,
            output: output.to_string(),
            arity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn arity(&self) -> Arity {
        self.arity
    }
    pub fn data_inputs(&self) -> &[String] {
        &self.data_inputs
    }
    pub fn selects(&self) -> &[SelectPort] {
        &self.selects
    }
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn role_of(&self, port: &str) -> Option<PortRole> {
        role_of(&self.data_inputs, &self.selects, &self.output, port)
    }

    /// All ports in declaration order: data, selects, output.
    pub fn ports(&self) -> Vec<(&str, PortRole)> {
        ports(&self.data_inputs, &self.selects, &self.output)
    }
}

/// Concrete target-technology cell.
///
/// `function` is the boolean function of the output pin in Liberty syntax,
/// when the behavioral model is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSignature {
    cell_type: String,
    data_inputs: Vec<String>,
    selects: Vec<SelectPort>,
    output: String,
    function: Option<String>,
    #[serde(skip)]
    arity: Arity,
}

impl CellSignature {
    pub fn new(
        cell_type: &str,
        data_inputs: Vec<String>,
        selects: Vec<SelectPort>,
        output: &str,
        function: Option<String>,
    ) -> RuleResult<Self> {
        let arity = check_mux_ports("cell", cell_type, &data_inputs, &selects, output)?;
        Ok(CellSignature {
            cell_type: cell_type.to_string(),
            data_inputs,
            selects,
            output: output.to_string(),
            function,
            arity,
        })
    }

    pub fn cell_type(&self) -> &str {
        &self.cell_type
    }
    pub fn arity(&self) -> Arity {
        self.arity
    }
    pub fn data_inputs(&self) -> &[String] {
        &self.data_inputs
    }
    pub fn selects(&self) -> &[SelectPort] {
        &self.selects
    }
    pub fn output(&self) -> &str {
        &self.output
    }
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn role_of(&self, port: &str) -> Option<PortRole> {
        role_of(&self.data_inputs, &self.selects, &self.output, port)
    }

    /// All ports in declaration order: data, selects, output.
    pub fn ports(&self) -> Vec<(&str, PortRole)> {
        ports(&self.data_inputs, &self.selects, &self.output)
    }
}

fn role_of(data: &[String], selects: &[SelectPort], output: &str, port: &str) -> Option<PortRole> {
    if data.iter().any(|d| d == port) {
        Some(PortRole::Data)
    } else if selects.iter().any(|s| s.name == port) {
        Some(PortRole::Select)
    } else if output == port {
        Some(PortRole::Output)
    } else {
        None
    }
}

fn ports<'a>(
    data: &'a [String],
    selects: &'a [SelectPort],
    output: &'a str,
) -> Vec<(&'a str, PortRole)> {
    data.iter()
        .map(|d| (d.as_str(), PortRole::Data))
        .chain(selects.iter().map(|s| (s.name.as_str(), PortRole::Select)))
        .chain(std::iter::once((output, PortRole::Output)))
        .collect()
}

#[cfg(test)]
pub(crate) fn names(ports: &[&str]) -> Vec<String> {
    ports.iter().map(|s| s.to_string()).collect()
}
