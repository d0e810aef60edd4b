// SPDX-License-Identifier: Apache-2.0

//! A single mapping rule: primitive signature, cell signature and the port
//! correspondence between them.

use serde::Serialize;

use crate::arity::Arity;
use crate::select_encoder::SelectEncoder;
use crate::signature::{CellSignature, PrimitiveSignature};

/// Wiring from primitive ports to cell ports.
///
/// Cell ports that have no primitive counterpart must be tied to a constant;
/// together `connections` and `ties` are expected to cover every cell port
/// exactly once. That is checked by the validator, not on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortCorrespondence {
    /// `(primitive_port, cell_port)` pairs.
    connections: Vec<(String, String)>,
    /// `(cell_port, value)` pairs.
    ties: Vec<(String, bool)>,
}

impl PortCorrespondence {
    pub fn new() -> Self {
        PortCorrespondence::default()
    }

    pub fn connect(mut self, primitive_port: &str, cell_port: &str) -> Self {
        self.connections
            .push((primitive_port.to_string(), cell_port.to_string()));
        self
    }

    pub fn tie(mut self, cell_port: &str, value: bool) -> Self {
        self.ties.push((cell_port.to_string(), value));
        self
    }

    pub fn connections(&self) -> &[(String, String)] {
        &self.connections
    }

    pub fn ties(&self) -> &[(String, bool)] {
        &self.ties
    }

    pub fn cell_port_for(&self, primitive_port: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|(p, _)| p == primitive_port)
            .map(|(_, c)| c.as_str())
    }

    pub fn primitive_port_for(&self, cell_port: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|(_, c)| c == cell_port)
            .map(|(p, _)| p.as_str())
    }

    pub fn tie_for(&self, cell_port: &str) -> Option<bool> {
        self.ties
            .iter()
            .find(|(c, _)| c == cell_port)
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleEntry {
    primitive: PrimitiveSignature,
    cell: CellSignature,
    correspondence: PortCorrespondence,
}

impl RuleEntry {
    pub fn new(
        primitive: PrimitiveSignature,
        cell: CellSignature,
        correspondence: PortCorrespondence,
    ) -> Self {
        RuleEntry {
            primitive,
            cell,
            correspondence,
        }
    }

    pub fn arity(&self) -> Arity {
        self.primitive.arity()
    }
    pub fn primitive(&self) -> &PrimitiveSignature {
        &self.primitive
    }
    pub fn cell(&self) -> &CellSignature {
        &self.cell
    }
    pub fn correspondence(&self) -> &PortCorrespondence {
        &self.correspondence
    }

    /// Select encoding of the primitive side.
    pub fn encoder(&self) -> SelectEncoder<'_> {
        SelectEncoder::for_primitive(&self.primitive)
    }
}

/// Validation lifecycle of a rule.
///
/// `Unvalidated -> StructurallyValid -> FunctionallyValid`, or `Rejected` at
/// either step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleState {
    Unvalidated,
    StructurallyValid,
    FunctionallyValid,
    Rejected,
}

impl RuleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RuleState::FunctionallyValid | RuleState::Rejected)
    }
}

impl std::fmt::Display for RuleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RuleState::Unvalidated => "unvalidated",
            RuleState::StructurallyValid => "structurally-valid",
            RuleState::FunctionallyValid => "functionally-valid",
            RuleState::Rejected => "rejected",
        };
        write!(f, "{}", s)
    }
}

/// A rule owned by a [`crate::rule_table::RuleTable`] together with the state
/// it reached during validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledRule {
    entry: RuleEntry,
    state: RuleState,
}

impl InstalledRule {
    pub(crate) fn new(entry: RuleEntry, state: RuleState) -> Self {
        InstalledRule { entry, state }
    }

    pub fn entry(&self) -> &RuleEntry {
        &self.entry
    }

    pub fn state(&self) -> RuleState {
        self.state
    }
}

impl std::ops::Deref for InstalledRule {
    type Target = RuleEntry;
    fn deref(&self) -> &RuleEntry {
        &self.entry
    }
}
