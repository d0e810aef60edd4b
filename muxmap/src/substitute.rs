// SPDX-License-Identifier: Apache-2.0

//! Applying a rule to one primitive instance: turns the instance's port
//! bindings into a concrete cell instantiation request.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arity::Arity;
use crate::error::{RuleError, RuleResult};
use crate::rule::{RuleEntry, RuleState};
use crate::rule_table::RuleTable;

/// What a port is connected to in the host netlist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    Net(String),
    Const(bool),
}

impl Signal {
    pub fn net(name: &str) -> Self {
        Signal::Net(name.to_string())
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Net(name) => write!(f, "{}", name),
            Signal::Const(v) => write!(f, "1'b{}", if *v { 1 } else { 0 }),
        }
    }
}

/// A primitive instance found by the mapping pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
    pub arity: Arity,
    /// Primitive port name to the signal bound to it.
    pub bindings: BTreeMap<String, Signal>,
}

/// Concrete cell to instantiate in place of the primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellInstantiation {
    pub cell_type: String,
    /// One entry per cell port, in the cell's declaration order.
    pub connections: Vec<(String, Signal)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MapOutcome {
    Mapped(CellInstantiation),
    /// No rule for the arity; the primitive stays in the netlist as is.
    LeftAbstract,
}

/// Builds the cell instantiation for `request` under `entry`.
pub fn instantiate(entry: &RuleEntry, request: &MappingRequest) -> RuleResult<CellInstantiation> {
    let prim = entry.primitive();
    if let Some(unknown) = request
        .bindings
        .keys()
        .find(|port| prim.role_of(port).is_none())
    {
        return Err(RuleError::UnknownPort(unknown.clone()));
    }

    let corr = entry.correspondence();
    let mut connections = Vec::new();
    for (cell_port, _) in entry.cell().ports() {
        let signal = if let Some(value) = corr.tie_for(cell_port) {
            Signal::Const(value)
        } else {
            let prim_port = corr.primitive_port_for(cell_port).ok_or_else(|| {
                RuleError::MalformedEntry(format!(
                    "cell port '{}' of '{}' is not connected",
                    cell_port,
                    entry.cell().cell_type()
                ))
            })?;
            request
                .bindings
                .get(prim_port)
                .cloned()
                .ok_or_else(|| RuleError::UnboundPort(prim_port.to_string()))?
        };
        connections.push((cell_port.to_string(), signal));
    }
    Ok(CellInstantiation {
        cell_type: entry.cell().cell_type().to_string(),
        connections,
    })
}

/// Looks up the rule for the request's arity and applies it.
///
/// A missing rule is not an error: the outcome is `LeftAbstract`. Rules that
/// were not functionally validated are treated the same way unless
/// `include_unproven` is set.
pub fn map_instance(
    table: &RuleTable,
    request: &MappingRequest,
    include_unproven: bool,
) -> RuleResult<MapOutcome> {
    match table.lookup(request.arity) {
        Ok(rule) if rule.state() != RuleState::FunctionallyValid && !include_unproven => {
            log::warn!(
                "rule {} -> {} is {}; leaving primitive abstract",
                rule.primitive().name(),
                rule.cell().cell_type(),
                rule.state()
            );
            Ok(MapOutcome::LeftAbstract)
        }
        Ok(rule) => Ok(MapOutcome::Mapped(instantiate(rule.entry(), request)?)),
        Err(RuleError::NotFound(arity)) => {
            log::debug!("no rule for arity {}; leaving primitive abstract", arity);
            Ok(MapOutcome::LeftAbstract)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_rule_table;
    use maplit::btreemap;

    fn arity(n: usize) -> Arity {
        Arity::from_data_inputs(n).unwrap()
    }

    #[test]
    fn test_mux2_instantiation_ties_unused_pins() {
        let table = builtin_rule_table().unwrap();
        let request = MappingRequest {
            arity: arity(2),
            bindings: btreemap! {
                "A".to_string() => Signal::net("a"),
                "B".to_string() => Signal::net("b"),
                "S".to_string() => Signal::net("sel"),
                "Y".to_string() => Signal::net("y"),
            },
        };
        let MapOutcome::Mapped(inst) = map_instance(&table, &request, false).unwrap() else {
            panic!("expected a mapped instance");
        };
        assert_eq!(inst.cell_type, "mux4x0");
        assert_eq!(
            inst.connections,
            vec![
                ("A".to_string(), Signal::net("a")),
                ("B".to_string(), Signal::net("b")),
                ("C".to_string(), Signal::Const(false)),
                ("D".to_string(), Signal::Const(false)),
                ("S0".to_string(), Signal::net("sel")),
                ("S1".to_string(), Signal::Const(false)),
                ("Q".to_string(), Signal::net("y")),
            ]
        );
    }

    #[test]
    fn test_unregistered_arity_left_abstract() {
        let table = builtin_rule_table().unwrap();
        let request = MappingRequest {
            arity: arity(16),
            bindings: BTreeMap::new(),
        };
        assert_eq!(
            map_instance(&table, &request, false).unwrap(),
            MapOutcome::LeftAbstract
        );
    }

    #[test]
    fn test_unbound_and_unknown_ports() {
        let table = builtin_rule_table().unwrap();
        let mut request = MappingRequest {
            arity: arity(2),
            bindings: btreemap! {
                "A".to_string() => Signal::net("a"),
                "S".to_string() => Signal::net("sel"),
                "Y".to_string() => Signal::net("y"),
            },
        };
        assert_eq!(
            map_instance(&table, &request, false),
            Err(RuleError::UnboundPort("B".to_string()))
        );

        request
            .bindings
            .insert("Z".to_string(), Signal::Const(true));
        assert_eq!(
            map_instance(&table, &request, false),
            Err(RuleError::UnknownPort("Z".to_string()))
        );
    }

    #[test]
    fn test_unproven_rule_left_abstract_unless_included() {
        use crate::rule::PortCorrespondence;
        use crate::rule_table::RuleTableOptions;
        use crate::signature::{names, positional_selects, CellSignature};

        // No function, so the rule can only reach StructurallyValid.
        let cell = CellSignature::new(
            "opaque4",
            names(&["I0", "I1", "I2", "I3"]),
            positional_selects(&["S0", "S1"]),
            "Z",
            None,
        )
        .unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "I0")
            .connect("B", "I1")
            .connect("C", "I2")
            .connect("D", "I3")
            .connect("S", "S0")
            .connect("T", "S1")
            .connect("Y", "Z");
        let entry = RuleEntry::new(
            crate::builtin::mux_primitive(arity(4)).unwrap(),
            cell,
            corr,
        );
        let mut table = RuleTable::with_options(RuleTableOptions {
            require_functional: false,
        });
        assert_eq!(table.register(entry), Ok(RuleState::StructurallyValid));

        let request = MappingRequest {
            arity: arity(4),
            bindings: btreemap! {
                "A".to_string() => Signal::net("a"),
                "B".to_string() => Signal::net("b"),
                "C".to_string() => Signal::net("c"),
                "D".to_string() => Signal::net("d"),
                "S".to_string() => Signal::net("s"),
                "T".to_string() => Signal::net("t"),
                "Y".to_string() => Signal::net("y"),
            },
        };
        assert_eq!(
            map_instance(&table, &request, false).unwrap(),
            MapOutcome::LeftAbstract
        );
        let MapOutcome::Mapped(inst) = map_instance(&table, &request, true).unwrap() else {
            panic!("expected a mapped instance when unproven rules are included");
        };
        assert_eq!(inst.cell_type, "opaque4");
        assert_eq!(inst.connections[4], ("S0".to_string(), Signal::net("s")));
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::net("n1").to_string(), "n1");
        assert_eq!(Signal::Const(true).to_string(), "1'b1");
    }
}
