// SPDX-License-Identifier: Apache-2.0

//! Technology-mapping rules for abstract multiplexer primitives.
//!
//! A rule maps an arity-`2^n` mux primitive (data inputs, `n` select inputs,
//! one output) onto a concrete target cell through an explicit port
//! correspondence. Rules are validated structurally and, when the cell's
//! boolean function is known, functionally for every select index before a
//! [`rule_table::RuleTable`] will hold them.

pub mod arity;
pub mod builtin;
pub mod cell_formula;
pub mod cell_library;
pub mod error;
pub mod rule;
pub mod rule_file;
pub mod rule_table;
pub mod select_encoder;
pub mod signature;
pub mod substitute;
pub mod techmap;
pub mod validate;

pub use arity::Arity;
pub use error::{PortMismatchKind, RuleError, RuleResult};
pub use rule::{InstalledRule, PortCorrespondence, RuleEntry, RuleState};
pub use rule_table::{RuleTable, RuleTableOptions, SharedRuleTable};
pub use select_encoder::SelectEncoder;
pub use signature::{CellSignature, PortRole, PrimitiveSignature, SelectPort};
pub use validate::{ValidationReport, Validator};
