// SPDX-License-Identifier: Apache-2.0

//! Generic construction of mux primitives and mux rules for any arity, and
//! the stock rule table.
//!
//! Primitive names and ports follow the Yosys internal cell library:
//! `$_MUX_` (A, B, S), `$_MUX4_` (A..D, S, T), `$_MUX8_` (A..H, S, T, U),
//! `$_MUX16_` (A..P, S, T, U, V), all with output `Y`.

use crate::arity::Arity;
use crate::cell_library::{letter_names, CellLibrary};
use crate::error::{RuleError, RuleResult};
use crate::rule::{PortCorrespondence, RuleEntry};
use crate::rule_table::{RuleTable, RuleTableOptions};
use crate::signature::{CellSignature, PrimitiveSignature, SelectPort};

/// Arity and target cell of each stock rule.
pub const BUILTIN_RULES: &[(usize, &str)] = &[(2, "mux4x0"), (4, "mux4x0"), (8, "mux8x0")];

pub fn primitive_name(arity: Arity) -> String {
    if arity.data_inputs() == 2 {
        "$_MUX_".to_string()
    } else {
        format!("$_MUX{}_", arity.data_inputs())
    }
}

fn select_names(width: u32) -> Vec<String> {
    const LETTERS: [&str; 4] = ["S", "T", "U", "V"];
    if width as usize <= LETTERS.len() {
        LETTERS[..width as usize]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        (0..width).map(|i| format!("S{}", i)).collect()
    }
}

/// The abstract mux primitive of the given arity, with positional select bits.
pub fn mux_primitive(arity: Arity) -> RuleResult<PrimitiveSignature> {
    let selects = select_names(arity.select_width())
        .iter()
        .enumerate()
        .map(|(bit, name)| SelectPort::new(name, bit as u32))
        .collect();
    PrimitiveSignature::new(
        &primitive_name(arity),
        letter_names(arity.data_inputs(), "D"),
        selects,
        "Y",
    )
}

/// Rule mapping the arity-`arity` primitive onto `cell`.
///
/// Data input `i` drives cell data pin `i` and the select with bit `b` drives
/// the cell select with bit `b`. When the cell is wider, the surplus data and
/// select pins are tied low, so the low half of the cell is always selected.
pub fn mux_rule(arity: Arity, cell: &CellSignature) -> RuleResult<RuleEntry> {
    if cell.arity() < arity {
        return Err(RuleError::MalformedEntry(format!(
            "cell '{}' has arity {}, too narrow for a mux of arity {}",
            cell.cell_type(),
            cell.arity(),
            arity
        )));
    }
    let primitive = mux_primitive(arity)?;
    let mut corr = PortCorrespondence::new();

    for (i, cell_pin) in cell.data_inputs().iter().enumerate() {
        corr = match primitive.data_inputs().get(i) {
            Some(prim_pin) => corr.connect(prim_pin, cell_pin),
            None => corr.tie(cell_pin, false),
        };
    }
    for cell_select in cell.selects() {
        let driver = primitive
            .selects()
            .iter()
            .find(|s| s.bit == cell_select.bit);
        corr = match driver {
            Some(prim_select) => corr.connect(&prim_select.name, &cell_select.name),
            None => corr.tie(&cell_select.name, false),
        };
    }
    corr = corr.connect(primitive.output(), cell.output());

    Ok(RuleEntry::new(primitive, cell.clone(), corr))
}

/// Rule table with the stock rules, all functionally validated.
pub fn builtin_rule_table() -> RuleResult<RuleTable> {
    let lib = CellLibrary::builtin()?;
    let mut table = RuleTable::with_options(RuleTableOptions {
        require_functional: true,
    });
    for (count, cell_type) in BUILTIN_RULES {
        let arity = Arity::from_data_inputs(*count)?;
        let cell = lib.get(cell_type).ok_or_else(|| {
            RuleError::MalformedEntry(format!("built-in cell '{}' is missing", cell_type))
        })?;
        table.register(mux_rule(arity, cell)?)?;
    }
    Ok(table)
}
