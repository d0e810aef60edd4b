// SPDX-License-Identifier: Apache-2.0

//! Named concrete cell definitions that rules can target.
//!
//! The built-in library carries `mux2x0`, `mux4x0` and `mux8x0`: data pins
//! `A`, `B`, ..., selects `S0..Sn-1` (S0 is the LSB) and output `Q`, each
//! with a sum-of-products output function usable as a behavioral model.

use std::collections::BTreeMap;

use crate::arity::Arity;
use crate::error::{RuleError, RuleResult};
use crate::select_encoder::SelectEncoder;
use crate::signature::{CellSignature, SelectPort};

#[derive(Debug, Clone, Default)]
pub struct CellLibrary {
    cells: BTreeMap<String, CellSignature>,
}

impl CellLibrary {
    pub fn new() -> Self {
        CellLibrary::default()
    }

    /// Library holding the stock mux cells.
    pub fn builtin() -> RuleResult<Self> {
        let mut lib = CellLibrary::new();
        for (name, width) in [("mux2x0", 1), ("mux4x0", 2), ("mux8x0", 3)] {
            lib.add(mux_cell(name, Arity::from_select_width(width)?)?)?;
        }
        Ok(lib)
    }

    /// Adds a cell; a second cell with the same type name is rejected.
    pub fn add(&mut self, cell: CellSignature) -> RuleResult<()> {
        if self.cells.contains_key(cell.cell_type()) {
            return Err(RuleError::MalformedEntry(format!(
                "cell '{}' is defined more than once",
                cell.cell_type()
            )));
        }
        log::debug!("cell library: adding {}", cell.cell_type());
        self.cells.insert(cell.cell_type().to_string(), cell);
        Ok(())
    }

    pub fn get(&self, cell_type: &str) -> Option<&CellSignature> {
        self.cells.get(cell_type)
    }

    pub fn cells(&self) -> impl Iterator<Item = &CellSignature> {
        self.cells.values()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Names `A`, `B`, ... for up to 26 ports, `<prefix>0`, `<prefix>1`, ...
/// beyond that.
pub(crate) fn letter_names(count: usize, prefix: &str) -> Vec<String> {
    if count <= 26 {
        (0..count)
            .map(|i| ((b'A' + i as u8) as char).to_string())
            .collect()
    } else {
        (0..count).map(|i| format!("{}{}", prefix, i)).collect()
    }
}

/// Builds a mux cell of the given arity with its sum-of-products function.
pub fn mux_cell(cell_type: &str, arity: Arity) -> RuleResult<CellSignature> {
    let data = letter_names(arity.data_inputs(), "D");
    let selects: Vec<SelectPort> = (0..arity.select_width())
        .map(|b| SelectPort::new(&format!("S{}", b), b))
        .collect();
    // Signature without a function first, so the encoder can derive the
    // select pattern of each product term.
    let shape = CellSignature::new(cell_type, data.clone(), selects.clone(), "Q", None)?;
    let encoder = SelectEncoder::for_cell(&shape);
    let mut products = Vec::with_capacity(arity.data_inputs());
    for (index, pin) in data.iter().enumerate() {
        let pattern = encoder.decode_select_pattern(index)?;
        let literals: Vec<String> = selects
            .iter()
            .zip(pattern)
            .map(|(s, v)| {
                if v {
                    s.name.clone()
                } else {
                    format!("!{}", s.name)
                }
            })
            .collect();
        products.push(format!("({}*{})", pin, literals.join("*")));
    }
    CellSignature::new(cell_type, data, selects, "Q", Some(products.join("+")))
}
