// SPDX-License-Identifier: Apache-2.0

//! Canonical mapping between select values, the binary select index and the
//! chosen data input.
//!
//! Select port `k` with bit `b_k` contributes `2^b_k` to the index, so under
//! the positional convention the first declared select is the LSB:
//!
//! ```text
//! index = sum(select_values[k] << bit[k])
//! ```
//!
//! `decode(index)` is the data input at position `index` in declaration order.

use crate::arity::Arity;
use crate::error::{RuleError, RuleResult};
use crate::signature::{CellSignature, PrimitiveSignature, SelectPort};

#[derive(Debug, Clone, Copy)]
pub struct SelectEncoder<'a> {
    data_inputs: &'a [String],
    selects: &'a [SelectPort],
    arity: Arity,
}

impl<'a> SelectEncoder<'a> {
    pub fn for_primitive(sig: &'a PrimitiveSignature) -> Self {
        SelectEncoder {
            data_inputs: sig.data_inputs(),
            selects: sig.selects(),
            arity: sig.arity(),
        }
    }

    pub fn for_cell(sig: &'a CellSignature) -> Self {
        SelectEncoder {
            data_inputs: sig.data_inputs(),
            selects: sig.selects(),
            arity: sig.arity(),
        }
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Select index for the given select values, listed in declaration order.
    pub fn encode(&self, select_values: &[bool]) -> RuleResult<usize> {
        if select_values.len() != self.selects.len() {
            return Err(RuleError::SelectWidth {
                expected: self.arity.select_width(),
                actual: select_values.len(),
            });
        }
        Ok(self
            .selects
            .iter()
            .zip(select_values)
            .filter(|(_, v)| **v)
            .fold(0usize, |acc, (port, _)| acc | (1usize << port.bit)))
    }

    /// Data input routed to the output for `index`.
    pub fn decode(&self, index: usize) -> RuleResult<&'a str> {
        self.data_inputs
            .get(index)
            .map(|s| s.as_str())
            .ok_or(RuleError::SelectOutOfRange {
                index,
                arity: self.arity,
            })
    }

    /// Select values, in declaration order, that produce `index`.
    pub fn decode_select_pattern(&self, index: usize) -> RuleResult<Vec<bool>> {
        if index >= self.arity.data_inputs() {
            return Err(RuleError::SelectOutOfRange {
                index,
                arity: self.arity,
            });
        }
        Ok(self
            .selects
            .iter()
            .map(|port| (index >> port.bit) & 1 == 1)
            .collect())
    }

    /// Position of the data input named `port`, i.e. the index that selects it.
    pub fn index_of(&self, port: &str) -> Option<usize> {
        self.data_inputs.iter().position(|d| d == port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{names, positional_selects};

    fn mux8() -> PrimitiveSignature {
        PrimitiveSignature::new(
            "$_MUX8_",
            names(&["A", "B", "C", "D", "E", "F", "G", "H"]),
            positional_selects(&["S", "T", "U"]),
            "Y",
        )
        .unwrap()
    }

    #[test]
    fn test_first_select_is_lsb() {
        let sig = mux8();
        let enc = SelectEncoder::for_primitive(&sig);
        // S=1, T=0, U=1 -> 1 + 0*2 + 1*4 = 5 -> F
        let index = enc.encode(&[true, false, true]).unwrap();
        assert_eq!(index, 5);
        assert_eq!(enc.decode(index).unwrap(), "F");
    }

    #[test]
    fn test_round_trip_every_index() {
        for width in 1..=6 {
            let count = 1usize << width;
            let data: Vec<String> = (0..count).map(|i| format!("D{}", i)).collect();
            let selects: Vec<SelectPort> = (0..width)
                .map(|b| SelectPort::new(&format!("S{}", b), b))
                .collect();
            let sig = PrimitiveSignature::new("m", data, selects, "Y").unwrap();
            let enc = SelectEncoder::for_primitive(&sig);
            for i in 0..count {
                let pattern = enc.decode_select_pattern(i).unwrap();
                assert_eq!(enc.encode(&pattern).unwrap(), i);
            }
        }
    }

    #[test]
    fn test_explicit_bits_override_declaration_order() {
        // U is declared first but carries the MSB.
        let sig = PrimitiveSignature::new(
            "$_MUX8_",
            names(&["A", "B", "C", "D", "E", "F", "G", "H"]),
            vec![
                SelectPort::new("U", 2),
                SelectPort::new("S", 0),
                SelectPort::new("T", 1),
            ],
            "Y",
        )
        .unwrap();
        let enc = SelectEncoder::for_primitive(&sig);
        assert_eq!(enc.encode(&[true, true, false]).unwrap(), 5);
        assert_eq!(enc.decode_select_pattern(5).unwrap(), vec![true, true, false]);
    }

    #[test]
    fn test_out_of_range() {
        let sig = mux8();
        let enc = SelectEncoder::for_primitive(&sig);
        assert!(matches!(
            enc.decode(8),
            Err(RuleError::SelectOutOfRange { index: 8, .. })
        ));
        assert!(enc.decode_select_pattern(8).is_err());
        assert_eq!(
            enc.encode(&[true]),
            Err(RuleError::SelectWidth {
                expected: 3,
                actual: 1
            })
        );
    }

    #[test]
    fn test_index_of() {
        let sig = mux8();
        let enc = SelectEncoder::for_primitive(&sig);
        assert_eq!(enc.index_of("C"), Some(2));
        assert_eq!(enc.index_of("S"), None);
    }
}
