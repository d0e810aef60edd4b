// SPDX-License-Identifier: Apache-2.0

//! Structural and functional validation of rule entries.
//!
//! The structural check proves the port correspondence is a role-preserving
//! bijection between primitive ports and the connected cell ports, with every
//! remaining cell port tied to a constant. The functional check evaluates the
//! cell's output function for every select index and requires the output to
//! follow the data input chosen by the primitive's select encoding.

use std::collections::{HashMap, HashSet};

use crate::cell_formula::{parse_formula, BoundTerm};
use crate::error::{PortMismatchKind, RuleError, RuleResult};
use crate::rule::{RuleEntry, RuleState};
use crate::select_encoder::SelectEncoder;
use crate::signature::PortRole;

/// Primitives with at most this many data inputs are checked over every data
/// assignment; wider ones get two one-hot assignments per select index.
pub const DEFAULT_EXHAUSTIVE_DATA_LIMIT: usize = 16;

/// Outcome of running a rule through the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub state: RuleState,
    pub error: Option<RuleError>,
}

#[derive(Debug, Clone)]
pub struct Validator {
    exhaustive_data_limit: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Validator {
            exhaustive_data_limit: DEFAULT_EXHAUSTIVE_DATA_LIMIT,
        }
    }
}

/// What drives a cell input pin during functional evaluation.
#[derive(Debug, Clone, Copy)]
enum PinSource {
    /// Primitive data input at this position.
    Data(usize),
    /// Primitive select at this declaration position.
    Select(usize),
    Tied(bool),
}

fn mismatch(port: &str, kind: PortMismatchKind) -> RuleError {
    RuleError::PortMismatch {
        port: port.to_string(),
        kind,
    }
}

fn broadcast(value: bool) -> u64 {
    if value {
        u64::MAX
    } else {
        0
    }
}

/// Lanes of input `var` in word `word` of a full truth-table enumeration.
fn truth_table_lanes(var: usize, word: usize) -> u64 {
    const PATTERNS: [u64; 6] = [
        0xAAAA_AAAA_AAAA_AAAA,
        0xCCCC_CCCC_CCCC_CCCC,
        0xF0F0_F0F0_F0F0_F0F0,
        0xFF00_FF00_FF00_FF00,
        0xFFFF_0000_FFFF_0000,
        0xFFFF_FFFF_0000_0000,
    ];
    if var < PATTERNS.len() {
        PATTERNS[var]
    } else {
        broadcast((word >> (var - PATTERNS.len())) & 1 == 1)
    }
}

fn low_mask(lanes: usize) -> u64 {
    if lanes >= 64 {
        u64::MAX
    } else {
        (1u64 << lanes) - 1
    }
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    /// Limits above [`DEFAULT_EXHAUSTIVE_DATA_LIMIT`] are clamped to it; the
    /// truth table has `2^data_inputs` rows.
    pub fn with_exhaustive_data_limit(mut self, limit: usize) -> Self {
        self.exhaustive_data_limit = limit.min(DEFAULT_EXHAUSTIVE_DATA_LIMIT);
        self
    }

    /// Runs both checks and reports the state the rule reached.
    ///
    /// A rule whose cell has no output function stops at `StructurallyValid`.
    pub fn validate(&self, entry: &RuleEntry) -> ValidationReport {
        if let Err(e) = self.check_structure(entry) {
            log::debug!(
                "rule for arity {} rejected structurally: {}",
                entry.arity(),
                e
            );
            return ValidationReport {
                state: RuleState::Rejected,
                error: Some(e),
            };
        }
        let state = RuleState::StructurallyValid;
        match self.check_function(entry) {
            Ok(true) => ValidationReport {
                state: RuleState::FunctionallyValid,
                error: None,
            },
            Ok(false) => {
                log::info!(
                    "cell '{}' has no output function; rule for arity {} is only structurally checked",
                    entry.cell().cell_type(),
                    entry.arity()
                );
                ValidationReport { state, error: None }
            }
            Err(e) => {
                log::debug!(
                    "rule for arity {} rejected functionally: {}",
                    entry.arity(),
                    e
                );
                ValidationReport {
                    state: RuleState::Rejected,
                    error: Some(e),
                }
            }
        }
    }

    /// Checks that the correspondence is a role-preserving bijection and that
    /// the connected arities agree.
    pub fn check_structure(&self, entry: &RuleEntry) -> RuleResult<()> {
        let prim = entry.primitive();
        let cell = entry.cell();
        let corr = entry.correspondence();

        if cell.data_inputs().len() < prim.data_inputs().len()
            || cell.selects().len() < prim.selects().len()
        {
            return Err(mismatch(cell.cell_type(), PortMismatchKind::ArityMismatch));
        }

        let mut mapped_primitive: HashSet<&str> = HashSet::new();
        let mut covered_cell: HashSet<&str> = HashSet::new();

        for (p, c) in corr.connections() {
            let p_role = prim
                .role_of(p)
                .ok_or_else(|| mismatch(p, PortMismatchKind::UndeclaredPort))?;
            let c_role = cell
                .role_of(c)
                .ok_or_else(|| mismatch(c, PortMismatchKind::UndeclaredPort))?;
            if !mapped_primitive.insert(p.as_str()) {
                return Err(mismatch(p, PortMismatchKind::DuplicatePort));
            }
            if !covered_cell.insert(c.as_str()) {
                return Err(mismatch(c, PortMismatchKind::DuplicatePort));
            }
            if p_role != c_role {
                return Err(mismatch(p, PortMismatchKind::RoleMismatch));
            }
        }

        for (c, _) in corr.ties() {
            let role = cell
                .role_of(c)
                .ok_or_else(|| mismatch(c, PortMismatchKind::UndeclaredPort))?;
            if role == PortRole::Output {
                return Err(mismatch(c, PortMismatchKind::TiedOutput));
            }
            if !covered_cell.insert(c.as_str()) {
                return Err(mismatch(c, PortMismatchKind::DuplicatePort));
            }
        }

        for (port, _) in prim.ports() {
            if !mapped_primitive.contains(port) {
                return Err(mismatch(port, PortMismatchKind::UnmappedPrimitivePort));
            }
        }
        for (port, _) in cell.ports() {
            if !covered_cell.contains(port) {
                return Err(mismatch(port, PortMismatchKind::DisconnectedCellPort));
            }
        }
        Ok(())
    }

    /// Checks the cell against the primitive's semantics for every select
    /// index. Returns `Ok(false)` when the cell has no output function; its
    /// declared data order and select bits are still checked as a routing
    /// model in that case.
    ///
    /// Assumes [`Validator::check_structure`] has passed.
    pub fn check_function(&self, entry: &RuleEntry) -> RuleResult<bool> {
        let cell = entry.cell();
        let Some(function) = cell.function() else {
            self.check_declared_routing(entry)?;
            return Ok(false);
        };
        let formula_error = |message: String| RuleError::Formula {
            cell: cell.cell_type().to_string(),
            message,
        };
        let term = parse_formula(function).map_err(formula_error)?;

        let pins: Vec<&str> = cell
            .data_inputs()
            .iter()
            .map(|s| s.as_str())
            .chain(cell.selects().iter().map(|s| s.name.as_str()))
            .collect();
        let bound: BoundTerm = term.bind(&pins).map_err(formula_error)?;
        let sources = pin_sources(entry, &pins)?;

        if entry.arity().data_inputs() <= self.exhaustive_data_limit {
            self.check_exhaustive(entry, &bound, &sources)?;
        } else {
            self.check_one_hot(entry, &bound, &sources)?;
        }
        Ok(true)
    }

    /// Every data assignment for every select index. Covers the one-hot cases.
    fn check_exhaustive(
        &self,
        entry: &RuleEntry,
        bound: &BoundTerm,
        sources: &[PinSource],
    ) -> RuleResult<()> {
        let selects = entry.primitive().selects();
        let data_count = entry.arity().data_inputs();
        let rows = 1usize << data_count;
        let words = (rows / 64).max(1);
        let mask = low_mask(rows);
        let mut values = vec![0u64; sources.len()];

        for index in 0..data_count {
            for word in 0..words {
                for (slot, source) in values.iter_mut().zip(sources) {
                    *slot = match *source {
                        PinSource::Data(j) => truth_table_lanes(j, word),
                        PinSource::Select(k) => broadcast((index >> selects[k].bit) & 1 == 1),
                        PinSource::Tied(v) => broadcast(v),
                    };
                }
                let got = bound.eval(&values) & mask;
                let want = truth_table_lanes(index, word) & mask;
                if got != want {
                    log::debug!(
                        "cell '{}' truth-table mismatch at select index {} (word {})",
                        entry.cell().cell_type(),
                        index,
                        word
                    );
                    return Err(RuleError::FunctionalMismatch(index));
                }
            }
        }
        Ok(())
    }

    /// Two one-hot assignments per select index, 64 indices per lane word: the selected
    /// input alone high must drive the output high, and the selected input
    /// alone low must drive it low.
    fn check_one_hot(
        &self,
        entry: &RuleEntry,
        bound: &BoundTerm,
        sources: &[PinSource],
    ) -> RuleResult<()> {
        let selects = entry.primitive().selects();
        let data_count = entry.arity().data_inputs();
        let mut values = vec![0u64; sources.len()];

        for base in (0..data_count).step_by(64) {
            let lanes = (data_count - base).min(64);
            let mask = low_mask(lanes);
            let select_lanes = |bit: u32| -> u64 {
                (0..lanes)
                    .filter(|l| ((base + l) >> bit) & 1 == 1)
                    .fold(0u64, |acc, l| acc | (1u64 << l))
            };
            for (slot, source) in values.iter_mut().zip(sources) {
                *slot = match *source {
                    PinSource::Data(j) if j >= base && j - base < 64 => 1u64 << (j - base),
                    PinSource::Data(_) => 0,
                    PinSource::Select(k) => select_lanes(selects[k].bit),
                    PinSource::Tied(v) => broadcast(v),
                };
            }
            let missed = !bound.eval(&values) & mask;

            for (slot, source) in values.iter_mut().zip(sources) {
                if let PinSource::Data(_) = source {
                    *slot = !*slot;
                }
            }
            let leaked = bound.eval(&values) & mask;

            let bad = missed | leaked;
            if bad != 0 {
                let index = base + bad.trailing_zeros() as usize;
                log::debug!(
                    "cell '{}' fails a one-hot assignment at select index {}",
                    entry.cell().cell_type(),
                    index
                );
                return Err(RuleError::FunctionalMismatch(index));
            }
        }
        Ok(())
    }

    /// Treats a cell without a function as the mux its declaration describes:
    /// data pin `i` is routed when the cell selects encode `i`.
    fn check_declared_routing(&self, entry: &RuleEntry) -> RuleResult<()> {
        let cell = entry.cell();
        let prim_selects = entry.primitive().selects();
        let select_pins: Vec<&str> = cell.selects().iter().map(|s| s.name.as_str()).collect();
        let data_pins: Vec<&str> = cell.data_inputs().iter().map(|s| s.as_str()).collect();
        let select_sources = pin_sources(entry, &select_pins)?;
        let data_sources = pin_sources(entry, &data_pins)?;
        let encoder = SelectEncoder::for_cell(cell);

        let mut values = vec![false; select_sources.len()];
        for index in 0..entry.arity().data_inputs() {
            for ((slot, source), pin) in values.iter_mut().zip(&select_sources).zip(&select_pins) {
                *slot = match *source {
                    PinSource::Select(k) => (index >> prim_selects[k].bit) & 1 == 1,
                    PinSource::Tied(v) => v,
                    PinSource::Data(_) => return Err(mismatch(pin, PortMismatchKind::RoleMismatch)),
                };
            }
            let routed = encoder.encode(&values)?;
            match data_sources.get(routed) {
                Some(PinSource::Data(j)) if *j == index => {}
                _ => {
                    log::debug!(
                        "cell '{}' routes data pin {} at select index {}",
                        cell.cell_type(),
                        routed,
                        index
                    );
                    return Err(RuleError::FunctionalMismatch(index));
                }
            }
        }
        Ok(())
    }
}

/// Source of each pin in `pins`, resolved through the correspondence.
fn pin_sources(entry: &RuleEntry, pins: &[&str]) -> RuleResult<Vec<PinSource>> {
    let prim = entry.primitive();
    let corr = entry.correspondence();
    let mut by_port: HashMap<&str, PinSource> = HashMap::new();
    for (i, port) in prim.data_inputs().iter().enumerate() {
        by_port.insert(port.as_str(), PinSource::Data(i));
    }
    for (k, select) in prim.selects().iter().enumerate() {
        by_port.insert(select.name.as_str(), PinSource::Select(k));
    }
    let driven_by: HashMap<&str, &str> = corr
        .connections()
        .iter()
        .map(|(p, c)| (c.as_str(), p.as_str()))
        .collect();
    let tied: HashMap<&str, bool> = corr
        .ties()
        .iter()
        .map(|(c, v)| (c.as_str(), *v))
        .collect();

    let mut sources = Vec::with_capacity(pins.len());
    for pin in pins {
        let source = if let Some(value) = tied.get(pin) {
            PinSource::Tied(*value)
        } else {
            let port = driven_by
                .get(pin)
                .ok_or_else(|| mismatch(pin, PortMismatchKind::DisconnectedCellPort))?;
            *by_port
                .get(port)
                .ok_or_else(|| mismatch(port, PortMismatchKind::RoleMismatch))?
        };
        sources.push(source);
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arity::Arity;
    use crate::cell_library::mux_cell;
    use crate::rule::PortCorrespondence;
    use crate::signature::{
        names, positional_selects, CellSignature, PrimitiveSignature, SelectPort,
    };

    fn mux2_primitive() -> PrimitiveSignature {
        PrimitiveSignature::new("$_MUX_", names(&["A", "B"]), positional_selects(&["S"]), "Y")
            .unwrap()
    }

    fn mux4_cell() -> CellSignature {
        mux_cell("mux4x0", Arity::from_select_width(2).unwrap()).unwrap()
    }

    fn mux2_on_mux4() -> PortCorrespondence {
        PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("S", "S0")
            .connect("Y", "Q")
            .tie("C", false)
            .tie("D", false)
            .tie("S1", false)
    }

    #[test]
    fn test_mux2_on_mux4_is_functionally_valid() {
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), mux2_on_mux4());
        let report = Validator::new().validate(&entry);
        assert_eq!(report.state, RuleState::FunctionallyValid);
        assert_eq!(report.error, None);
    }

    #[test]
    fn test_missing_tie_is_disconnected() {
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("S", "S0")
            .connect("Y", "Q")
            .tie("C", false)
            .tie("S1", false);
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        assert_eq!(
            Validator::new().check_structure(&entry),
            Err(RuleError::PortMismatch {
                port: "D".to_string(),
                kind: PortMismatchKind::DisconnectedCellPort
            })
        );
    }

    #[test]
    fn test_unmapped_primitive_port() {
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("S", "S0")
            .connect("Y", "Q")
            .tie("B", false)
            .tie("C", false)
            .tie("D", false)
            .tie("S1", false);
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        assert_eq!(
            Validator::new().check_structure(&entry),
            Err(RuleError::PortMismatch {
                port: "B".to_string(),
                kind: PortMismatchKind::UnmappedPrimitivePort
            })
        );
    }

    #[test]
    fn test_cell_port_used_twice() {
        let corr = mux2_on_mux4().tie("A", true);
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        assert_eq!(
            Validator::new().check_structure(&entry),
            Err(RuleError::PortMismatch {
                port: "A".to_string(),
                kind: PortMismatchKind::DuplicatePort
            })
        );
    }

    #[test]
    fn test_role_mismatch_and_tied_output() {
        let corr = PortCorrespondence::new()
            .connect("A", "S0")
            .connect("B", "B")
            .connect("S", "A")
            .connect("Y", "Q");
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        assert!(matches!(
            Validator::new().check_structure(&entry),
            Err(RuleError::PortMismatch {
                kind: PortMismatchKind::RoleMismatch,
                ..
            })
        ));

        let corr = mux2_on_mux4().tie("Q", false);
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        assert!(matches!(
            Validator::new().check_structure(&entry),
            Err(RuleError::PortMismatch {
                kind: PortMismatchKind::TiedOutput,
                ..
            })
        ));
    }

    #[test]
    fn test_cell_too_narrow() {
        let prim = PrimitiveSignature::new(
            "$_MUX4_",
            names(&["A", "B", "C", "D"]),
            positional_selects(&["S", "T"]),
            "Y",
        )
        .unwrap();
        let cell = mux_cell("mux2x0", Arity::from_select_width(1).unwrap()).unwrap();
        let entry = RuleEntry::new(prim, cell, PortCorrespondence::new());
        assert_eq!(
            Validator::new().check_structure(&entry),
            Err(RuleError::PortMismatch {
                port: "mux2x0".to_string(),
                kind: PortMismatchKind::ArityMismatch
            })
        );
    }

    #[test]
    fn test_swapped_data_pins_is_bijective_but_wrong() {
        let corr = PortCorrespondence::new()
            .connect("A", "B")
            .connect("B", "A")
            .connect("S", "S0")
            .connect("Y", "Q")
            .tie("C", false)
            .tie("D", false)
            .tie("S1", false);
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        let v = Validator::new();
        assert_eq!(v.check_structure(&entry), Ok(()));
        assert_eq!(v.check_function(&entry), Err(RuleError::FunctionalMismatch(0)));
        assert_eq!(v.validate(&entry).state, RuleState::Rejected);
    }

    #[test]
    fn test_tied_select_high_picks_wrong_half() {
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("S", "S0")
            .connect("Y", "Q")
            .tie("C", false)
            .tie("D", false)
            .tie("S1", true);
        let entry = RuleEntry::new(mux2_primitive(), mux4_cell(), corr);
        assert_eq!(
            Validator::new().check_function(&entry),
            Err(RuleError::FunctionalMismatch(0))
        );
    }

    #[test]
    fn test_one_hot_blind_function_caught_exhaustively() {
        // Passes every one-hot assignment but not A=B=1, S=0.
        let cell = CellSignature::new(
            "odd2",
            names(&["A", "B"]),
            positional_selects(&["S0"]),
            "Q",
            Some("(A*!B*!S0)+(B*S0)".to_string()),
        )
        .unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("S", "S0")
            .connect("Y", "Q");
        let entry = RuleEntry::new(mux2_primitive(), cell, corr);
        assert_eq!(
            Validator::new().check_function(&entry),
            Err(RuleError::FunctionalMismatch(0))
        );
        assert_eq!(
            Validator::new()
                .with_exhaustive_data_limit(0)
                .check_function(&entry),
            Ok(true)
        );
    }

    #[test]
    fn test_no_function_stops_at_structural() {
        let cell = CellSignature::new(
            "opaque2",
            names(&["I0", "I1"]),
            positional_selects(&["S0"]),
            "Z",
            None,
        )
        .unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "I0")
            .connect("B", "I1")
            .connect("S", "S0")
            .connect("Y", "Z");
        let entry = RuleEntry::new(mux2_primitive(), cell, corr);
        let report = Validator::new().validate(&entry);
        assert_eq!(report.state, RuleState::StructurallyValid);
        assert!(!report.state.is_terminal());
    }

    fn opaque4_cell(selects: Vec<SelectPort>) -> CellSignature {
        CellSignature::new("opaque4", names(&["A", "B", "C", "D"]), selects, "Q", None).unwrap()
    }

    fn mux4_rule_onto(cell: CellSignature, s_to: &str, t_to: &str) -> RuleEntry {
        let prim = crate::builtin::mux_primitive(Arity::from_select_width(2).unwrap()).unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("C", "C")
            .connect("D", "D")
            .connect("S", s_to)
            .connect("T", t_to)
            .connect("Y", "Q");
        RuleEntry::new(prim, cell, corr)
    }

    #[test]
    fn test_no_function_swapped_selects_rejected() {
        let entry = mux4_rule_onto(opaque4_cell(positional_selects(&["S0", "S1"])), "S1", "S0");
        assert_eq!(
            Validator::new().check_function(&entry),
            Err(RuleError::FunctionalMismatch(1))
        );
        let report = Validator::new().validate(&entry);
        assert_eq!(report.state, RuleState::Rejected);
        assert_eq!(report.error, Some(RuleError::FunctionalMismatch(1)));
    }

    #[test]
    fn test_no_function_follows_declared_select_bits() {
        // S1 is the low select bit of this cell, so S must drive it.
        let selects = vec![SelectPort::new("S0", 1), SelectPort::new("S1", 0)];
        let entry = mux4_rule_onto(opaque4_cell(selects.clone()), "S1", "S0");
        assert_eq!(Validator::new().check_function(&entry), Ok(false));
        assert_eq!(
            Validator::new().validate(&entry).state,
            RuleState::StructurallyValid
        );

        let entry = mux4_rule_onto(opaque4_cell(selects), "S0", "S1");
        assert_eq!(
            Validator::new().check_function(&entry),
            Err(RuleError::FunctionalMismatch(1))
        );
    }

    #[test]
    fn test_no_function_swapped_data_rejected() {
        let prim = crate::builtin::mux_primitive(Arity::from_select_width(2).unwrap()).unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("C", "D")
            .connect("D", "C")
            .connect("S", "S0")
            .connect("T", "S1")
            .connect("Y", "Q");
        let entry = RuleEntry::new(prim, opaque4_cell(positional_selects(&["S0", "S1"])), corr);
        assert_eq!(
            Validator::new().check_function(&entry),
            Err(RuleError::FunctionalMismatch(2))
        );
    }

    #[test]
    fn test_bad_formula_reported() {
        let cell = CellSignature::new(
            "broken2",
            names(&["A", "B"]),
            positional_selects(&["S0"]),
            "Q",
            Some("(A*!S0)+(B*S7)".to_string()),
        )
        .unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("B", "B")
            .connect("S", "S0")
            .connect("Y", "Q");
        let entry = RuleEntry::new(mux2_primitive(), cell, corr);
        assert!(matches!(
            Validator::new().check_function(&entry),
            Err(RuleError::Formula { cell, .. }) if cell == "broken2"
        ));
    }
}
