// SPDX-License-Identifier: Apache-2.0

//! Arity-keyed table of validated rules.
//!
//! A table is populated once during setup and read-only afterwards; lookups
//! are pure and safe from any number of threads. Live reloading goes through
//! [`SharedRuleTable`], which swaps whole tables and never mutates an
//! installed entry.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::arity::Arity;
use crate::error::{RuleError, RuleResult};
use crate::rule::{InstalledRule, RuleEntry, RuleState};
use crate::validate::Validator;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTableOptions {
    /// Reject rules whose cell has no behavioral model instead of installing
    /// them as structurally valid only.
    pub require_functional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: BTreeMap<Arity, InstalledRule>,
    options: RuleTableOptions,
    validator: Validator,
}

impl RuleTable {
    pub fn new() -> Self {
        RuleTable::default()
    }

    pub fn with_options(options: RuleTableOptions) -> Self {
        RuleTable {
            options,
            ..RuleTable::default()
        }
    }

    pub fn options(&self) -> &RuleTableOptions {
        &self.options
    }

    /// Validates `entry` and installs it under its arity.
    ///
    /// Fails with `DuplicateArity` when the arity is already taken (the
    /// existing rule is left in place), with `MalformedEntry` when the
    /// correspondence is not a bijection or the arities disagree, and with
    /// `FunctionalMismatch` when the cell does not implement the primitive.
    pub fn register(&mut self, entry: RuleEntry) -> RuleResult<RuleState> {
        let arity = entry.arity();
        if self.rules.contains_key(&arity) {
            log::warn!(
                "rejecting second rule for arity {} (cell '{}')",
                arity,
                entry.cell().cell_type()
            );
            return Err(RuleError::DuplicateArity(arity));
        }

        let report = self.validator.validate(&entry);
        match report.error {
            Some(RuleError::PortMismatch { port, kind }) => {
                return Err(RuleError::MalformedEntry(format!(
                    "rule for arity {} onto '{}': {} '{}'",
                    arity,
                    entry.cell().cell_type(),
                    kind,
                    port
                )));
            }
            Some(e) => return Err(e),
            None => {}
        }
        if report.state != RuleState::FunctionallyValid && self.options.require_functional {
            return Err(RuleError::MalformedEntry(format!(
                "cell '{}' has no output function and functional validation is required",
                entry.cell().cell_type()
            )));
        }

        log::info!(
            "registered rule {} -> {} (arity {}, {})",
            entry.primitive().name(),
            entry.cell().cell_type(),
            arity,
            report.state
        );
        self.rules
            .insert(arity, InstalledRule::new(entry, report.state));
        Ok(report.state)
    }

    pub fn lookup(&self, arity: Arity) -> RuleResult<&InstalledRule> {
        self.rules.get(&arity).ok_or(RuleError::NotFound(arity))
    }

    pub fn contains(&self, arity: Arity) -> bool {
        self.rules.contains_key(&arity)
    }

    /// Registered arities in ascending order.
    pub fn arities(&self) -> Vec<Arity> {
        self.rules.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstalledRule> {
        self.rules.values()
    }

    /// Rules that passed the functional check; the only ones a production
    /// flow should apply.
    pub fn production_rules(&self) -> impl Iterator<Item = &InstalledRule> {
        self.rules
            .values()
            .filter(|r| r.state() == RuleState::FunctionallyValid)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Single-writer / multi-reader holder for a live rule table.
///
/// Readers take an `Arc` snapshot and keep using it for as long as they like;
/// a reload swaps in a completely built table.
#[derive(Debug, Default)]
pub struct SharedRuleTable {
    current: RwLock<Arc<RuleTable>>,
}

impl SharedRuleTable {
    pub fn new(table: RuleTable) -> Self {
        SharedRuleTable {
            current: RwLock::new(Arc::new(table)),
        }
    }

    pub fn snapshot(&self) -> Arc<RuleTable> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replaces the live table, returning the previous one.
    pub fn replace(&self, table: RuleTable) -> Arc<RuleTable> {
        let next = Arc::new(table);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        log::info!("swapping rule table ({} rules)", next.len());
        std::mem::replace(&mut *guard, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{builtin_rule_table, mux_primitive, mux_rule};
    use crate::cell_library::{mux_cell, CellLibrary};
    use crate::rule::PortCorrespondence;
    use crate::signature::{names, positional_selects, CellSignature, PrimitiveSignature};

    fn arity(n: usize) -> Arity {
        Arity::from_data_inputs(n).unwrap()
    }

    #[test]
    fn test_lookup_missing_is_not_found() {
        let table = RuleTable::new();
        assert_eq!(
            table.lookup(arity(4)).unwrap_err(),
            RuleError::NotFound(arity(4))
        );
    }

    #[test]
    fn test_duplicate_arity_keeps_existing() {
        let lib = CellLibrary::builtin().unwrap();
        let mut table = RuleTable::new();
        let mux4 = lib.get("mux4x0").unwrap();
        let mux8 = lib.get("mux8x0").unwrap();
        table.register(mux_rule(arity(2), mux4).unwrap()).unwrap();

        let again = mux_rule(arity(2), mux8).unwrap();
        assert_eq!(
            table.register(again),
            Err(RuleError::DuplicateArity(arity(2)))
        );
        assert_eq!(
            table.lookup(arity(2)).unwrap().cell().cell_type(),
            "mux4x0"
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_structural_failure_is_malformed_and_not_installed() {
        let prim = mux_primitive(arity(2)).unwrap();
        let cell = mux_cell("mux2x0", arity(2)).unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "A")
            .connect("S", "S0")
            .connect("Y", "Q");
        let mut table = RuleTable::new();
        let err = table.register(RuleEntry::new(prim, cell, corr)).unwrap_err();
        assert!(matches!(err, RuleError::MalformedEntry(m) if m.contains("'B'")));
        assert!(!table.contains(arity(2)));
    }

    #[test]
    fn test_functional_failure_not_installed() {
        let prim = mux_primitive(arity(2)).unwrap();
        let cell = mux_cell("mux2x0", arity(2)).unwrap();
        let corr = PortCorrespondence::new()
            .connect("A", "B")
            .connect("B", "A")
            .connect("S", "S0")
            .connect("Y", "Q");
        let mut table = RuleTable::new();
        assert_eq!(
            table.register(RuleEntry::new(prim, cell, corr)),
            Err(RuleError::FunctionalMismatch(0))
        );
        assert!(table.is_empty());
    }

    fn opaque_rule() -> RuleEntry {
        let prim = PrimitiveSignature::new(
            "$_MUX_",
            names(&["A", "B"]),
            positional_selects(&["S"]),
            "Y",
        )
        .unwrap();
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
        RuleEntry::new(prim, cell, corr)
    }

    #[test]
    fn test_require_functional() {
        let mut lenient = RuleTable::new();
        assert_eq!(
            lenient.register(opaque_rule()),
            Ok(RuleState::StructurallyValid)
        );
        assert_eq!(lenient.production_rules().count(), 0);

        let mut strict = RuleTable::with_options(RuleTableOptions {
            require_functional: true,
        });
        assert!(matches!(
            strict.register(opaque_rule()),
            Err(RuleError::MalformedEntry(_))
        ));
    }

    #[test]
    fn test_shared_table_swap() {
        let shared = SharedRuleTable::new(RuleTable::new());
        let before = shared.snapshot();
        assert!(before.is_empty());

        let previous = shared.replace(builtin_rule_table().unwrap());
        assert!(previous.is_empty());
        // The old snapshot is unaffected by the swap.
        assert!(before.is_empty());
        assert!(shared.snapshot().lookup(arity(8)).is_ok());
    }

    #[test]
    fn test_concurrent_readers() {
        let shared = Arc::new(SharedRuleTable::new(builtin_rule_table().unwrap()));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    let table = shared.snapshot();
                    table.lookup(arity(8)).map(|r| r.cell().cell_type().to_string())
                })
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), Ok("mux8x0".to_string()));
        }
    }
}
