// SPDX-License-Identifier: Apache-2.0

use std::io::Write;
use std::path::PathBuf;

use muxmap::rule_file::{load_rule_table, RuleFile};
use muxmap::{Arity, RuleError, RuleState, RuleTableOptions};
use pretty_assertions::assert_eq;

fn sample_rules_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("rules/mux_rules.toml")
}

fn strict() -> RuleTableOptions {
    RuleTableOptions {
        require_functional: true,
    }
}

#[test]
fn test_sample_rule_file_loads_and_validates() {
    let _ = env_logger::builder().is_test(true).try_init();
    let table = load_rule_table(&sample_rules_path(), strict()).unwrap();
    let arities: Vec<usize> = table.arities().iter().map(|a| a.data_inputs()).collect();
    assert_eq!(arities, vec![2, 4, 8]);
    for rule in table.iter() {
        assert_eq!(rule.state(), RuleState::FunctionallyValid);
    }
    let mux2 = table.lookup(Arity::from_data_inputs(2).unwrap()).unwrap();
    assert_eq!(mux2.cell().cell_type(), "mux2x1");
    assert_eq!(mux2.correspondence().cell_port_for("S"), Some("SEL"));
}

#[test]
fn test_json_rule_file_from_path() {
    let _ = env_logger::builder().is_test(true).try_init();
    let text = RuleFile::from_path(&sample_rules_path())
        .unwrap()
        .to_json_string()
        .unwrap();
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    let table = load_rule_table(file.path(), strict()).unwrap();
    assert_eq!(table.len(), 3);
}

#[test]
fn test_duplicate_arity_in_file() {
    let _ = env_logger::builder().is_test(true).try_init();
    let text = std::fs::read_to_string(sample_rules_path()).unwrap();
    let doubled = format!(
        "{}\n[[rule]]\ncell = \"mux2x0\"\nconnections = {{ A = \"A\", B = \"B\", S = \"S0\", Y = \"Q\" }}\n\n[rule.primitive]\nname = \"$_MUX_\"\ndata_inputs = [\"A\", \"B\"]\nselects = [\"S\"]\noutput = \"Y\"\n",
        text
    );
    let err = RuleFile::from_toml_str(&doubled)
        .unwrap()
        .to_rule_table(strict())
        .unwrap_err();
    assert_eq!(
        err,
        RuleError::DuplicateArity(Arity::from_data_inputs(2).unwrap())
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert!(matches!(
        load_rule_table(&path, strict()),
        Err(RuleError::Io { .. })
    ));
}
