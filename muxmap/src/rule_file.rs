// SPDX-License-Identifier: Apache-2.0

//! Persisted form of cells and rules.
//!
//! Rule files are TOML (or JSON when the path ends in `.json`):
//!
//! ```toml
//! [[cell]]
//! name = "mux4x0"
//! data_inputs = ["A", "B", "C", "D"]
//! selects = ["S0", "S1"]
//! output = "Q"
//! function = "(A*!S0*!S1)+(B*S0*!S1)+(C*!S0*S1)+(D*S0*S1)"
//!
//! [[rule]]
//! cell = "mux4x0"
//! connections = { A = "A", B = "B", S = "S0", Y = "Q" }
//! ties = { C = false, D = false, S1 = false }
//!
//! [rule.primitive]
//! name = "$_MUX_"
//! data_inputs = ["A", "B"]
//! selects = [{ name = "S", bit = 0 }]
//! output = "Y"
//! ```
//!
//! A select given as a bare name takes its declaration position as its bit.
//! Rules name their cell; it is resolved against the file's own cells first
//! and the built-in library second. Unknown, missing or duplicated fields are
//! rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::cell_library::CellLibrary;
use crate::error::{RuleError, RuleResult};
use crate::rule::{PortCorrespondence, RuleEntry};
use crate::rule_table::{RuleTable, RuleTableOptions};
use crate::signature::{CellSignature, PrimitiveSignature, SelectPort};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectDecl {
    Positional(String),
    Explicit(SelectPort),
}

fn resolve_selects(decls: &[SelectDecl]) -> Vec<SelectPort> {
    decls
        .iter()
        .enumerate()
        .map(|(i, d)| match d {
            SelectDecl::Positional(name) => SelectPort::new(name, i as u32),
            SelectDecl::Explicit(port) => port.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CellRecord {
    pub name: String,
    pub data_inputs: Vec<String>,
    pub selects: Vec<SelectDecl>,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl CellRecord {
    pub fn to_signature(&self) -> RuleResult<CellSignature> {
        CellSignature::new(
            &self.name,
            self.data_inputs.clone(),
            resolve_selects(&self.selects),
            &self.output,
            self.function.clone(),
        )
    }

    pub fn from_signature(cell: &CellSignature) -> Self {
        CellRecord {
            name: cell.cell_type().to_string(),
            data_inputs: cell.data_inputs().to_vec(),
            selects: cell
                .selects()
                .iter()
                .cloned()
                .map(SelectDecl::Explicit)
                .collect(),
            output: cell.output().to_string(),
            function: cell.function().map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrimitiveRecord {
    pub name: String,
    pub data_inputs: Vec<String>,
    pub selects: Vec<SelectDecl>,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleRecord {
    pub cell: String,
    /// Primitive port to cell port.
    #[serde(deserialize_with = "unique_map")]
    pub connections: BTreeMap<String, String>,
    /// Cell port to constant.
    #[serde(
        default,
        deserialize_with = "unique_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub ties: BTreeMap<String, bool>,
    pub primitive: PrimitiveRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleFile {
    #[serde(rename = "cell", default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<CellRecord>,
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleRecord>,
}

/// Deserializes a map, rejecting repeated keys instead of keeping the last.
fn unique_map<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueMapVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueMapVisitor<V> {
        type Value = BTreeMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "a map of port names")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = BTreeMap::new();
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if map.contains_key(&key) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate port '{}'",
                        key
                    )));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueMapVisitor(PhantomData))
}

fn malformed(source: &str, e: impl fmt::Display) -> RuleError {
    RuleError::MalformedEntry(format!("{}: {}", source, e))
}

impl RuleFile {
    pub fn from_toml_str(text: &str) -> RuleResult<Self> {
        toml::from_str(text).map_err(|e| malformed("toml", e))
    }

    pub fn from_json_str(text: &str) -> RuleResult<Self> {
        serde_json::from_str(text).map_err(|e| malformed("json", e))
    }

    pub fn from_path(path: &Path) -> RuleResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RuleError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::info!("loading rules from {}", path.display());
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let parsed = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        };
        parsed.map_err(|e| match e {
            RuleError::MalformedEntry(msg) => {
                RuleError::MalformedEntry(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Record form of the given rules, with each distinct target cell
    /// written once.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a RuleEntry>) -> Self {
        let mut file = RuleFile::default();
        for entry in entries {
            let cell = entry.cell();
            if !file.cells.iter().any(|c| c.name == cell.cell_type()) {
                file.cells.push(CellRecord::from_signature(cell));
            }
            let prim = entry.primitive();
            let corr = entry.correspondence();
            file.rules.push(RuleRecord {
                cell: cell.cell_type().to_string(),
                connections: corr.connections().iter().cloned().collect(),
                ties: corr.ties().iter().cloned().collect(),
                primitive: PrimitiveRecord {
                    name: prim.name().to_string(),
                    data_inputs: prim.data_inputs().to_vec(),
                    selects: prim
                        .selects()
                        .iter()
                        .cloned()
                        .map(SelectDecl::Explicit)
                        .collect(),
                    output: prim.output().to_string(),
                },
            });
        }
        file
    }

    pub fn to_toml_string(&self) -> RuleResult<String> {
        toml::to_string_pretty(self).map_err(|e| malformed("toml", e))
    }

    pub fn to_json_string(&self) -> RuleResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| malformed("json", e))
    }

    /// Resolves every record into a rule entry, without validating the
    /// correspondence.
    pub fn to_entries(&self, builtin: &CellLibrary) -> RuleResult<Vec<RuleEntry>> {
        let mut local = CellLibrary::new();
        for record in &self.cells {
            local.add(record.to_signature()?)?;
        }
        let mut entries = Vec::with_capacity(self.rules.len());
        for record in &self.rules {
            let primitive = PrimitiveSignature::new(
                &record.primitive.name,
                record.primitive.data_inputs.clone(),
                resolve_selects(&record.primitive.selects),
                &record.primitive.output,
            )?;
            let cell = local
                .get(&record.cell)
                .or_else(|| builtin.get(&record.cell))
                .ok_or_else(|| {
                    RuleError::MalformedEntry(format!(
                        "rule for '{}' targets unknown cell '{}'",
                        record.primitive.name, record.cell
                    ))
                })?
                .clone();
            let mut corr = PortCorrespondence::new();
            for (prim_port, cell_port) in &record.connections {
                corr = corr.connect(prim_port, cell_port);
            }
            for (cell_port, value) in &record.ties {
                corr = corr.tie(cell_port, *value);
            }
            entries.push(RuleEntry::new(primitive, cell, corr));
        }
        Ok(entries)
    }

    /// Builds and validates a rule table from this file.
    pub fn to_rule_table(&self, options: RuleTableOptions) -> RuleResult<RuleTable> {
        let builtin = CellLibrary::builtin()?;
        let mut table = RuleTable::with_options(options);
        for entry in self.to_entries(&builtin)? {
            table.register(entry)?;
        }
        Ok(table)
    }
}

/// Loads a rule file and builds a validated table from it.
pub fn load_rule_table(path: &Path, options: RuleTableOptions) -> RuleResult<RuleTable> {
    RuleFile::from_path(path)?.to_rule_table(options)
}
