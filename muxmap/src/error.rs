// SPDX-License-Identifier: Apache-2.0

//! Error type shared by rule construction, validation, table registration and
//! substitution.

use crate::arity::Arity;

/// Detail carried by [`RuleError::PortMismatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortMismatchKind {
    /// A primitive port has no counterpart on the cell.
    UnmappedPrimitivePort,
    /// A cell port is neither connected nor tied.
    DisconnectedCellPort,
    /// A port appears more than once on the same side of the correspondence.
    DuplicatePort,
    /// The correspondence names a port that is not declared on its signature.
    UndeclaredPort,
    /// A data/select/output port was connected to a port of a different role.
    RoleMismatch,
    /// An output port was tied to a constant.
    TiedOutput,
    /// Connected cell data or select ports do not match the primitive's count.
    ArityMismatch,
}

impl std::fmt::Display for PortMismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PortMismatchKind::UnmappedPrimitivePort => "unmapped primitive port",
            PortMismatchKind::DisconnectedCellPort => "disconnected cell port",
            PortMismatchKind::DuplicatePort => "duplicated port",
            PortMismatchKind::UndeclaredPort => "undeclared port",
            PortMismatchKind::RoleMismatch => "port role mismatch",
            PortMismatchKind::TiedOutput => "output tied to a constant",
            PortMismatchKind::ArityMismatch => "arity mismatch",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule for this arity is already registered.
    DuplicateArity(Arity),
    /// The entry violates a signature or correspondence invariant, or a
    /// persisted record could not be decoded.
    MalformedEntry(String),
    /// Structural validation detail, naming the offending port.
    PortMismatch {
        port: String,
        kind: PortMismatchKind,
    },
    /// The cell output diverges from the primitive for this select index.
    FunctionalMismatch(usize),
    /// No rule is registered for the arity.
    NotFound(Arity),
    /// A data-input count or select width that is not a supported arity.
    InvalidArity(usize),
    /// A select index or select tuple outside the primitive's range.
    SelectOutOfRange { index: usize, arity: Arity },
    /// A select tuple whose length differs from the select width.
    SelectWidth { expected: u32, actual: usize },
    /// A mapping request did not bind this primitive port.
    UnboundPort(String),
    /// A mapping request bound a port the primitive does not declare.
    UnknownPort(String),
    /// A cell function could not be parsed or refers to unknown pins.
    Formula { cell: String, message: String },
    /// A rule file could not be read.
    Io { path: String, message: String },
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleError::DuplicateArity(arity) => {
                write!(f, "a rule for arity {} is already registered", arity)
            }
            RuleError::MalformedEntry(msg) => write!(f, "malformed rule entry: {}", msg),
            RuleError::PortMismatch { port, kind } => {
                write!(f, "port mismatch on '{}': {}", port, kind)
            }
            RuleError::FunctionalMismatch(index) => write!(
                f,
                "cell output diverges from the primitive at select index {}",
                index
            ),
            RuleError::NotFound(arity) => write!(f, "no rule registered for arity {}", arity),
            RuleError::InvalidArity(count) => write!(
                f,
                "{} is not a supported mux arity; expected a power of two >= 2",
                count
            ),
            RuleError::SelectOutOfRange { index, arity } => write!(
                f,
                "select index {} is out of range for arity {}",
                index, arity
            ),
            RuleError::SelectWidth { expected, actual } => write!(
                f,
                "expected {} select values but got {}",
                expected, actual
            ),
            RuleError::UnboundPort(port) => {
                write!(f, "mapping request does not bind primitive port '{}'", port)
            }
            RuleError::UnknownPort(port) => {
                write!(f, "mapping request binds undeclared port '{}'", port)
            }
            RuleError::Formula { cell, message } => {
                write!(f, "function of cell '{}' is invalid: {}", cell, message)
            }
            RuleError::Io { path, message } => {
                write!(f, "could not read rule file '{}': {}", path, message)
            }
        }
    }
}

impl std::error::Error for RuleError {}

pub type RuleResult<T> = std::result::Result<T, RuleError>;
