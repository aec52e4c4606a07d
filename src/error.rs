//! Errors produced while building and deriving weak formulations.
use crate::registry::EntityKind;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DerivationError {
    /// A root entity with the same symbolic or linguistic label is already registered.
    IdentityConflict { kind: EntityKind, label: String },
    /// The operands live on different meshes or spaces, or have incompatible shapes.
    StructuralMismatch(String),
    /// The operation is not implemented for the given operands.
    Unsupported(String),
    /// A term does not match the pattern required by the operation.
    PatternMismatch(String),
    /// A time instant lies outside its sequence or off its step grid.
    InvalidTimeInstant(String),
    /// A composite index is malformed or out of range.
    Indexing { index: String, reason: String },
    /// A label, sign, orientation or expression string could not be parsed or is not allowed.
    InvalidRepresentation(String),
    /// The operation was called before its preconditions were established.
    InvalidState(String),
}

impl DerivationError {
    pub(crate) fn indexing(index: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Indexing {
            index: index.into(),
            reason: reason.into(),
        }
    }
}

impl Display for DerivationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            DerivationError::IdentityConflict { kind, label } => {
                write!(f, "A root {} with label \"{}\" is already registered.", kind, label)
            }
            DerivationError::StructuralMismatch(msg) => write!(f, "Structural mismatch: {}", msg),
            DerivationError::Unsupported(msg) => write!(f, "Unsupported operation: {}", msg),
            DerivationError::PatternMismatch(msg) => write!(f, "Pattern mismatch: {}", msg),
            DerivationError::InvalidTimeInstant(msg) => write!(f, "Invalid time instant: {}", msg),
            DerivationError::Indexing { index, reason } => {
                write!(f, "Index \"{}\" is illegal: {}", index, reason)
            }
            DerivationError::InvalidRepresentation(msg) => write!(f, "Invalid representation: {}", msg),
            DerivationError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl Error for DerivationError {}

pub type DerivationResult<T> = Result<T, DerivationError>;
