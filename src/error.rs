use std::error::Error;
use std::fmt;

/// Errors surfaced by the pruner's public operations.
///
/// `Invariant` signals an internal inconsistency: a pruner that
/// returned it must be considered poisoned and not used further.
#[derive(Debug, Clone, PartialEq)]
pub enum PrunerError {
    Configuration(String),
    Shape(String),
    Invariant(String),
}

impl fmt::Display for PrunerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrunerError::Configuration(message) => {
                write!(f, "configuration error: {}", message)
            }
            PrunerError::Shape(message) => {
                write!(f, "shape error: {}", message)
            }
            PrunerError::Invariant(message) => {
                write!(f, "invariant violation: {}", message)
            }
        }
    }
}

impl Error for PrunerError {}
