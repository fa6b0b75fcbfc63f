//! Evaluation domain model.
//!
//! # Responsibility
//! - Define the records persisted by the repositories.
//! - Own the document wire shape through `serde` attributes.
//!
//! # Invariants
//! - Top-level records (`Opinion`, `Dossier`, `Resolution`, `ReportType`)
//!   carry a caller-supplied id that doubles as the storage key.
//! - Child records (`Note`, `ActivityReport`) carry no id of their own; the
//!   store assigns one when they are attached to a parent.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod dossier;
pub mod evaluable;
pub mod opinion;
pub mod report_type;
pub mod resolution;
pub mod value;

/// Model-level validation failure raised before any persistence call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory field or argument was blank.
    MissingField(&'static str),
    /// A numeric value is NaN or infinite; JSON cannot hold it.
    NonFiniteNumber(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field not supplied: {field}"),
            Self::NonFiniteNumber(field) => write!(f, "non-finite number in field: {field}"),
        }
    }
}

impl Error for ValidationError {}

/// Rejects blank values for a mandatory field.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require, ValidationError};

    #[test]
    fn require_rejects_whitespace_only_values() {
        assert_eq!(
            require("id", "  \t"),
            Err(ValidationError::MissingField("id"))
        );
        assert!(require("id", "p-1").is_ok());
    }
}
