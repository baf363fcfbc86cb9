//! Error types for prooflab

use thiserror::Error;

use crate::unification::UnificationError;

/// Every failure an entry point can report.
///
/// All of them are per-request: a failed move leaves the caller with the
/// previous, still sealed state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogicError {
    #[error("Invalid formula format: {message} (at position {position})")]
    InvalidFormulaFormat { message: String, position: usize },

    #[error("Formula conversion failed: {0}")]
    FormulaConversion(String),

    #[error("Unification impossible: {0}")]
    UnificationImpossible(String),

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// Malformed payloads and seal mismatches share this variant so callers
    /// cannot tell which field was rejected.
    #[error("Invalid JSON payload: {0}")]
    JsonParse(String),
}

impl LogicError {
    pub fn format(message: impl Into<String>, position: usize) -> Self {
        LogicError::InvalidFormulaFormat {
            message: message.into(),
            position,
        }
    }

    pub fn illegal(reason: impl Into<String>) -> Self {
        LogicError::IllegalMove(reason.into())
    }
}

impl From<serde_json::Error> for LogicError {
    fn from(e: serde_json::Error) -> Self {
        LogicError::JsonParse(e.to_string())
    }
}

impl From<UnificationError> for LogicError {
    fn from(e: UnificationError) -> Self {
        LogicError::UnificationImpossible(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LogicError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_carries_position() {
        let err = LogicError::format("Unexpected token ')'", 4);
        assert_eq!(
            err.to_string(),
            "Invalid formula format: Unexpected token ')' (at position 4)"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let err: LogicError = serde_json::from_str::<u32>("{").unwrap_err().into();
        assert!(matches!(err, LogicError::JsonParse(_)));
    }
}
