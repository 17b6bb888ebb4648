use thiserror::Error;

use crate::StateVersion;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised by the query engine and the state service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed pagination, order or selection input.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// An overlay write carried a version stamp that is no longer current.
    #[error("state version conflict: expected {expected}, current is {actual}")]
    Conflict {
        expected: StateVersion,
        actual: StateVersion,
    },
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}
