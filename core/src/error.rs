//! Error types for the Ember core.

use thiserror::Error;

/// Errors raised by the node model and iteration engines.
///
/// Kind mismatches and malformed multi-symbols are not errors; those APIs
/// return `None` so callers can treat "not this kind" as control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmberError {
    #[error("allpairs expects a table, got {found}")]
    NotATable { found: &'static str },

    #[error("{found} cannot be used as a table key")]
    InvalidKey { found: String },
}

pub type Result<T> = std::result::Result<T, EmberError>;
