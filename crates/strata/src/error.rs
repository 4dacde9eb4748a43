//! Error types for strata operations.
//!
//! Errors fall into three groups that callers treat differently:
//!
//! - **Rejected preconditions** (`NotFound`, `Cycle`, `InvalidLevel`): the
//!   request itself is wrong. Retrying with different input may succeed.
//! - **Store failures** (`Database`, `Storage`): propagated unchanged from the
//!   backend. The engine never retries them.
//! - **Ambient failures** (`Io`, `Config`, `Json`, `Internal`): configuration
//!   and plumbing problems around the engine.
//!
//! Impact analyses never raise for unknown seed ids; they return `Ok(None)`.

use thiserror::Error;

use crate::types::ProcessId;

/// Result type for strata operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for strata operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of entity that was looked up (e.g. "business process")
        entity: &'static str,
        /// The id that failed to resolve
        id: i64,
    },

    /// Attaching `process` under `parent` would make a process its own ancestor
    #[error("cannot move process {process} under {parent}: a process cannot be moved to itself or its descendants")]
    Cycle {
        /// Process being attached
        process: ProcessId,
        /// Proposed parent
        parent: ProcessId,
    },

    /// The hierarchy would gain a level below C
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Store-level constraint failure in a non-SQL backend
    #[error("storage error: {0}")]
    Storage(String),

    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or arguments
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal invariant broken
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a missing business process.
    #[must_use]
    pub fn process_not_found(id: ProcessId) -> Self {
        Self::NotFound {
            entity: "business process",
            id: id.as_i64(),
        }
    }

    /// Returns `true` if the request was rejected because of its input.
    ///
    /// Callers use this to decide between retrying with different input and
    /// aborting on an infrastructure failure.
    #[must_use]
    pub fn is_rejected_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Cycle { .. } | Self::InvalidLevel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_errors_are_distinguished_from_store_failures() {
        assert!(Error::process_not_found(ProcessId(3)).is_rejected_precondition());
        assert!(
            Error::Cycle {
                process: ProcessId(1),
                parent: ProcessId(2)
            }
            .is_rejected_precondition()
        );
        assert!(Error::InvalidLevel("x".into()).is_rejected_precondition());

        assert!(!Error::Storage("fk".into()).is_rejected_precondition());
        assert!(!Error::Internal("bug".into()).is_rejected_precondition());
    }

    #[test]
    fn messages_name_the_failure_kind() {
        let not_found = Error::process_not_found(ProcessId(7)).to_string();
        assert_eq!(not_found, "business process not found: 7");

        let cycle = Error::Cycle {
            process: ProcessId(1),
            parent: ProcessId(2),
        }
        .to_string();
        assert!(cycle.contains("itself or its descendants"));

        let level = Error::InvalidLevel("Cannot add children to Level C process".into());
        assert!(level.to_string().starts_with("invalid level"));
    }
}
