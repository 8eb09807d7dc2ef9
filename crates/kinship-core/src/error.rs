//! Error types for projections and clone resolution.
//!
//! Every fatal variant names the entity kind and ID it was raised for so a
//! failure can be traced back to the offending history without re-running
//! the query.

use kinship_log::LogError;
use kinship_types::EntityKind;
use uuid::Uuid;

/// Errors raised while deriving facts from the event log.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No event mentions the entity: it never existed.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind of the missing entity.
        kind: EntityKind,
        /// ID of the missing entity.
        id: Uuid,
    },

    /// The entity's history violates a log invariant (for example, edits
    /// without a creation event). Not recoverable by retrying.
    #[error("inconsistent history for {kind} {id}: {reason}")]
    InconsistentHistory {
        /// Kind of the entity.
        kind: EntityKind,
        /// ID of the entity.
        id: Uuid,
        /// What is wrong with the history.
        reason: String,
    },

    /// Following clone links revisited a node or exceeded the depth bound.
    #[error("clone chain of {kind} {id} is cyclic or deeper than {depth} links")]
    CycleDetected {
        /// Kind of the entity.
        kind: EntityKind,
        /// The entity the traversal started from.
        id: Uuid,
        /// Number of links followed when the traversal stopped.
        depth: usize,
    },

    /// The event log failed.
    #[error("event log error during {operation}: {source}")]
    Storage {
        /// The resolver operation that was running.
        operation: &'static str,
        /// The underlying log error.
        #[source]
        source: LogError,
    },

    /// A stored event could not be decoded into its typed payload.
    #[error("undecodable payload at log position {seq}: {source}")]
    Payload {
        /// Log position of the event.
        seq: i64,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// An external collaborator failed.
    #[error("collaborator error: {message}")]
    Collaborator {
        /// Description of the failure.
        message: String,
    },
}

impl ResolveError {
    /// Whether the caller may retry the operation unchanged.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Storage { source, .. } => source.is_retryable(),
            Self::NotFound { .. }
            | Self::InconsistentHistory { .. }
            | Self::CycleDetected { .. }
            | Self::Payload { .. }
            | Self::Collaborator { .. } => false,
        }
    }

    /// Adapter for `map_err` on log calls made by `operation`.
    pub fn storage(operation: &'static str) -> impl FnOnce(LogError) -> Self {
        move |source| Self::Storage { operation, source }
    }

    /// Build an [`ResolveError::InconsistentHistory`].
    pub fn inconsistent(kind: EntityKind, id: Uuid, reason: impl Into<String>) -> Self {
        Self::InconsistentHistory {
            kind,
            id,
            reason: reason.into(),
        }
    }
}
