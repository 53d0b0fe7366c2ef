//! Errors surfaced by store adapters.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Constraint allowing one pending invitation per (project, invitee).
pub const PENDING_INVITATION_CONSTRAINT: &str = "project_invites_pending_unique";

/// Constraint keeping task positions unique within a bucket.
pub const TASK_SLOT_CONSTRAINT: &str = "tasks_project_status_sort_index_key";

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated: {}", constraint.as_deref().unwrap_or("<unnamed>"))]
    UniqueViolation {
        /// Name of the violated constraint, when the backend reports one.
        constraint: Option<String>,
    },

    /// The transaction outlived its deadline and was rolled back.
    #[error("transaction exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    /// No connection could be obtained or the worker thread failed.
    #[error("store connection error: {0}")]
    Connection(String),

    /// A persisted row could not be mapped back into the domain.
    #[error("corrupt stored row: {0}")]
    Corrupt(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend error.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }

    /// Creates a connection error from any displayable cause.
    pub fn connection(cause: impl std::fmt::Display) -> Self {
        Self::Connection(cause.to_string())
    }

    /// Creates a corrupt-row error from any displayable cause.
    pub fn corrupt(cause: impl std::fmt::Display) -> Self {
        Self::Corrupt(cause.to_string())
    }

    /// Creates a unique violation for a named constraint.
    pub fn unique_violation(constraint: impl Into<String>) -> Self {
        Self::UniqueViolation {
            constraint: Some(constraint.into()),
        }
    }

    /// Returns `true` for unique-constraint violations.
    #[must_use]
    pub const fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}
