//! Error taxonomy shared by every board operation.
//!
//! Services return [`BoardError`]. Callers branch on [`BoardError::kind`]
//! and show [`BoardError::public_message`]; the `Display` output carries
//! store details and is meant for logs only.

use crate::invitation::domain::{InvitationDomainError, InvitationId, InvitationStatus};
use crate::project::domain::{ProjectDomainError, ProjectId};
use crate::store::ports::{PENDING_INVITATION_CONSTRAINT, StoreError};
use crate::task::domain::{TaskDomainError, TaskId};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// Coarse classification of a [`BoardError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was malformed; nothing was read or written.
    Validation,
    /// A referenced entity does not exist or is not visible to the actor.
    NotFound,
    /// The actor is not a member of the project.
    Forbidden,
    /// The request contradicts current state.
    Conflict,
    /// The store failed.
    Internal,
}

impl ErrorKind {
    /// Returns a stable lower-case label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Conflict => "conflict",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a lookup failed to find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    /// Project.
    Project(ProjectId),
    /// Task within a project.
    Task(TaskId),
    /// Invitation, or one not addressed to the actor.
    Invitation(InvitationId),
    /// User, by username.
    User(String),
}

impl NotFound {
    const fn public_message(&self) -> &'static str {
        match self {
            Self::Project(_) => "project not found",
            Self::Task(_) => "task not found",
            Self::Invitation(_) => "invite not found",
            Self::User(_) => "user not found",
        }
    }
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::Task(id) => write!(f, "task {id}"),
            Self::Invitation(id) => write!(f, "invitation {id}"),
            Self::User(username) => write!(f, "user {username:?}"),
        }
    }
}

/// Why a request conflicts with current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// A pending invitation already exists for the invitee.
    InvitationPending,
    /// The invitee already belongs to the project.
    AlreadyMember,
    /// Inviter and invitee are the same user.
    SelfInvitation,
    /// The invitation has already been answered.
    InvitationNotPending(InvitationStatus),
    /// The task changed bucket while the request waited for its locks.
    ConcurrentMove(TaskId),
    /// Some other uniqueness constraint rejected the write.
    UniqueViolation(Option<String>),
}

impl ConflictReason {
    const fn public_message(&self) -> &'static str {
        match self {
            Self::InvitationPending => "invite already pending",
            Self::AlreadyMember => "user is already a member",
            Self::SelfInvitation => "cannot invite yourself",
            Self::InvitationNotPending(_) => "invite is not pending",
            Self::ConcurrentMove(_) => "task was moved concurrently, retry",
            Self::UniqueViolation(_) => "conflicting record already exists",
        }
    }
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvitationNotPending(status) => write!(f, "invitation is {status}"),
            Self::ConcurrentMove(id) => write!(f, "task {id} moved concurrently"),
            Self::UniqueViolation(Some(constraint)) => {
                write!(f, "unique constraint {constraint} violated")
            }
            other => f.write_str(other.public_message()),
        }
    }
}

/// Errors returned by board services.
#[derive(Debug, Clone, Error)]
pub enum BoardError {
    /// Task input failed validation.
    #[error(transparent)]
    InvalidTask(#[from] TaskDomainError),

    /// Project, membership or actor input failed validation.
    #[error(transparent)]
    InvalidProject(#[from] ProjectDomainError),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(NotFound),

    /// The actor is not a member of the project.
    #[error("actor is not a member of project {0}")]
    Forbidden(ProjectId),

    /// The request conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(ConflictReason),

    /// Store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl BoardError {
    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTask(_) | Self::InvalidProject(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Returns a message safe to show to the actor.
    ///
    /// Validation messages describe the rejected field. Store failures are
    /// reported without their cause.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidTask(err) => err.to_string(),
            Self::InvalidProject(err) => err.to_string(),
            Self::NotFound(entity) => entity.public_message().to_owned(),
            Self::Forbidden(_) => "not a member of this project".to_owned(),
            Self::Conflict(reason) => reason.public_message().to_owned(),
            Self::Store(StoreError::DeadlineExceeded(_)) => "request timed out".to_owned(),
            Self::Store(_) => "internal error".to_owned(),
        }
    }
}

impl From<StoreError> for BoardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { constraint } => {
                if constraint.as_deref() == Some(PENDING_INVITATION_CONSTRAINT) {
                    Self::Conflict(ConflictReason::InvitationPending)
                } else {
                    Self::Conflict(ConflictReason::UniqueViolation(constraint))
                }
            }
            other => Self::Store(other),
        }
    }
}

impl From<InvitationDomainError> for BoardError {
    fn from(err: InvitationDomainError) -> Self {
        match err {
            InvitationDomainError::SelfInvitation => {
                Self::Conflict(ConflictReason::SelfInvitation)
            }
            InvitationDomainError::NotPending(status) => {
                Self::Conflict(ConflictReason::InvitationNotPending(status))
            }
        }
    }
}

/// Logs a failed operation at a level matching its kind.
pub(crate) fn log_rejection(operation: &'static str, err: &BoardError) {
    match err.kind() {
        ErrorKind::Internal => error!(operation, error = %err, "board operation failed"),
        kind => warn!(operation, %kind, error = %err, "board operation rejected"),
    }
}
