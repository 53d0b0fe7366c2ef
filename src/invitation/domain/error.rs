//! Error types for invitation rules and parsing.

use super::InvitationStatus;
use thiserror::Error;

/// Errors returned by invitation lifecycle rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvitationDomainError {
    /// The inviter named themselves as invitee.
    #[error("cannot invite yourself")]
    SelfInvitation,

    /// The invitation has already been answered.
    #[error("invitation is {0}, expected pending")]
    NotPending(InvitationStatus),
}

/// Error returned while parsing an invitation status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown invitation status: {0}")]
pub struct ParseInvitationStatusError(pub String);
