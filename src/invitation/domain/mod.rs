//! Domain model for project invitations.
//!
//! An invitation starts `pending` and ends either `declined` (retained) or
//! accepted, in which case it is replaced by a membership.

mod error;
mod ids;
mod invitation;

pub use error::{InvitationDomainError, ParseInvitationStatusError};
pub use ids::InvitationId;
pub use invitation::{
    Invitation, InvitationStatus, InvitationView, PersistedInvitationData, ProjectInvites,
    ReceivedInvitation,
};
