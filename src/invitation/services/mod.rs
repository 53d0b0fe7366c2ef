//! Application services for the invitation lifecycle.

mod lifecycle;

pub use lifecycle::{
    CreateInviteRequest, InvitationService, PROJECT_INVITE_LIST_LIMIT, RECEIVED_INVITE_LIST_LIMIT,
};
