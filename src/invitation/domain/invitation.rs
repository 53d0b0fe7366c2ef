//! Invitation aggregate and the read models built around it.

use super::{InvitationDomainError, InvitationId, ParseInvitationStatusError};
use crate::project::domain::{ProjectId, ProjectName, RoleKey, UserId, Username};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Invitation lifecycle state.
///
/// `Accepted` is never stored durably: acceptance creates a membership and
/// deletes the invitation in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Awaiting the invitee's answer.
    Pending,
    /// Accepted by the invitee.
    Accepted,
    /// Declined by the invitee.
    Declined,
}

impl InvitationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    /// Returns `true` for the initial state.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns `true` when the inviter may delete an invitation in this
    /// state: a pending one is revoked, a declined one is cleared.
    #[must_use]
    pub const fn is_deletable_by_inviter(self) -> bool {
        matches!(self, Self::Pending | Self::Declined)
    }
}

impl TryFrom<&str> for InvitationStatus {
    type Error = ParseInvitationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            _ => Err(ParseInvitationStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed membership awaiting the invitee's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    id: InvitationId,
    project_id: ProjectId,
    inviter_id: UserId,
    invitee_id: UserId,
    role_key: RoleKey,
    status: InvitationStatus,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedInvitationData {
    /// Persisted identifier.
    pub id: InvitationId,
    /// Persisted project.
    pub project_id: ProjectId,
    /// Persisted inviter.
    pub inviter_id: UserId,
    /// Persisted invitee.
    pub invitee_id: UserId,
    /// Persisted role key.
    pub role_key: RoleKey,
    /// Persisted status.
    pub status: InvitationStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted response timestamp.
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invitation {
    /// Creates a pending invitation.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::SelfInvitation`] when inviter and
    /// invitee are the same user.
    pub fn new(
        project_id: ProjectId,
        inviter_id: UserId,
        invitee_id: UserId,
        role_key: RoleKey,
        clock: &impl Clock,
    ) -> Result<Self, InvitationDomainError> {
        if inviter_id == invitee_id {
            return Err(InvitationDomainError::SelfInvitation);
        }
        Ok(Self {
            id: InvitationId::new(),
            project_id,
            inviter_id,
            invitee_id,
            role_key,
            status: InvitationStatus::Pending,
            created_at: clock.utc(),
            responded_at: None,
        })
    }

    /// Reconstructs an invitation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedInvitationData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            inviter_id: data.inviter_id,
            invitee_id: data.invitee_id,
            role_key: data.role_key,
            status: data.status,
            created_at: data.created_at,
            responded_at: data.responded_at,
        }
    }

    /// Returns the invitation identifier.
    #[must_use]
    pub const fn id(&self) -> InvitationId {
        self.id
    }

    /// Returns the project the invitation grants access to.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the inviting user.
    #[must_use]
    pub const fn inviter_id(&self) -> UserId {
        self.inviter_id
    }

    /// Returns the invited user.
    #[must_use]
    pub const fn invitee_id(&self) -> UserId {
        self.invitee_id
    }

    /// Returns the role the membership will carry.
    #[must_use]
    pub const fn role_key(&self) -> &RoleKey {
        &self.role_key
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn status(&self) -> InvitationStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the invitee answered, if they have.
    #[must_use]
    pub const fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    /// Ensures the invitation can still be answered.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::NotPending`] for answered
    /// invitations.
    pub const fn ensure_pending(&self) -> Result<(), InvitationDomainError> {
        if self.status.is_pending() {
            Ok(())
        } else {
            Err(InvitationDomainError::NotPending(self.status))
        }
    }

    /// Marks the invitation declined at `at`.
    ///
    /// # Errors
    ///
    /// Returns [`InvitationDomainError::NotPending`] for answered
    /// invitations.
    pub fn decline(&mut self, at: DateTime<Utc>) -> Result<(), InvitationDomainError> {
        self.ensure_pending()?;
        self.status = InvitationStatus::Declined;
        self.responded_at = Some(at);
        Ok(())
    }
}

/// Invitation joined with the usernames of both parties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationView {
    /// The invitation.
    pub invitation: Invitation,
    /// Username of the inviter.
    pub inviter_username: Username,
    /// Username of the invitee.
    pub invitee_username: Username,
}

/// A project's invitations grouped by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInvites {
    /// Invitations awaiting an answer.
    pub pending: Vec<InvitationView>,
    /// Invitations the invitee declined.
    pub declined: Vec<InvitationView>,
    /// Accepted invitations. Empty unless accepted rows are retained.
    pub accepted: Vec<InvitationView>,
}

impl ProjectInvites {
    /// Groups views by status, preserving their order within each group.
    #[must_use]
    pub fn partition(views: impl IntoIterator<Item = InvitationView>) -> Self {
        let mut grouped = Self::default();
        for view in views {
            match view.invitation.status() {
                InvitationStatus::Pending => grouped.pending.push(view),
                InvitationStatus::Declined => grouped.declined.push(view),
                InvitationStatus::Accepted => grouped.accepted.push(view),
            }
        }
        grouped
    }

    /// Returns the total number of invitations across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len() + self.declined.len() + self.accepted.len()
    }

    /// Returns `true` when no group holds an invitation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An invitation as seen by its invitee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedInvitation {
    /// Invitation identifier.
    pub id: InvitationId,
    /// Project the invitation is for.
    pub project_id: ProjectId,
    /// Name of that project.
    pub project_name: ProjectName,
    /// Inviting user.
    pub inviter_id: UserId,
    /// Username of the inviting user.
    pub inviter_username: Username,
    /// Role offered.
    pub role_key: RoleKey,
    /// Current status.
    pub status: InvitationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
