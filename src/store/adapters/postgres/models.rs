//! Diesel row models and their conversions into domain types.

use super::schema::{project_invites, projects, projects_members, tasks, users};
use crate::invitation::domain::{
    Invitation, InvitationId, InvitationStatus, InvitationView, PersistedInvitationData,
    ReceivedInvitation,
};
use crate::project::domain::{
    Membership, PersistedProjectData, Project, ProjectId, ProjectName, RoleKey, UserAccount,
    UserId, Username,
};
use crate::store::ports::{StoreError, StoreResult};
use crate::task::domain::{
    AssigneeUpdate, Bucket, Difficulty, PersistedTaskData, Position, Task, TaskId, TaskPatch,
    TaskTitle,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

/// Query result row for user records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: Uuid,
    /// Display name.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub username: String,
}

impl UserRow {
    pub(super) fn into_account(self) -> StoreResult<UserAccount> {
        Ok(UserAccount::new(
            UserId::from_uuid(self.id),
            parse_username(self.username)?,
        ))
    }
}

/// Query result and insert row for project records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProjectRow {
    /// Project identifier.
    pub id: Uuid,
    /// Project name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Owner.
    pub owner_id: Uuid,
    /// Position in the owner's list.
    pub sort_index: i32,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ProjectRow {
    pub(super) fn from_domain(project: &Project) -> StoreResult<Self> {
        Ok(Self {
            id: project.id().into_inner(),
            name: project.name().as_str().to_owned(),
            description: project.description().to_owned(),
            owner_id: project.owner_id().into_inner(),
            sort_index: to_index(project.sort_index())?,
            created_at: project.created_at(),
        })
    }

    pub(super) fn into_project(self) -> StoreResult<Project> {
        Ok(Project::from_persisted(PersistedProjectData {
            id: ProjectId::from_uuid(self.id),
            name: ProjectName::new(self.name).map_err(StoreError::corrupt)?,
            description: self.description,
            owner_id: UserId::from_uuid(self.owner_id),
            sort_index: from_index(self.sort_index)?,
            created_at: self.created_at,
        }))
    }
}

/// Query result row for memberships.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MembershipRow {
    /// Project the grant belongs to.
    pub project_id: Uuid,
    /// Member.
    pub user_id: Uuid,
    /// Captured username.
    pub username: String,
    /// Granted role.
    pub role_key: String,
}

impl MembershipRow {
    pub(super) fn into_membership(self) -> StoreResult<Membership> {
        Ok(Membership::new(
            ProjectId::from_uuid(self.project_id),
            UserId::from_uuid(self.user_id),
            parse_username(self.username)?,
            parse_role(self.role_key)?,
        ))
    }
}

/// Insert model for memberships. `created_at` uses the column default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects_members)]
pub struct NewMembershipRow {
    /// Project the grant belongs to.
    pub project_id: Uuid,
    /// Member.
    pub user_id: Uuid,
    /// Captured username.
    pub username: String,
    /// Granted role.
    pub role_key: String,
}

impl From<&Membership> for NewMembershipRow {
    fn from(membership: &Membership) -> Self {
        Self {
            project_id: membership.project_id.into_inner(),
            user_id: membership.user_id.into_inner(),
            username: membership.username.as_str().to_owned(),
            role_key: membership.role_key.as_str().to_owned(),
        }
    }
}

/// Query result and insert row for task records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// Title.
    pub title: String,
    /// Details.
    pub details: String,
    /// Bucket name.
    pub status: String,
    /// Position within the bucket.
    pub sort_index: i32,
    /// Optional assignee.
    pub assignee_id: Option<Uuid>,
    /// Effort estimate.
    pub difficulty: i16,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TaskRow {
    pub(super) fn from_domain(task: &Task) -> StoreResult<Self> {
        Ok(Self {
            id: task.id().into_inner(),
            project_id: task.project_id().into_inner(),
            title: task.title().as_str().to_owned(),
            details: task.details().to_owned(),
            status: task.bucket().as_str().to_owned(),
            sort_index: to_index(task.position().value())?,
            assignee_id: task.assignee_id().map(UserId::into_inner),
            difficulty: i16::from(task.difficulty().value()),
            created_at: task.created_at(),
        })
    }

    pub(super) fn into_task(self, assignee_username: Option<String>) -> StoreResult<Task> {
        let assignee_username = assignee_username.map(parse_username).transpose()?;
        Ok(Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            title: TaskTitle::new(self.title).map_err(StoreError::corrupt)?,
            details: self.details,
            bucket: parse_bucket(&self.status)?,
            position: Position::from_index(from_index(self.sort_index)?),
            assignee_id: self.assignee_id.map(UserId::from_uuid),
            assignee_username,
            difficulty: Difficulty::new(i64::from(self.difficulty))
                .map_err(StoreError::corrupt)?,
            created_at: self.created_at,
        }))
    }
}

/// Partial update for a task row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    /// New bucket name.
    pub status: Option<String>,
    /// New position.
    pub sort_index: Option<i32>,
    /// New details.
    pub details: Option<String>,
    /// New difficulty.
    pub difficulty: Option<i16>,
    /// `Some(None)` clears the assignee.
    pub assignee_id: Option<Option<Uuid>>,
}

impl TaskChangeset {
    pub(super) fn from_patch(patch: &TaskPatch) -> StoreResult<Self> {
        let sort_index = patch
            .slot
            .map(|slot| to_index(slot.position.value()))
            .transpose()?;
        let assignee_id = match patch.assignee {
            AssigneeUpdate::Unchanged => None,
            AssigneeUpdate::Clear => Some(None),
            AssigneeUpdate::Set(user) => Some(Some(user.into_inner())),
        };
        Ok(Self {
            status: patch.slot.map(|slot| slot.bucket.as_str().to_owned()),
            sort_index,
            details: patch.details.as_deref().map(|details| details.trim().to_owned()),
            difficulty: patch.difficulty.map(|difficulty| i16::from(difficulty.value())),
            assignee_id,
        })
    }
}

/// Query result and insert row for invitations.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = project_invites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvitationRow {
    /// Invitation identifier.
    pub id: Uuid,
    /// Target project.
    pub project_id: Uuid,
    /// Sending member.
    pub inviter_id: Uuid,
    /// Addressed user.
    pub invitee_id: Uuid,
    /// Role granted on acceptance.
    pub role_key: String,
    /// Lifecycle status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Response timestamp.
    pub responded_at: Option<DateTime<Utc>>,
}

impl InvitationRow {
    pub(super) fn from_domain(invitation: &Invitation) -> Self {
        Self {
            id: invitation.id().into_inner(),
            project_id: invitation.project_id().into_inner(),
            inviter_id: invitation.inviter_id().into_inner(),
            invitee_id: invitation.invitee_id().into_inner(),
            role_key: invitation.role_key().as_str().to_owned(),
            status: invitation.status().as_str().to_owned(),
            created_at: invitation.created_at(),
            responded_at: invitation.responded_at(),
        }
    }

    pub(super) fn into_invitation(self) -> StoreResult<Invitation> {
        Ok(Invitation::from_persisted(PersistedInvitationData {
            id: InvitationId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            inviter_id: UserId::from_uuid(self.inviter_id),
            invitee_id: UserId::from_uuid(self.invitee_id),
            role_key: parse_role(self.role_key)?,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            responded_at: self.responded_at,
        }))
    }
}

/// Invitation joined with both usernames, read through raw SQL.
#[derive(Debug, Clone, QueryableByName)]
pub struct InvitationViewRow {
    /// Invitation identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: Uuid,
    /// Target project.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub project_id: Uuid,
    /// Sending member.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub inviter_id: Uuid,
    /// Addressed user.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub invitee_id: Uuid,
    /// Role granted on acceptance.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub role_key: String,
    /// Lifecycle status.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub status: String,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Response timestamp.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub responded_at: Option<DateTime<Utc>>,
    /// Inviter's directory username.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub inviter_username: String,
    /// Invitee's directory username.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub invitee_username: String,
}

impl InvitationViewRow {
    pub(super) fn into_view(self) -> StoreResult<InvitationView> {
        let Self {
            id,
            project_id,
            inviter_id,
            invitee_id,
            role_key,
            status,
            created_at,
            responded_at,
            inviter_username,
            invitee_username,
        } = self;
        let invitation = InvitationRow {
            id,
            project_id,
            inviter_id,
            invitee_id,
            role_key,
            status,
            created_at,
            responded_at,
        }
        .into_invitation()?;
        Ok(InvitationView {
            invitation,
            inviter_username: parse_username(inviter_username)?,
            invitee_username: parse_username(invitee_username)?,
        })
    }
}

/// Invitation joined with its project name and inviter, read through raw SQL.
#[derive(Debug, Clone, QueryableByName)]
pub struct ReceivedInvitationRow {
    /// Invitation identifier.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub id: Uuid,
    /// Target project.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub project_id: Uuid,
    /// Target project's name.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub project_name: String,
    /// Sending member.
    #[diesel(sql_type = diesel::sql_types::Uuid)]
    pub inviter_id: Uuid,
    /// Sending member's username.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub inviter_username: String,
    /// Role granted on acceptance.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub role_key: String,
    /// Lifecycle status.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub status: String,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
}

impl ReceivedInvitationRow {
    pub(super) fn into_received(self) -> StoreResult<ReceivedInvitation> {
        Ok(ReceivedInvitation {
            id: InvitationId::from_uuid(self.id),
            project_id: ProjectId::from_uuid(self.project_id),
            project_name: ProjectName::new(self.project_name).map_err(StoreError::corrupt)?,
            inviter_id: UserId::from_uuid(self.inviter_id),
            inviter_username: parse_username(self.inviter_username)?,
            role_key: parse_role(self.role_key)?,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// Row shape for `SELECT count(*) AS len`.
#[derive(Debug, Clone, Copy, QueryableByName)]
pub struct CountRow {
    /// Number of matching rows.
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub len: i64,
}

pub(super) fn to_index(value: u32) -> StoreResult<i32> {
    i32::try_from(value).map_err(|_| StoreError::corrupt(format!("index {value} exceeds int4")))
}

pub(super) fn from_index(value: i32) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::corrupt(format!("negative index {value}")))
}

fn parse_username(value: String) -> StoreResult<Username> {
    Username::new(value).map_err(StoreError::corrupt)
}

fn parse_role(value: String) -> StoreResult<RoleKey> {
    RoleKey::new(value).map_err(StoreError::corrupt)
}

fn parse_bucket(value: &str) -> StoreResult<Bucket> {
    Bucket::try_from(value).map_err(StoreError::corrupt)
}

fn parse_status(value: &str) -> StoreResult<InvitationStatus> {
    InvitationStatus::try_from(value).map_err(StoreError::corrupt)
}
