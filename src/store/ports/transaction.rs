//! Transaction contract shared by all board services.
//!
//! [`StoreTransaction`] is synchronous and object safe: services express
//! their work as a closure over `&mut dyn StoreTransaction`, and the
//! [`TransactionalStore`] runs that closure inside one backend transaction,
//! committing only when it returns `Ok`.

use super::{StoreError, StoreResult};
use crate::invitation::domain::{
    Invitation, InvitationId, InvitationStatus, InvitationView, ReceivedInvitation,
};
use crate::project::domain::{Membership, Project, ProjectId, UserAccount, UserId, Username};
use crate::task::domain::{Bucket, Task, TaskId, TaskPatch, ordering::ShiftOp};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Operations available inside an open store transaction.
///
/// Nothing written through this trait is visible to other transactions
/// until commit.
#[cfg_attr(test, mockall::automock)]
pub trait StoreTransaction {
    /// Takes the exclusive lock for one (project, bucket) pair and returns
    /// the number of tasks the bucket holds.
    ///
    /// The lock is held until the transaction ends. Callers locking more
    /// than one bucket must do so in ascending [`Bucket::rank`] order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn lock_bucket(&mut self, project: ProjectId, bucket: Bucket) -> StoreResult<u32>;

    /// Reads a task without locking it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_task(&mut self, project: ProjectId, task: TaskId) -> StoreResult<Option<Task>>;

    /// Reads a task and locks its row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_task_for_update(
        &mut self,
        project: ProjectId,
        task: TaskId,
    ) -> StoreResult<Option<Task>>;

    /// Writes a new task at its slot. Callers open the slot first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] when the identifier exists.
    fn insert_task(&mut self, task: &Task) -> StoreResult<()>;

    /// Applies a patch and returns the updated task, or `None` when the task
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn update_task(
        &mut self,
        project: ProjectId,
        task: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>>;

    /// Deletes a task and returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn delete_task(&mut self, project: ProjectId, task: TaskId) -> StoreResult<bool>;

    /// Shifts every task of `project` matched by `shift` and returns the
    /// number of rows touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn shift_positions(&mut self, project: ProjectId, shift: &ShiftOp) -> StoreResult<u64>;

    /// Lists the tasks of a project in board order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list_tasks(&mut self, project: ProjectId) -> StoreResult<Vec<Task>>;

    /// Looks a user up by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_user(&mut self, user: UserId) -> StoreResult<Option<UserAccount>>;

    /// Looks a user up by username, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_user_by_username(&mut self, username: &Username) -> StoreResult<Option<UserAccount>>;

    /// Reads a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_project(&mut self, project: ProjectId) -> StoreResult<Option<Project>>;

    /// Writes a new project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] when the identifier exists.
    fn insert_project(&mut self, project: &Project) -> StoreResult<()>;

    /// Returns the next free sort index among projects owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn next_project_sort_index(&mut self, owner: UserId) -> StoreResult<u32>;

    /// Lists projects `user` belongs to, ordered by sort index then
    /// creation time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list_member_projects(&mut self, user: UserId) -> StoreResult<Vec<Project>>;

    /// Returns whether `user` is a member of `project`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn is_member(&mut self, project: ProjectId, user: UserId) -> StoreResult<bool>;

    /// Inserts a membership unless one exists for the same pair. Returns
    /// `true` when a row was written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn insert_membership(&mut self, membership: &Membership) -> StoreResult<bool>;

    /// Lists members of a project ordered by lower-cased username.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list_members(&mut self, project: ProjectId) -> StoreResult<Vec<Membership>>;

    /// Writes a new invitation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UniqueViolation`] when a pending invitation
    /// already exists for the same project and invitee.
    fn insert_invitation(&mut self, invitation: &Invitation) -> StoreResult<()>;

    /// Returns the pending invitation for (`project`, `invitee`), if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_pending_invitation(
        &mut self,
        project: ProjectId,
        invitee: UserId,
    ) -> StoreResult<Option<Invitation>>;

    /// Reads an invitation and locks its row until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn find_invitation_for_update(
        &mut self,
        invitation: InvitationId,
    ) -> StoreResult<Option<Invitation>>;

    /// Declines the invitation if it is pending and addressed to `invitee`.
    /// Returns `true` when a row matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn decline_invitation(
        &mut self,
        invitation: InvitationId,
        invitee: UserId,
        responded_at: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Deletes an invitation and returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn delete_invitation(&mut self, invitation: InvitationId) -> StoreResult<bool>;

    /// Lists up to `limit` invitations of a project, newest first, with
    /// both usernames.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list_project_invitations(
        &mut self,
        project: ProjectId,
        limit: u32,
    ) -> StoreResult<Vec<InvitationView>>;

    /// Lists up to `limit` invitations addressed to `invitee` in `status`,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the backend fails.
    fn list_received_invitations(
        &mut self,
        invitee: UserId,
        status: InvitationStatus,
        limit: u32,
    ) -> StoreResult<Vec<ReceivedInvitation>>;
}

/// A store able to run closures inside a transaction.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    /// Runs `operation` inside one transaction.
    ///
    /// The transaction commits when `operation` returns `Ok` and the
    /// deadline has not elapsed; otherwise every write is rolled back.
    ///
    /// # Errors
    ///
    /// Returns the operation's error, or a [`StoreError`] converted into `E`
    /// when the backend fails or the deadline is exceeded.
    async fn transaction<T, E, F>(&self, deadline: Duration, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static;
}
