//! [`StoreTransaction`] over a `PgConnection` inside an open transaction.

use super::models::{
    CountRow, InvitationRow, InvitationViewRow, MembershipRow, NewMembershipRow, ProjectRow,
    ReceivedInvitationRow, TaskChangeset, TaskRow, UserRow, from_index, to_index,
};
use super::schema::{project_invites, projects, projects_members, tasks, users};
use crate::invitation::domain::{
    Invitation, InvitationId, InvitationStatus, InvitationView, ReceivedInvitation,
};
use crate::project::domain::{Membership, Project, ProjectId, UserAccount, UserId, Username};
use crate::store::ports::{StoreError, StoreResult, StoreTransaction};
use crate::task::domain::{
    Bucket, Task, TaskId, TaskPatch,
    ordering::{Shift, ShiftOp},
    sort_board_order,
};
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{BigInt, Text};
use std::time::{Duration, Instant};

const PENDING: &str = "pending";
const DECLINED: &str = "declined";

/// Maps a Diesel error onto the store's error vocabulary.
pub(super) fn map_diesel_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
            StoreError::UniqueViolation {
                constraint: info.constraint_name().map(str::to_owned),
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, ref info) => {
            StoreError::connection(info.message())
        }
        other => StoreError::backend(other),
    }
}

pub(super) struct PgTransaction<'a> {
    conn: &'a mut PgConnection,
    started: Instant,
    deadline: Duration,
}

impl<'a> PgTransaction<'a> {
    pub(super) const fn new(
        conn: &'a mut PgConnection,
        started: Instant,
        deadline: Duration,
    ) -> Self {
        Self {
            conn,
            started,
            deadline,
        }
    }

    /// Statements cancelled by `statement_timeout` surface as backend
    /// errors; past the deadline they are reported as timeouts instead.
    fn fail(&self, err: DieselError) -> StoreError {
        let mapped = map_diesel_error(err);
        if !mapped.is_unique_violation() && self.started.elapsed() >= self.deadline {
            return StoreError::DeadlineExceeded(self.deadline);
        }
        mapped
    }

    fn username(&mut self, user: UserId) -> StoreResult<Option<String>> {
        users::table
            .find(user.into_inner())
            .select(users::username)
            .first::<String>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))
    }
}

impl StoreTransaction for PgTransaction<'_> {
    fn lock_bucket(&mut self, project: ProjectId, bucket: Bucket) -> StoreResult<u32> {
        let key = format!("{project}:{bucket}");
        diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind::<Text, _>(key)
            .execute(self.conn)
            .map_err(|err| self.fail(err))?;
        let counted = diesel::sql_query(concat!(
            "SELECT count(*) AS len FROM tasks ",
            "WHERE project_id = $1 AND status = $2",
        ))
        .bind::<diesel::sql_types::Uuid, _>(project.into_inner())
        .bind::<Text, _>(bucket.as_str())
        .get_result::<CountRow>(self.conn)
        .map_err(|err| self.fail(err))?;
        u32::try_from(counted.len)
            .map_err(|_| StoreError::corrupt(format!("bucket {bucket} length {}", counted.len)))
    }

    fn find_task(&mut self, project: ProjectId, task: TaskId) -> StoreResult<Option<Task>> {
        let row = tasks::table
            .left_join(users::table.on(tasks::assignee_id.eq(users::id.nullable())))
            .filter(tasks::id.eq(task.into_inner()))
            .filter(tasks::project_id.eq(project.into_inner()))
            .select((TaskRow::as_select(), users::username.nullable()))
            .first::<(TaskRow, Option<String>)>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))?;
        row.map(|(task_row, username)| task_row.into_task(username))
            .transpose()
    }

    fn find_task_for_update(
        &mut self,
        project: ProjectId,
        task: TaskId,
    ) -> StoreResult<Option<Task>> {
        let locked = tasks::table
            .filter(tasks::id.eq(task.into_inner()))
            .filter(tasks::project_id.eq(project.into_inner()))
            .select(TaskRow::as_select())
            .for_update()
            .first::<TaskRow>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))?;
        let Some(row) = locked else {
            return Ok(None);
        };
        let username = row
            .assignee_id
            .map(|assignee| self.username(UserId::from_uuid(assignee)))
            .transpose()?
            .flatten();
        row.into_task(username).map(Some)
    }

    fn insert_task(&mut self, task: &Task) -> StoreResult<()> {
        let row = TaskRow::from_domain(task)?;
        diesel::insert_into(tasks::table)
            .values(&row)
            .execute(self.conn)
            .map_err(|err| self.fail(err))?;
        Ok(())
    }

    fn update_task(
        &mut self,
        project: ProjectId,
        task: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>> {
        if patch.is_empty() {
            return self.find_task(project, task);
        }
        let changeset = TaskChangeset::from_patch(patch)?;
        let updated = diesel::update(
            tasks::table
                .filter(tasks::id.eq(task.into_inner()))
                .filter(tasks::project_id.eq(project.into_inner())),
        )
        .set(&changeset)
        .execute(self.conn)
        .map_err(|err| self.fail(err))?;
        if updated == 0 {
            return Ok(None);
        }
        self.find_task(project, task)
    }

    fn delete_task(&mut self, project: ProjectId, task: TaskId) -> StoreResult<bool> {
        let deleted = diesel::delete(
            tasks::table
                .filter(tasks::id.eq(task.into_inner()))
                .filter(tasks::project_id.eq(project.into_inner())),
        )
        .execute(self.conn)
        .map_err(|err| self.fail(err))?;
        Ok(deleted > 0)
    }

    fn shift_positions(&mut self, project: ProjectId, shift: &ShiftOp) -> StoreResult<u64> {
        let start = to_index(shift.range.start().value())?;
        let end = shift
            .range
            .end()
            .map(|end| to_index(end.value()))
            .transpose()?
            .unwrap_or(i32::MAX);
        let delta: i32 = match shift.shift {
            Shift::Up => 1,
            Shift::Down => -1,
        };
        let shifted = diesel::update(
            tasks::table
                .filter(tasks::project_id.eq(project.into_inner()))
                .filter(tasks::status.eq(shift.bucket.as_str()))
                .filter(tasks::sort_index.between(start, end)),
        )
        .set(tasks::sort_index.eq(tasks::sort_index + delta))
        .execute(self.conn)
        .map_err(|err| self.fail(err))?;
        u64::try_from(shifted).map_err(StoreError::corrupt)
    }

    fn list_tasks(&mut self, project: ProjectId) -> StoreResult<Vec<Task>> {
        let rows = tasks::table
            .left_join(users::table.on(tasks::assignee_id.eq(users::id.nullable())))
            .filter(tasks::project_id.eq(project.into_inner()))
            .select((TaskRow::as_select(), users::username.nullable()))
            .load::<(TaskRow, Option<String>)>(self.conn)
            .map_err(|err| self.fail(err))?;
        let mut loaded = rows
            .into_iter()
            .map(|(row, username)| row.into_task(username))
            .collect::<StoreResult<Vec<_>>>()?;
        sort_board_order(&mut loaded);
        Ok(loaded)
    }

    fn find_user(&mut self, user: UserId) -> StoreResult<Option<UserAccount>> {
        let row = users::table
            .find(user.into_inner())
            .select(UserRow::as_select())
            .first::<UserRow>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))?;
        row.map(UserRow::into_account).transpose()
    }

    fn find_user_by_username(&mut self, username: &Username) -> StoreResult<Option<UserAccount>> {
        let row = diesel::sql_query(
            "SELECT id, username FROM users WHERE lower(username) = lower($1) LIMIT 1",
        )
        .bind::<Text, _>(username.as_str())
        .get_result::<UserRow>(self.conn)
        .optional()
        .map_err(|err| self.fail(err))?;
        row.map(UserRow::into_account).transpose()
    }

    fn find_project(&mut self, project: ProjectId) -> StoreResult<Option<Project>> {
        let row = projects::table
            .find(project.into_inner())
            .select(ProjectRow::as_select())
            .first::<ProjectRow>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))?;
        row.map(ProjectRow::into_project).transpose()
    }

    fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        let row = ProjectRow::from_domain(project)?;
        diesel::insert_into(projects::table)
            .values(&row)
            .execute(self.conn)
            .map_err(|err| self.fail(err))?;
        Ok(())
    }

    fn next_project_sort_index(&mut self, owner: UserId) -> StoreResult<u32> {
        let highest = projects::table
            .filter(projects::owner_id.eq(owner.into_inner()))
            .select(diesel::dsl::max(projects::sort_index))
            .first::<Option<i32>>(self.conn)
            .map_err(|err| self.fail(err))?;
        Ok(highest
            .map(from_index)
            .transpose()?
            .map_or(0, |index| index.saturating_add(1)))
    }

    fn list_member_projects(&mut self, user: UserId) -> StoreResult<Vec<Project>> {
        let rows = projects::table
            .inner_join(projects_members::table)
            .filter(projects_members::user_id.eq(user.into_inner()))
            .order((projects::sort_index.asc(), projects::created_at.asc()))
            .select(ProjectRow::as_select())
            .load::<ProjectRow>(self.conn)
            .map_err(|err| self.fail(err))?;
        rows.into_iter().map(ProjectRow::into_project).collect()
    }

    fn is_member(&mut self, project: ProjectId, user: UserId) -> StoreResult<bool> {
        diesel::select(diesel::dsl::exists(
            projects_members::table
                .filter(projects_members::project_id.eq(project.into_inner()))
                .filter(projects_members::user_id.eq(user.into_inner())),
        ))
        .get_result::<bool>(self.conn)
        .map_err(|err| self.fail(err))
    }

    fn insert_membership(&mut self, membership: &Membership) -> StoreResult<bool> {
        let inserted = diesel::insert_into(projects_members::table)
            .values(NewMembershipRow::from(membership))
            .on_conflict_do_nothing()
            .execute(self.conn)
            .map_err(|err| self.fail(err))?;
        Ok(inserted > 0)
    }

    fn list_members(&mut self, project: ProjectId) -> StoreResult<Vec<Membership>> {
        let rows = projects_members::table
            .filter(projects_members::project_id.eq(project.into_inner()))
            .select(MembershipRow::as_select())
            .load::<MembershipRow>(self.conn)
            .map_err(|err| self.fail(err))?;
        let mut members = rows
            .into_iter()
            .map(MembershipRow::into_membership)
            .collect::<StoreResult<Vec<_>>>()?;
        members.sort_by_cached_key(|member| (member.username.folded(), member.user_id));
        Ok(members)
    }

    fn insert_invitation(&mut self, invitation: &Invitation) -> StoreResult<()> {
        diesel::insert_into(project_invites::table)
            .values(&InvitationRow::from_domain(invitation))
            .execute(self.conn)
            .map_err(|err| self.fail(err))?;
        Ok(())
    }

    fn find_pending_invitation(
        &mut self,
        project: ProjectId,
        invitee: UserId,
    ) -> StoreResult<Option<Invitation>> {
        let row = project_invites::table
            .filter(project_invites::project_id.eq(project.into_inner()))
            .filter(project_invites::invitee_id.eq(invitee.into_inner()))
            .filter(project_invites::status.eq(PENDING))
            .select(InvitationRow::as_select())
            .first::<InvitationRow>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))?;
        row.map(InvitationRow::into_invitation).transpose()
    }

    fn find_invitation_for_update(
        &mut self,
        invitation: InvitationId,
    ) -> StoreResult<Option<Invitation>> {
        let row = project_invites::table
            .find(invitation.into_inner())
            .select(InvitationRow::as_select())
            .for_update()
            .first::<InvitationRow>(self.conn)
            .optional()
            .map_err(|err| self.fail(err))?;
        row.map(InvitationRow::into_invitation).transpose()
    }

    fn decline_invitation(
        &mut self,
        invitation: InvitationId,
        invitee: UserId,
        responded_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let declined = diesel::update(
            project_invites::table
                .filter(project_invites::id.eq(invitation.into_inner()))
                .filter(project_invites::invitee_id.eq(invitee.into_inner()))
                .filter(project_invites::status.eq(PENDING)),
        )
        .set((
            project_invites::status.eq(DECLINED),
            project_invites::responded_at.eq(Some(responded_at)),
        ))
        .execute(self.conn)
        .map_err(|err| self.fail(err))?;
        Ok(declined > 0)
    }

    fn delete_invitation(&mut self, invitation: InvitationId) -> StoreResult<bool> {
        let deleted = diesel::delete(project_invites::table.find(invitation.into_inner()))
            .execute(self.conn)
            .map_err(|err| self.fail(err))?;
        Ok(deleted > 0)
    }

    fn list_project_invitations(
        &mut self,
        project: ProjectId,
        limit: u32,
    ) -> StoreResult<Vec<InvitationView>> {
        let rows = diesel::sql_query(concat!(
            "SELECT i.id, i.project_id, i.inviter_id, i.invitee_id, i.role_key, i.status, ",
            "i.created_at, i.responded_at, ",
            "inviter.username AS inviter_username, invitee.username AS invitee_username ",
            "FROM project_invites i ",
            "JOIN users inviter ON inviter.id = i.inviter_id ",
            "JOIN users invitee ON invitee.id = i.invitee_id ",
            "WHERE i.project_id = $1 ",
            "ORDER BY i.created_at DESC LIMIT $2",
        ))
        .bind::<diesel::sql_types::Uuid, _>(project.into_inner())
        .bind::<BigInt, _>(i64::from(limit))
        .load::<InvitationViewRow>(self.conn)
        .map_err(|err| self.fail(err))?;
        rows.into_iter().map(InvitationViewRow::into_view).collect()
    }

    fn list_received_invitations(
        &mut self,
        invitee: UserId,
        status: InvitationStatus,
        limit: u32,
    ) -> StoreResult<Vec<ReceivedInvitation>> {
        let rows = diesel::sql_query(concat!(
            "SELECT i.id, i.project_id, p.name AS project_name, i.inviter_id, ",
            "inviter.username AS inviter_username, i.role_key, i.status, i.created_at ",
            "FROM project_invites i ",
            "JOIN projects p ON p.id = i.project_id ",
            "JOIN users inviter ON inviter.id = i.inviter_id ",
            "WHERE i.invitee_id = $1 AND i.status = $2 ",
            "ORDER BY i.created_at DESC LIMIT $3",
        ))
        .bind::<diesel::sql_types::Uuid, _>(invitee.into_inner())
        .bind::<Text, _>(status.as_str())
        .bind::<BigInt, _>(i64::from(limit))
        .load::<ReceivedInvitationRow>(self.conn)
        .map_err(|err| self.fail(err))?;
        rows.into_iter()
            .map(ReceivedInvitationRow::into_received)
            .collect()
    }
}
