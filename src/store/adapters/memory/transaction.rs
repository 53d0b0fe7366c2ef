//! Working-copy transaction over the in-memory board state.

use crate::invitation::domain::{
    Invitation, InvitationId, InvitationStatus, InvitationView, ReceivedInvitation,
};
use crate::project::domain::{Membership, Project, ProjectId, UserAccount, UserId, Username};
use crate::store::ports::{
    PENDING_INVITATION_CONSTRAINT, StoreError, StoreResult, StoreTransaction,
    TASK_SLOT_CONSTRAINT,
};
use crate::task::domain::{
    Bucket, Slot, Task, TaskId, TaskPatch, ordering::ShiftOp, sort_board_order,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub(super) struct BoardState {
    pub(super) users: HashMap<UserId, UserAccount>,
    projects: HashMap<ProjectId, Project>,
    memberships: HashMap<(ProjectId, UserId), Membership>,
    tasks: HashMap<TaskId, Task>,
    invitations: HashMap<InvitationId, Invitation>,
}

impl BoardState {
    /// Commit-time check mirroring the deferred slot constraint.
    pub(super) fn check_task_slots(&self) -> StoreResult<()> {
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in self.tasks.values() {
            if !seen.insert((task.project_id(), task.bucket(), task.position())) {
                return Err(StoreError::unique_violation(TASK_SLOT_CONSTRAINT));
            }
        }
        Ok(())
    }

    fn username_of(&self, user: UserId) -> Option<Username> {
        self.users.get(&user).map(|account| account.username.clone())
    }

    fn joined(&self, task: &Task) -> Task {
        let username = task.assignee_id().and_then(|id| self.username_of(id));
        task.clone().with_assignee_username(username)
    }

    fn task_in(&self, project: ProjectId, task: TaskId) -> Option<&Task> {
        self.tasks
            .get(&task)
            .filter(|stored| stored.project_id() == project)
    }
}

pub(super) struct MemoryTransaction<'a> {
    state: &'a mut BoardState,
}

impl<'a> MemoryTransaction<'a> {
    pub(super) const fn new(state: &'a mut BoardState) -> Self {
        Self { state }
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn lock_bucket(&mut self, project: ProjectId, bucket: Bucket) -> StoreResult<u32> {
        let len = self
            .state
            .tasks
            .values()
            .filter(|task| task.project_id() == project && task.bucket() == bucket)
            .count();
        u32::try_from(len).map_err(|_| StoreError::corrupt(format!("bucket {bucket} overflow")))
    }

    fn find_task(&mut self, project: ProjectId, task: TaskId) -> StoreResult<Option<Task>> {
        Ok(self
            .state
            .task_in(project, task)
            .map(|stored| self.state.joined(stored)))
    }

    fn find_task_for_update(
        &mut self,
        project: ProjectId,
        task: TaskId,
    ) -> StoreResult<Option<Task>> {
        self.find_task(project, task)
    }

    fn insert_task(&mut self, task: &Task) -> StoreResult<()> {
        if self.state.tasks.contains_key(&task.id()) {
            return Err(StoreError::unique_violation("tasks_pkey"));
        }
        self.state
            .tasks
            .insert(task.id(), task.clone().with_assignee_username(None));
        Ok(())
    }

    fn update_task(
        &mut self,
        project: ProjectId,
        task: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<Option<Task>> {
        let Some(stored) = self
            .state
            .tasks
            .get_mut(&task)
            .filter(|stored| stored.project_id() == project)
        else {
            return Ok(None);
        };
        stored.apply_patch(patch);
        let updated = stored.clone();
        Ok(Some(self.state.joined(&updated)))
    }

    fn delete_task(&mut self, project: ProjectId, task: TaskId) -> StoreResult<bool> {
        if self.state.task_in(project, task).is_none() {
            return Ok(false);
        }
        Ok(self.state.tasks.remove(&task).is_some())
    }

    fn shift_positions(&mut self, project: ProjectId, shift: &ShiftOp) -> StoreResult<u64> {
        let mut touched = 0_u64;
        for task in self.state.tasks.values_mut() {
            if task.project_id() != project {
                continue;
            }
            let shifted = shift.apply_to(task.slot());
            if shifted != task.position() {
                let patch = TaskPatch {
                    slot: Some(Slot::new(task.bucket(), shifted)),
                    ..TaskPatch::default()
                };
                task.apply_patch(&patch);
                touched += 1;
            }
        }
        Ok(touched)
    }

    fn list_tasks(&mut self, project: ProjectId) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .state
            .tasks
            .values()
            .filter(|task| task.project_id() == project)
            .map(|task| self.state.joined(task))
            .collect();
        sort_board_order(&mut tasks);
        Ok(tasks)
    }

    fn find_user(&mut self, user: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.state.users.get(&user).cloned())
    }

    fn find_user_by_username(&mut self, username: &Username) -> StoreResult<Option<UserAccount>> {
        let wanted = username.folded();
        Ok(self
            .state
            .users
            .values()
            .find(|account| account.username.folded() == wanted)
            .cloned())
    }

    fn find_project(&mut self, project: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.state.projects.get(&project).cloned())
    }

    fn insert_project(&mut self, project: &Project) -> StoreResult<()> {
        if self.state.projects.contains_key(&project.id()) {
            return Err(StoreError::unique_violation("projects_pkey"));
        }
        self.state.projects.insert(project.id(), project.clone());
        Ok(())
    }

    fn next_project_sort_index(&mut self, owner: UserId) -> StoreResult<u32> {
        Ok(self
            .state
            .projects
            .values()
            .filter(|project| project.owner_id() == owner)
            .map(|project| project.sort_index().saturating_add(1))
            .max()
            .unwrap_or(0))
    }

    fn list_member_projects(&mut self, user: UserId) -> StoreResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .state
            .projects
            .values()
            .filter(|project| self.state.memberships.contains_key(&(project.id(), user)))
            .cloned()
            .collect();
        projects.sort_by_key(|project| (project.sort_index(), project.created_at()));
        Ok(projects)
    }

    fn is_member(&mut self, project: ProjectId, user: UserId) -> StoreResult<bool> {
        Ok(self.state.memberships.contains_key(&(project, user)))
    }

    fn insert_membership(&mut self, membership: &Membership) -> StoreResult<bool> {
        let key = (membership.project_id, membership.user_id);
        if self.state.memberships.contains_key(&key) {
            return Ok(false);
        }
        self.state.memberships.insert(key, membership.clone());
        Ok(true)
    }

    fn list_members(&mut self, project: ProjectId) -> StoreResult<Vec<Membership>> {
        let mut members: Vec<Membership> = self
            .state
            .memberships
            .values()
            .filter(|membership| membership.project_id == project)
            .cloned()
            .collect();
        members.sort_by_cached_key(|member| (member.username.folded(), member.user_id));
        Ok(members)
    }

    fn insert_invitation(&mut self, invitation: &Invitation) -> StoreResult<()> {
        if self.state.invitations.contains_key(&invitation.id()) {
            return Err(StoreError::unique_violation("project_invites_pkey"));
        }
        let duplicate_pending = invitation.status().is_pending()
            && self.state.invitations.values().any(|existing| {
                existing.status().is_pending()
                    && existing.project_id() == invitation.project_id()
                    && existing.invitee_id() == invitation.invitee_id()
            });
        if duplicate_pending {
            return Err(StoreError::unique_violation(PENDING_INVITATION_CONSTRAINT));
        }
        self.state
            .invitations
            .insert(invitation.id(), invitation.clone());
        Ok(())
    }

    fn find_pending_invitation(
        &mut self,
        project: ProjectId,
        invitee: UserId,
    ) -> StoreResult<Option<Invitation>> {
        Ok(self
            .state
            .invitations
            .values()
            .find(|invitation| {
                invitation.status().is_pending()
                    && invitation.project_id() == project
                    && invitation.invitee_id() == invitee
            })
            .cloned())
    }

    fn find_invitation_for_update(
        &mut self,
        invitation: InvitationId,
    ) -> StoreResult<Option<Invitation>> {
        Ok(self.state.invitations.get(&invitation).cloned())
    }

    fn decline_invitation(
        &mut self,
        invitation: InvitationId,
        invitee: UserId,
        responded_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let Some(stored) = self
            .state
            .invitations
            .get_mut(&invitation)
            .filter(|stored| stored.invitee_id() == invitee)
        else {
            return Ok(false);
        };
        Ok(stored.decline(responded_at).is_ok())
    }

    fn delete_invitation(&mut self, invitation: InvitationId) -> StoreResult<bool> {
        Ok(self.state.invitations.remove(&invitation).is_some())
    }

    fn list_project_invitations(
        &mut self,
        project: ProjectId,
        limit: u32,
    ) -> StoreResult<Vec<InvitationView>> {
        let mut invitations: Vec<&Invitation> = self
            .state
            .invitations
            .values()
            .filter(|invitation| invitation.project_id() == project)
            .collect();
        invitations.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        let max_rows = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(invitations
            .into_iter()
            .filter_map(|invitation| {
                Some(InvitationView {
                    inviter_username: self.state.username_of(invitation.inviter_id())?,
                    invitee_username: self.state.username_of(invitation.invitee_id())?,
                    invitation: invitation.clone(),
                })
            })
            .take(max_rows)
            .collect())
    }

    fn list_received_invitations(
        &mut self,
        invitee: UserId,
        status: InvitationStatus,
        limit: u32,
    ) -> StoreResult<Vec<ReceivedInvitation>> {
        let mut invitations: Vec<&Invitation> = self
            .state
            .invitations
            .values()
            .filter(|invitation| {
                invitation.invitee_id() == invitee && invitation.status() == status
            })
            .collect();
        invitations.sort_by(|left, right| right.created_at().cmp(&left.created_at()));
        let max_rows = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(invitations
            .into_iter()
            .filter_map(|invitation| {
                let project = self.state.projects.get(&invitation.project_id())?;
                Some(ReceivedInvitation {
                    id: invitation.id(),
                    project_id: invitation.project_id(),
                    project_name: project.name().clone(),
                    inviter_id: invitation.inviter_id(),
                    inviter_username: self.state.username_of(invitation.inviter_id())?,
                    role_key: invitation.role_key().clone(),
                    status: invitation.status(),
                    created_at: invitation.created_at(),
                })
            })
            .take(max_rows)
            .collect())
    }
}
