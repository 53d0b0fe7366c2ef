//! Task board operations: create, move or patch, and delete tasks.

use super::ordering::{self, MoveTarget};
use crate::config::{DeadlineClass, OperationDeadlines};
use crate::error::{BoardError, BoardResult, NotFound, log_rejection};
use crate::project::domain::{Actor, ProjectId, UserId};
use crate::project::services::access::ensure_member;
use crate::store::ports::{StoreTransaction, TransactionalStore};
use crate::task::domain::{
    AssigneeUpdate, Bucket, Difficulty, Position, Task, TaskDomainError, TaskId, TaskPatch,
    TaskSpec, TaskTitle,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    bucket: Option<String>,
    details: Option<String>,
    assignee: Option<UserId>,
    difficulty: Option<i64>,
    position: Option<i64>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bucket: None,
            details: None,
            assignee: None,
            difficulty: None,
            position: None,
        }
    }

    /// Sets the bucket name. Defaults to `backlog`.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Sets the details text.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Assigns the task.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: UserId) -> Self {
        self.assignee = Some(assignee);
        self
    }

    /// Sets the difficulty. Defaults to 2.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: i64) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Inserts at `position` instead of appending.
    #[must_use]
    pub const fn at_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    fn validate(
        self,
        project: ProjectId,
    ) -> Result<(TaskSpec, Option<Position>), TaskDomainError> {
        let bucket = self
            .bucket
            .as_deref()
            .map(Bucket::try_from)
            .transpose()?
            .unwrap_or_default();
        let difficulty = self
            .difficulty
            .map(Difficulty::new)
            .transpose()?
            .unwrap_or_default();
        let position = self.position.map(Position::new).transpose()?;
        let spec = TaskSpec {
            project_id: project,
            bucket,
            title: TaskTitle::new(self.title)?,
            details: self.details.unwrap_or_default().trim().to_owned(),
            assignee_id: self.assignee,
            difficulty,
        };
        Ok((spec, position))
    }
}

/// Request payload for moving or patching a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskRequest {
    bucket: Option<String>,
    position: Option<i64>,
    details: Option<String>,
    difficulty: Option<i64>,
    assignee: AssigneeUpdate,
}

impl UpdateTaskRequest {
    /// Creates an empty request. At least one field must be set before the
    /// request is submitted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the task to another bucket.
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Moves the task to `position` within its destination bucket.
    #[must_use]
    pub const fn with_position(mut self, position: i64) -> Self {
        self.position = Some(position);
        self
    }

    /// Replaces the details text.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Replaces the difficulty.
    #[must_use]
    pub const fn with_difficulty(mut self, difficulty: i64) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    /// Sets how the assignee changes.
    #[must_use]
    pub const fn with_assignee(mut self, assignee: AssigneeUpdate) -> Self {
        self.assignee = assignee;
        self
    }

    fn validate(self) -> Result<(MoveTarget, TaskPatch), TaskDomainError> {
        let target = MoveTarget {
            bucket: self.bucket.as_deref().map(Bucket::try_from).transpose()?,
            position: self.position.map(Position::new).transpose()?,
        };
        let patch = TaskPatch {
            slot: None,
            details: self.details.map(|details| details.trim().to_owned()),
            difficulty: self.difficulty.map(Difficulty::new).transpose()?,
            assignee: self.assignee,
        };
        if !target.is_move() && patch.is_empty() {
            return Err(TaskDomainError::EmptyUpdate);
        }
        Ok((target, patch))
    }
}

/// Task board orchestration service.
#[derive(Clone)]
pub struct TaskBoardService<S, C>
where
    S: TransactionalStore,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    clock: Arc<C>,
    deadlines: OperationDeadlines,
}

impl<S, C> TaskBoardService<S, C>
where
    S: TransactionalStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a service with default deadlines.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            deadlines: OperationDeadlines::default(),
        }
    }

    /// Replaces the operation deadlines.
    #[must_use]
    pub const fn with_deadlines(mut self, deadlines: OperationDeadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Creates a task in `project`, appending unless a position is given.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `Validation` for malformed input,
    /// `Forbidden` when the actor is not a member, `NotFound` when the
    /// assignee does not exist, or `Internal` when the store fails.
    pub async fn create_task(
        &self,
        actor: &Actor,
        project: ProjectId,
        request: CreateTaskRequest,
    ) -> BoardResult<Task> {
        let result = self.try_create_task(actor, project, request).await;
        result.inspect_err(|err| log_rejection("create_task", err))
    }

    async fn try_create_task(
        &self,
        actor: &Actor,
        project: ProjectId,
        request: CreateTaskRequest,
    ) -> BoardResult<Task> {
        let (spec, desired) = request.validate(project)?;
        let caller = actor.clone();
        let clock = Arc::clone(&self.clock);
        let task = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Light), move |tx| {
                ensure_member(tx, project, &caller)?;
                if let Some(assignee) = spec.assignee_id {
                    ensure_user(tx, assignee)?;
                }
                ordering::insert_task(tx, spec, desired, &*clock)
            })
            .await?;
        info!(%project, task = %task.id(), slot = %task.slot(), "created task");
        Ok(task)
    }

    /// Moves a task and patches its fields in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `Validation` for malformed or empty
    /// requests, `Forbidden` for non-members, `NotFound` when the task or
    /// assignee does not exist, `Conflict` when a concurrent move won the
    /// race, or `Internal` when the store fails.
    pub async fn update_task(
        &self,
        actor: &Actor,
        project: ProjectId,
        task: TaskId,
        request: UpdateTaskRequest,
    ) -> BoardResult<Task> {
        let result = self.try_update_task(actor, project, task, request).await;
        result.inspect_err(|err| log_rejection("update_task", err))
    }

    async fn try_update_task(
        &self,
        actor: &Actor,
        project: ProjectId,
        task: TaskId,
        request: UpdateTaskRequest,
    ) -> BoardResult<Task> {
        let (target, patch) = request.validate()?;
        let caller = actor.clone();
        let updated = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Standard), move |tx| {
                ensure_member(tx, project, &caller)?;
                if let AssigneeUpdate::Set(assignee) = patch.assignee {
                    ensure_user(tx, assignee)?;
                }
                ordering::update_task(tx, project, task, target, patch)
            })
            .await?;
        info!(%project, %task, slot = %updated.slot(), "updated task");
        Ok(updated)
    }

    /// Deletes a task and returns the bucket it was removed from.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `Forbidden` for non-members,
    /// `NotFound` when the task does not exist, `Conflict` when it moved
    /// concurrently, or `Internal` when the store fails.
    pub async fn delete_task(
        &self,
        actor: &Actor,
        project: ProjectId,
        task: TaskId,
    ) -> BoardResult<Bucket> {
        let caller = actor.clone();
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Standard), move |tx| {
                ensure_member(tx, project, &caller)?;
                ordering::remove_task(tx, project, task)
            })
            .await;
        match &result {
            Ok(bucket) => info!(%project, %task, %bucket, "deleted task"),
            Err(err) => log_rejection("delete_task", err),
        }
        result
    }
}

fn ensure_user(tx: &mut dyn StoreTransaction, user: UserId) -> BoardResult<()> {
    if tx.find_user(user)?.is_some() {
        Ok(())
    } else {
        Err(BoardError::NotFound(NotFound::User(user.to_string())))
    }
}
