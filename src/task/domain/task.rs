//! Task aggregate root.

use super::{
    AssigneeUpdate, Bucket, Difficulty, Position, Slot, TaskDomainError, TaskId, TaskPatch,
};
use crate::project::domain::{ProjectId, UserId, Username};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the value is empty after
    /// trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validated attributes of a task that has not been placed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Owning project.
    pub project_id: ProjectId,
    /// Bucket the task is created in.
    pub bucket: Bucket,
    /// Task title.
    pub title: TaskTitle,
    /// Free-form details, already trimmed.
    pub details: String,
    /// Optional assignee.
    pub assignee_id: Option<UserId>,
    /// Effort estimate.
    pub difficulty: Difficulty,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: TaskTitle,
    details: String,
    bucket: Bucket,
    position: Position,
    assignee_id: Option<UserId>,
    assignee_username: Option<Username>,
    difficulty: Difficulty,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted details.
    pub details: String,
    /// Persisted bucket.
    pub bucket: Bucket,
    /// Persisted position.
    pub position: Position,
    /// Persisted assignee, if any.
    pub assignee_id: Option<UserId>,
    /// Username of the assignee, joined from the user directory.
    pub assignee_username: Option<Username>,
    /// Persisted difficulty.
    pub difficulty: Difficulty,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new task at `position` within the spec's bucket.
    #[must_use]
    pub fn new(spec: TaskSpec, position: Position, clock: &impl Clock) -> Self {
        Self {
            id: TaskId::new(),
            project_id: spec.project_id,
            title: spec.title,
            details: spec.details,
            bucket: spec.bucket,
            position,
            assignee_id: spec.assignee_id,
            assignee_username: None,
            difficulty: spec.difficulty,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            details: data.details,
            bucket: data.bucket,
            position: data.position,
            assignee_id: data.assignee_id,
            assignee_username: data.assignee_username,
            difficulty: data.difficulty,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the details text.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Returns the bucket.
    #[must_use]
    pub const fn bucket(&self) -> Bucket {
        self.bucket
    }

    /// Returns the position within the bucket.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns the task's current slot.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        Slot::new(self.bucket, self.position)
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub const fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    /// Returns the assignee's username when it has been joined.
    #[must_use]
    pub const fn assignee_username(&self) -> Option<&Username> {
        self.assignee_username.as_ref()
    }

    /// Returns the difficulty.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Attaches the assignee's username read from the user directory.
    #[must_use]
    pub fn with_assignee_username(mut self, username: Option<Username>) -> Self {
        self.assignee_username = username.filter(|_| self.assignee_id.is_some());
        self
    }

    /// Writes every field present in `patch`.
    ///
    /// A changed assignee drops the joined username until it is read again.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(slot) = patch.slot {
            self.bucket = slot.bucket;
            self.position = slot.position;
        }
        if let Some(details) = &patch.details {
            details.trim().clone_into(&mut self.details);
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        match patch.assignee {
            AssigneeUpdate::Unchanged => {}
            AssigneeUpdate::Clear => {
                self.assignee_id = None;
                self.assignee_username = None;
            }
            AssigneeUpdate::Set(user_id) => {
                if self.assignee_id != Some(user_id) {
                    self.assignee_id = Some(user_id);
                    self.assignee_username = None;
                }
            }
        }
    }
}

/// Sorts tasks into board order: bucket rank, then position, then creation.
pub fn sort_board_order(tasks: &mut [Task]) {
    tasks.sort_by(|left, right| {
        left.bucket
            .rank()
            .cmp(&right.bucket.rank())
            .then(left.position.cmp(&right.position))
            .then(left.created_at.cmp(&right.created_at))
    });
}
