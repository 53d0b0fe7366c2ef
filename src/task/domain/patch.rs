//! Typed partial updates for persisted tasks.

use super::{Difficulty, Slot};
use crate::project::domain::UserId;

/// How an update treats the task's assignee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssigneeUpdate {
    /// Leave the assignee as it is.
    #[default]
    Unchanged,
    /// Remove the assignee.
    Clear,
    /// Assign the given user.
    Set(UserId),
}

impl AssigneeUpdate {
    /// Returns `true` when the update leaves the assignee untouched.
    #[must_use]
    pub const fn is_unchanged(self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Fields written by a single task update. Absent fields are not touched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New bucket and position, when the task moves.
    pub slot: Option<Slot>,
    /// Replacement details text.
    pub details: Option<String>,
    /// Replacement difficulty.
    pub difficulty: Option<Difficulty>,
    /// Assignee change.
    pub assignee: AssigneeUpdate,
}

impl TaskPatch {
    /// Returns `true` when the patch writes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.slot.is_none()
            && self.details.is_none()
            && self.difficulty.is_none()
            && self.assignee.is_unchanged()
    }
}
