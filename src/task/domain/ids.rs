//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense rank of a task within its (project, bucket) pair.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Position(u32);

impl Position {
    /// First slot of every bucket.
    pub const FIRST: Self = Self(0);

    /// Largest position representable in the `PostgreSQL` schema (`INT4`).
    const MAX_PERSISTED_VALUE: i64 = i32::MAX as i64;

    /// Creates a validated position from caller input.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NegativePosition`] for negative input and
    /// [`TaskDomainError::PositionOutOfRange`] above `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        if value < 0 {
            return Err(TaskDomainError::NegativePosition(value));
        }
        if value > Self::MAX_PERSISTED_VALUE {
            return Err(TaskDomainError::PositionOutOfRange(value));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| TaskDomainError::PositionOutOfRange(value))
    }

    /// Creates a position from an already-trusted index, such as a bucket
    /// length.
    #[must_use]
    pub const fn from_index(value: u32) -> Self {
        Self(value)
    }

    /// Returns the underlying index.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Returns the next slot.
    #[must_use]
    pub const fn succ(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the previous slot, saturating at zero.
    #[must_use]
    pub const fn pred(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effort estimate between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Difficulty(u8);

impl Difficulty {
    /// Difficulty applied when a new task does not specify one.
    pub const DEFAULT: Self = Self(2);

    const MIN: i64 = 1;
    const MAX: i64 = 5;

    /// Creates a validated difficulty.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DifficultyOutOfRange`] outside `1..=5`.
    pub fn new(value: i64) -> Result<Self, TaskDomainError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(TaskDomainError::DifficultyOutOfRange(value));
        }
        u8::try_from(value)
            .map(Self)
            .map_err(|_| TaskDomainError::DifficultyOutOfRange(value))
    }

    /// Returns the underlying value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
