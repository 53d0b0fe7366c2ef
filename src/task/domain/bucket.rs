//! Status buckets that group a project's tasks.

use super::{ParseBucketError, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A task's status category. Positions are dense within each bucket.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Bucket {
    /// Not started.
    #[default]
    #[serde(rename = "backlog")]
    Backlog,
    /// Being worked on.
    #[serde(rename = "inProgress")]
    InProgress,
    /// Waiting on something external.
    #[serde(rename = "blocked")]
    Blocked,
    /// Finished.
    #[serde(rename = "done")]
    Done,
}

impl Bucket {
    /// Every bucket in board display order.
    pub const ALL: [Self; 4] = [Self::Backlog, Self::InProgress, Self::Blocked, Self::Done];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::InProgress => "inProgress",
            Self::Blocked => "blocked",
            Self::Done => "done",
        }
    }

    /// Returns the display rank used to order a project's tasks.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Backlog => 0,
            Self::InProgress => 1,
            Self::Blocked => 2,
            Self::Done => 3,
        }
    }
}

impl TryFrom<&str> for Bucket {
    type Error = ParseBucketError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "backlog" => Ok(Self::Backlog),
            "inProgress" => Ok(Self::InProgress),
            "blocked" => Ok(Self::Blocked),
            "done" => Ok(Self::Done),
            _ => Err(ParseBucketError(value.to_owned())),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task's location on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Bucket holding the task.
    pub bucket: Bucket,
    /// Position within the bucket.
    pub position: Position,
}

impl Slot {
    /// Creates a slot.
    #[must_use]
    pub const fn new(bucket: Bucket, position: Position) -> Self {
        Self { bucket, position }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.bucket, self.position)
    }
}
