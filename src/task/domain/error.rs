//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing task domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The bucket name is not part of the fixed enumeration.
    #[error("unknown bucket: {0}")]
    InvalidBucket(String),

    /// The difficulty is outside `1..=5`.
    #[error("invalid difficulty {0}, expected a value between 1 and 5")]
    DifficultyOutOfRange(i64),

    /// The position index is negative.
    #[error("invalid position {0}, expected a non-negative index")]
    NegativePosition(i64),

    /// The position index exceeds the storable range.
    #[error("position {0} exceeds the supported range")]
    PositionOutOfRange(i64),

    /// An update request carried no fields.
    #[error("no fields to update")]
    EmptyUpdate,
}

/// Error returned while parsing a bucket name from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown bucket: {0}")]
pub struct ParseBucketError(pub String);

impl From<ParseBucketError> for TaskDomainError {
    fn from(err: ParseBucketError) -> Self {
        Self::InvalidBucket(err.0)
    }
}
