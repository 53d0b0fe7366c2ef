//! Error types for project and membership validation.

use thiserror::Error;

/// Errors returned while constructing project domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProjectDomainError {
    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The role key is empty after trimming.
    #[error("role key must not be empty")]
    EmptyRoleKey,
}
