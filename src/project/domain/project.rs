//! Project aggregate and the composite snapshot returned to callers.

use super::{Membership, ProjectDomainError, ProjectId, UserId};
use crate::task::domain::Task;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Creates a validated project name.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyProjectName`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyProjectName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A project: the ownership scope for tasks, memberships and invitations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: ProjectName,
    description: String,
    owner_id: UserId,
    sort_index: u32,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted project identifier.
    pub id: ProjectId,
    /// Persisted name.
    pub name: ProjectName,
    /// Persisted description.
    pub description: String,
    /// Persisted owner.
    pub owner_id: UserId,
    /// Persisted position in the owner's project list.
    pub sort_index: u32,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates a new project owned by `owner_id`.
    #[must_use]
    pub fn new(
        name: ProjectName,
        description: impl Into<String>,
        owner_id: UserId,
        sort_index: u32,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ProjectId::new(),
            name,
            description: description.into().trim().to_owned(),
            owner_id,
            sort_index,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            owner_id: data.owner_id,
            sort_index: data.sort_index,
            created_at: data.created_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project name.
    #[must_use]
    pub const fn name(&self) -> &ProjectName {
        &self.name
    }

    /// Returns the project description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the position of this project in its owner's list.
    #[must_use]
    pub const fn sort_index(&self) -> u32 {
        self.sort_index
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Full view of a project: attributes, members and ordered tasks.
///
/// Members are ordered by lower-cased username; tasks by bucket, then
/// position, then creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    /// Project attributes.
    pub project: Project,
    /// Every member of the project.
    pub members: Vec<Membership>,
    /// Every task of the project.
    pub tasks: Vec<Task>,
}

impl ProjectSnapshot {
    /// Returns `true` when `user_id` is among the snapshot's members.
    #[must_use]
    pub fn has_member(&self, user_id: UserId) -> bool {
        self.members.iter().any(|member| member.user_id == user_id)
    }
}
