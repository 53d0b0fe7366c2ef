//! Membership records granting users access to a project.

use super::{ProjectDomainError, ProjectId, UserId, Username};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Free-form role label attached to memberships and invitations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleKey(String);

impl RoleKey {
    /// Role granted when an invitation does not name one.
    pub const DEFAULT_MEMBER: &'static str = "member";

    /// Role granted to the creator of a project.
    pub const OWNER: &'static str = "owner";

    /// Creates a validated role key.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyRoleKey`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyRoleKey);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Parses an optional role key, defaulting blank input to
    /// [`RoleKey::DEFAULT_MEMBER`].
    #[must_use]
    pub fn or_default_member(value: Option<&str>) -> Self {
        value
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map_or_else(Self::member, |role| Self(role.to_owned()))
    }

    /// Returns the default member role.
    #[must_use]
    pub fn member() -> Self {
        Self(Self::DEFAULT_MEMBER.to_owned())
    }

    /// Returns the owner role.
    #[must_use]
    pub fn owner() -> Self {
        Self(Self::OWNER.to_owned())
    }

    /// Returns the role key as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Access grant linking a user to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The project the membership belongs to.
    pub project_id: ProjectId,
    /// The member.
    pub user_id: UserId,
    /// Denormalised display name captured when the membership was created.
    pub username: Username,
    /// Role granted to the member.
    pub role_key: RoleKey,
}

impl Membership {
    /// Creates a membership record.
    #[must_use]
    pub const fn new(
        project_id: ProjectId,
        user_id: UserId,
        username: Username,
        role_key: RoleKey,
    ) -> Self {
        Self {
            project_id,
            user_id,
            username,
            role_key,
        }
    }
}
