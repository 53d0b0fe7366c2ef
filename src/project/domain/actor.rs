//! Verified identities supplied by the authentication layer.

use super::{ProjectDomainError, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trimmed, non-empty username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Creates a validated username.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectDomainError::EmptyUsername`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ProjectDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ProjectDomainError::EmptyUsername);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the username as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the lower-cased form used for case-insensitive matching.
    #[must_use]
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated user performing an operation.
///
/// Every service operation takes the actor explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    user_id: UserId,
    username: Username,
}

impl Actor {
    /// Creates an actor from a verified identity.
    #[must_use]
    pub const fn new(user_id: UserId, username: Username) -> Self {
        Self { user_id, username }
    }

    /// Returns the actor's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the actor's username as reported by the identity layer.
    #[must_use]
    pub const fn username(&self) -> &Username {
        &self.username
    }
}

/// A user account as recorded in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Account identifier.
    pub id: UserId,
    /// Account username.
    pub username: Username,
}

impl UserAccount {
    /// Creates a user account record.
    #[must_use]
    pub const fn new(id: UserId, username: Username) -> Self {
        Self { id, username }
    }

    /// Returns an actor acting as this account.
    #[must_use]
    pub fn as_actor(&self) -> Actor {
        Actor::new(self.id, self.username.clone())
    }
}
