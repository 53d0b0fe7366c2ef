//! Domain model for projects, members and the identities acting on them.

mod actor;
mod error;
mod ids;
mod membership;
mod project;

pub use actor::{Actor, UserAccount, Username};
pub use error::ProjectDomainError;
pub use ids::{ProjectId, UserId};
pub use membership::{Membership, RoleKey};
pub use project::{PersistedProjectData, Project, ProjectName, ProjectSnapshot};
