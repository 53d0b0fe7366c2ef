//! Projects, memberships and the access guard.
//!
//! A project scopes tasks and invitations. Every board operation checks
//! membership through [`services::access`] inside its transaction before
//! reading or writing project data.
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;
