//! Project services and the access guard.

pub mod access;
mod catalogue;

pub use catalogue::{CreateProjectRequest, ProjectService};
