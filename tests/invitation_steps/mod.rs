//! Step definitions for invitation lifecycle scenarios.

pub mod then;
pub mod when;
pub mod world;
