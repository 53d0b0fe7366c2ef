//! Step definitions for dense task ordering scenarios.

pub mod when;
