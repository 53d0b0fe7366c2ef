//! Forgeboard: collaborative project task boards.
//!
//! Projects hold tasks grouped into status buckets. Within each bucket the
//! tasks keep dense positions `0..n` through every insert, move and delete.
//! Users join projects by accepting invitations sent by existing members.
//!
//! # Architecture
//!
//! Forgeboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure board rules with no infrastructure dependencies
//! - **Ports**: The transactional store seam in [`store::ports`]
//! - **Adapters**: In-memory and `PostgreSQL` stores in [`store::adapters`]
//!
//! # Modules
//!
//! - [`project`]: Projects, memberships and the per-operation access check
//! - [`task`]: Tasks and the dense ordering engine
//! - [`invitation`]: The invitation to membership state machine
//! - [`store`]: Transactions shared by every service
//! - [`error`]: Caller-facing error classification
//! - [`config`]: Environment-driven settings and operation deadlines
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod error;
pub mod invitation;
pub mod project;
pub mod store;
pub mod task;
pub mod telemetry;
