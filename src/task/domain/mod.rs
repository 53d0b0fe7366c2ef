//! Domain model for board tasks and their per-bucket ordering.
//!
//! Tasks live in one of a fixed set of buckets. Within each (project,
//! bucket) pair positions form the dense sequence `0..n`; the planning
//! functions in [`ordering`] describe how each structural mutation keeps
//! that sequence dense.

mod bucket;
mod error;
mod ids;
pub mod ordering;
mod patch;
mod task;

pub use bucket::{Bucket, Slot};
pub use error::{ParseBucketError, TaskDomainError};
pub use ids::{Difficulty, Position, TaskId};
pub use patch::{AssigneeUpdate, TaskPatch};
pub use task::{PersistedTaskData, Task, TaskSpec, TaskTitle, sort_board_order};
