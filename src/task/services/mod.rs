//! Application services for the task board.

mod board;
pub mod ordering;

pub use board::{CreateTaskRequest, TaskBoardService, UpdateTaskRequest};
pub use ordering::MoveTarget;
