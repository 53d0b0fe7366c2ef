//! Store adapters.
//!
//! - [`memory::InMemoryBoardStore`]: mutex-guarded state for tests. Each
//!   transaction runs against a working copy that replaces the shared state
//!   on commit.
//! - [`postgres::PostgresBoardStore`]: Diesel-backed `PostgreSQL` storage
//!   with advisory bucket locks.

pub mod memory;
pub mod postgres;
