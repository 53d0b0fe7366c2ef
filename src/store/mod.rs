//! Transactional persistence for the board.
//!
//! Every board operation runs inside exactly one store transaction. The
//! [`ports`] module defines the contract; [`adapters`] provides an in-memory
//! implementation for tests and a `PostgreSQL` implementation built on
//! Diesel.

pub mod adapters;
pub mod ports;
