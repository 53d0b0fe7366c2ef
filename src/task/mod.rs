//! Task board: tasks ordered densely within status buckets.
//!
//! Every structural change keeps the positions of each (project, bucket)
//! pair equal to `0..n`. Plans are computed by [`domain::ordering`] and
//! applied inside one store transaction by [`services::ordering`].
//!
//! - Domain types in [`domain`]
//! - Orchestration services in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
