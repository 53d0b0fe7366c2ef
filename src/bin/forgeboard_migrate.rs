//! Applies or reverts the board schema.
//!
//! Usage:
//!
//! ```text
//! forgeboard-migrate [up|down]
//! ```
//!
//! The connection string is read from `FORGEBOARD_DATABASE_URL` (or
//! `DATABASE_URL`). `up` applies every pending migration and is the
//! default; `down` reverts the latest applied one.

use diesel::Connection;
use diesel::pg::PgConnection;
use forgeboard::config::BoardConfig;
use forgeboard::store::adapters::postgres::migrations::{
    MigrationError, apply_pending, revert_latest,
};
use forgeboard::telemetry::init_tracing;
use std::env;
use thiserror::Error;
use tracing::info;

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
enum MigrateError {
    #[error("unknown direction `{0}`; expected `up` or `down`")]
    UnknownDirection(String),
    #[error("unexpected extra argument `{0}`")]
    ExtraArgument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, MigrateError> {
        let direction = match args.next().as_deref() {
            None | Some("up") => Self::Up,
            Some("down") => Self::Down,
            Some(other) => return Err(MigrateError::UnknownDirection(other.to_owned())),
        };
        if let Some(extra) = args.next() {
            return Err(MigrateError::ExtraArgument(extra));
        }
        Ok(direction)
    }

    fn run(self, conn: &mut PgConnection) -> Result<(), MigrationError> {
        match self {
            Self::Up => {
                let applied = apply_pending(conn)?;
                info!(count = applied.len(), ?applied, "applied pending migrations");
            }
            Self::Down => {
                let reverted = revert_latest(conn)?;
                info!(%reverted, "reverted migration");
            }
        }
        Ok(())
    }
}

fn main() -> Result<(), BoxError> {
    init_tracing();
    let direction = Direction::parse(env::args().skip(1))?;
    let config = BoardConfig::from_env()?;

    let mut connection = PgConnection::establish(&config.database_url)?;
    direction.run(&mut connection)?;
    Ok(())
}
