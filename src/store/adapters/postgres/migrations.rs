//! Board schema migrations embedded at compile time.
//!
//! Applied versions are recorded in `__diesel_schema_migrations`, so
//! [`apply_pending`] is safe to run against an up-to-date database.

use diesel::pg::PgConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;

/// Migrations under `migrations/`, in version order.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// A migration could not be applied or reverted.
#[derive(Debug, Error)]
#[error("schema migration failed: {0}")]
pub struct MigrationError(#[source] Box<dyn std::error::Error + Send + Sync>);

/// Applies every migration not yet recorded and returns their versions.
///
/// # Errors
///
/// Returns [`MigrationError`] when a migration script fails; the failing
/// migration is rolled back.
pub fn apply_pending(conn: &mut PgConnection) -> Result<Vec<String>, MigrationError> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(MigrationError)?;
    Ok(applied.iter().map(ToString::to_string).collect())
}

/// Reverts the most recently applied migration and returns its version.
///
/// # Errors
///
/// Returns [`MigrationError`] when nothing has been applied or the down
/// script fails.
pub fn revert_latest(conn: &mut PgConnection) -> Result<String, MigrationError> {
    let reverted = conn.revert_last_migration(MIGRATIONS).map_err(MigrationError)?;
    Ok(reverted.to_string())
}
