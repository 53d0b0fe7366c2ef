//! Membership checks evaluated inside an open transaction.

use crate::error::{BoardError, BoardResult, NotFound};
use crate::project::domain::{Actor, ProjectId, ProjectSnapshot, Username};
use crate::store::ports::StoreTransaction;

/// Fails with [`BoardError::Forbidden`] unless `actor` belongs to `project`.
///
/// # Errors
///
/// Returns [`BoardError::Forbidden`] for non-members and
/// [`BoardError::Store`] when the lookup fails.
pub fn ensure_member(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
    actor: &Actor,
) -> BoardResult<()> {
    if tx.is_member(project, actor.user_id())? {
        Ok(())
    } else {
        Err(BoardError::Forbidden(project))
    }
}

/// Reads a project with its members and tasks in board order.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] when the project does not exist.
pub fn load_snapshot(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
) -> BoardResult<ProjectSnapshot> {
    let attributes = tx
        .find_project(project)?
        .ok_or(BoardError::NotFound(NotFound::Project(project)))?;
    let members = tx.list_members(project)?;
    let tasks = tx.list_tasks(project)?;
    Ok(ProjectSnapshot {
        project: attributes,
        members,
        tasks,
    })
}

/// Username recorded on `actor`'s memberships.
///
/// The directory entry wins over the name the identity layer supplied, so
/// every membership of one user carries the same name.
///
/// # Errors
///
/// Returns [`BoardError::Store`] when the lookup fails.
pub fn display_name(tx: &mut dyn StoreTransaction, actor: &Actor) -> BoardResult<Username> {
    Ok(tx
        .find_user(actor.user_id())?
        .map_or_else(|| actor.username().clone(), |account| account.username))
}
