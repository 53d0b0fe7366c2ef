//! Applies position plans inside an open store transaction.
//!
//! Structural changes lock the affected buckets first, in canonical order,
//! and only then take the task's row lock. The caller has already checked
//! membership.

use crate::error::{BoardError, BoardResult, ConflictReason, NotFound};
use crate::project::domain::ProjectId;
use crate::store::ports::{StoreError, StoreTransaction};
use crate::task::domain::{
    Bucket, Position, Task, TaskId, TaskPatch, TaskSpec,
    ordering::{MoveBounds, lock_order, plan_insert, plan_move, plan_remove},
};
use mockable::Clock;
use tracing::debug;

/// Where an update asks the task to go. Both fields absent means the task
/// stays in its slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveTarget {
    /// Destination bucket; `None` keeps the current bucket.
    pub bucket: Option<Bucket>,
    /// Destination index; `None` keeps the index, or appends when the
    /// bucket changes.
    pub position: Option<Position>,
}

impl MoveTarget {
    /// Returns `true` when the update touches the task's slot.
    #[must_use]
    pub const fn is_move(self) -> bool {
        self.bucket.is_some() || self.position.is_some()
    }
}

/// Places a new task, shifting later tasks in its bucket down a slot.
///
/// # Errors
///
/// Returns [`BoardError::Store`] when the store fails.
pub fn insert_task(
    tx: &mut dyn StoreTransaction,
    spec: TaskSpec,
    desired: Option<Position>,
    clock: &impl Clock,
) -> BoardResult<Task> {
    let project = spec.project_id;
    let len = tx.lock_bucket(project, spec.bucket)?;
    let plan = plan_insert(spec.bucket, len, desired);
    debug!(%project, bucket = %spec.bucket, len, position = %plan.position, "planned insert");

    if let Some(shift) = plan.shift {
        tx.shift_positions(project, &shift)?;
    }
    let task = Task::new(spec, plan.position, clock);
    tx.insert_task(&task)?;
    reread(tx, project, task.id())
}

/// Moves and patches a task in one step.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] when the task is absent and
/// [`BoardError::Conflict`] when a concurrent move changed its bucket while
/// this call waited for the bucket locks.
pub fn update_task(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
    task: TaskId,
    target: MoveTarget,
    mut patch: TaskPatch,
) -> BoardResult<Task> {
    let seen = find_existing(tx, project, task)?;

    let locked = if target.is_move() {
        let source = seen.bucket();
        let destination = target.bucket.unwrap_or(source);
        let mut bounds = MoveBounds {
            source_len: 0,
            destination_len: 0,
        };
        for bucket in lock_order(source, destination) {
            let len = tx.lock_bucket(project, bucket)?;
            if bucket == source {
                bounds.source_len = len;
            }
            if bucket == destination {
                bounds.destination_len = len;
            }
        }

        let row = lock_unmoved(tx, project, &seen)?;
        let plan = plan_move(row.slot(), target.bucket, target.position, bounds);
        debug!(
            %project,
            %task,
            from = %plan.from,
            to = %plan.to,
            shifts = plan.shifts.len(),
            "planned move"
        );
        for shift in &plan.shifts {
            tx.shift_positions(project, shift)?;
        }
        if !plan.is_noop() {
            patch.slot = Some(plan.to);
        }
        row
    } else {
        find_for_update(tx, project, task)?
    };

    if patch.is_empty() {
        return Ok(locked);
    }
    tx.update_task(project, task, &patch)?
        .ok_or(BoardError::NotFound(NotFound::Task(task)))
}

/// Deletes a task and closes the gap it leaves. Returns the task's bucket.
///
/// # Errors
///
/// Returns [`BoardError::NotFound`] when the task is absent and
/// [`BoardError::Conflict`] when it moved while this call waited for the
/// bucket lock.
pub fn remove_task(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
    task: TaskId,
) -> BoardResult<Bucket> {
    let seen = find_existing(tx, project, task)?;
    tx.lock_bucket(project, seen.bucket())?;
    let locked = lock_unmoved(tx, project, &seen)?;

    if !tx.delete_task(project, task)? {
        return Err(BoardError::NotFound(NotFound::Task(task)));
    }
    let shift = plan_remove(locked.slot());
    let closed = tx.shift_positions(project, &shift)?;
    debug!(%project, %task, slot = %locked.slot(), closed, "removed task");
    Ok(locked.bucket())
}

fn find_existing(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
    task: TaskId,
) -> BoardResult<Task> {
    tx.find_task(project, task)?
        .ok_or(BoardError::NotFound(NotFound::Task(task)))
}

fn find_for_update(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
    task: TaskId,
) -> BoardResult<Task> {
    tx.find_task_for_update(project, task)?
        .ok_or(BoardError::NotFound(NotFound::Task(task)))
}

/// Re-reads `seen` under its row lock and checks it is still in the bucket
/// that was locked.
fn lock_unmoved(
    tx: &mut dyn StoreTransaction,
    project: ProjectId,
    seen: &Task,
) -> BoardResult<Task> {
    let locked = find_for_update(tx, project, seen.id())?;
    if locked.bucket() != seen.bucket() {
        return Err(BoardError::Conflict(ConflictReason::ConcurrentMove(seen.id())));
    }
    Ok(locked)
}

fn reread(tx: &mut dyn StoreTransaction, project: ProjectId, task: TaskId) -> BoardResult<Task> {
    tx.find_task(project, task)?.ok_or_else(|| {
        BoardError::Store(StoreError::corrupt(format!(
            "task {task} missing after insert"
        )))
    })
}
