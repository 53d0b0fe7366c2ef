//! Constraint handling of the `PostgreSQL` store transaction.

use crate::postgres::helpers::{BoxError, PgBoard, pg_board};
use forgeboard::error::{BoardError, ConflictReason};
use forgeboard::invitation::domain::Invitation;
use forgeboard::project::domain::{Actor, Membership, ProjectId, RoleKey};
use forgeboard::project::services::CreateProjectRequest;
use forgeboard::store::ports::{
    PENDING_INVITATION_CONSTRAINT, StoreError, TASK_SLOT_CONSTRAINT, TransactionalStore,
};
use forgeboard::task::domain::ordering::plan_insert;
use forgeboard::task::domain::{Bucket, Difficulty, Position, Task, TaskSpec, TaskTitle};
use mockable::DefaultClock;
use rstest::rstest;
use std::time::Duration;

const DEADLINE: Duration = Duration::from_secs(5);

fn project_of_alice(board: &PgBoard) -> Result<ProjectId, BoxError> {
    Ok(board
        .run(
            board
                .projects
                .create_project(&board.alice, CreateProjectRequest::new("Depot")),
        )?
        .project
        .id())
}

fn backlog_task(project: ProjectId, title: &str, position: i64) -> Result<Task, BoxError> {
    let spec = TaskSpec {
        project_id: project,
        bucket: Bucket::Backlog,
        title: TaskTitle::new(title)?,
        details: String::new(),
        assignee_id: None,
        difficulty: Difficulty::DEFAULT,
    };
    Ok(Task::new(spec, Position::new(position)?, &DefaultClock))
}

fn membership(project: ProjectId, actor: &Actor) -> Membership {
    Membership::new(
        project,
        actor.user_id(),
        actor.username().clone(),
        RoleKey::member(),
    )
}

#[rstest]
fn second_pending_row_names_the_partial_index(
    pg_board: Result<PgBoard, BoxError>,
) -> Result<(), BoxError> {
    let board = pg_board?;
    let project = project_of_alice(&board)?;
    let (alice, bob) = (board.alice.user_id(), board.bob.user_id());
    let first = Invitation::new(project, alice, bob, RoleKey::member(), &DefaultClock)?;
    let second = Invitation::new(project, alice, bob, RoleKey::member(), &DefaultClock)?;

    board.run(
        board
            .store
            .transaction(DEADLINE, move |tx| tx.insert_invitation(&first)),
    )?;
    let err = board
        .run(
            board
                .store
                .transaction(DEADLINE, move |tx| tx.insert_invitation(&second)),
        )
        .err()
        .ok_or("a second pending row was accepted")?;

    assert!(
        matches!(
            &err,
            StoreError::UniqueViolation { constraint: Some(name) }
                if name == PENDING_INVITATION_CONSTRAINT
        ),
        "{err:?}"
    );
    assert!(matches!(
        BoardError::from(err),
        BoardError::Conflict(ConflictReason::InvitationPending)
    ));
    assert_eq!(board.count_rows("project_invites", project, "")?, 1);
    Ok(())
}

#[rstest]
fn existing_membership_is_left_untouched(
    pg_board: Result<PgBoard, BoxError>,
) -> Result<(), BoxError> {
    let board = pg_board?;
    let project = project_of_alice(&board)?;
    let owner_again = membership(project, &board.alice);
    let newcomer = membership(project, &board.bob);

    let written = board.run(board.store.transaction(DEADLINE, move |tx| {
        Ok::<_, StoreError>([
            tx.insert_membership(&owner_again)?,
            tx.insert_membership(&newcomer)?,
            tx.insert_membership(&newcomer)?,
        ])
    }))?;

    assert_eq!(written, [false, true, false]);
    assert_eq!(board.count_rows("projects_members", project, "")?, 2);
    Ok(())
}

#[rstest]
fn slot_clash_is_rejected_when_the_transaction_commits(
    pg_board: Result<PgBoard, BoxError>,
) -> Result<(), BoxError> {
    let board = pg_board?;
    let project = project_of_alice(&board)?;
    let first = backlog_task(project, "first", 0)?;
    let clash = backlog_task(project, "clash", 0)?;

    let outcome = board.run(board.store.transaction(DEADLINE, move |tx| {
        tx.insert_task(&first)?;
        // The check is deferred, so the clashing write itself succeeds.
        tx.insert_task(&clash)
    }));

    assert!(
        matches!(
            &outcome,
            Err(StoreError::UniqueViolation { constraint: Some(name) })
                if name == TASK_SLOT_CONSTRAINT
        ),
        "{outcome:?}"
    );
    assert_eq!(board.count_rows("tasks", project, "")?, 0);
    Ok(())
}

#[rstest]
fn shifting_through_occupied_slots_commits(
    pg_board: Result<PgBoard, BoxError>,
) -> Result<(), BoxError> {
    let board = pg_board?;
    let project = project_of_alice(&board)?;
    let tasks = [
        backlog_task(project, "a", 0)?,
        backlog_task(project, "b", 1)?,
        backlog_task(project, "c", 2)?,
    ];
    board.run(board.store.transaction(DEADLINE, move |tx| {
        tasks.iter().try_for_each(|task| tx.insert_task(task))
    }))?;

    let top = backlog_task(project, "top", 0)?;
    let listed = board.run(board.store.transaction(DEADLINE, move |tx| {
        let held = tx.lock_bucket(project, Bucket::Backlog)?;
        let plan = plan_insert(Bucket::Backlog, held, Some(top.position()));
        if let Some(shift) = plan.shift {
            tx.shift_positions(project, &shift)?;
        }
        tx.insert_task(&top)?;
        tx.list_tasks(project)
    }))?;

    let order: Vec<(&str, u32)> = listed
        .iter()
        .map(|task| (task.title().as_str(), task.position().value()))
        .collect();
    assert_eq!(order, [("top", 0), ("a", 1), ("b", 2), ("c", 3)]);
    Ok(())
}
