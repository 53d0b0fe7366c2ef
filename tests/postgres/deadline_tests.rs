//! Transaction deadlines enforced by the `PostgreSQL` store.

use crate::postgres::helpers::{BoxError, PgBoard, pg_board};
use forgeboard::config::OperationDeadlines;
use forgeboard::project::domain::ProjectId;
use forgeboard::project::services::CreateProjectRequest;
use forgeboard::store::ports::{StoreError, TransactionalStore};
use forgeboard::task::domain::{Bucket, Difficulty, Position, Task, TaskSpec, TaskTitle};
use forgeboard::task::services::{CreateTaskRequest, TaskBoardService};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn project_of_alice(board: &PgBoard) -> Result<ProjectId, BoxError> {
    Ok(board
        .run(
            board
                .projects
                .create_project(&board.alice, CreateProjectRequest::new("Ops")),
        )?
        .project
        .id())
}

#[rstest]
fn zero_deadline_rolls_the_insert_back(
    pg_board: Result<PgBoard, BoxError>,
) -> Result<(), BoxError> {
    let board = pg_board?;
    let project = project_of_alice(&board)?;
    let hurried = TaskBoardService::new(Arc::clone(&board.store), Arc::new(DefaultClock))
        .with_deadlines(OperationDeadlines::uniform(Duration::ZERO));

    let err = board
        .run(hurried.create_task(&board.alice, project, CreateTaskRequest::new("lost")))
        .err()
        .ok_or("a zero deadline cannot be met")?;

    assert_eq!(err.public_message(), "request timed out");
    assert_eq!(board.count_rows("tasks", project, "")?, 0);
    let kept = board.run(board.tasks.create_task(
        &board.alice,
        project,
        CreateTaskRequest::new("kept"),
    ))?;
    assert_eq!(kept.position().value(), 0);
    Ok(())
}

#[rstest]
fn slow_operation_is_not_committed(pg_board: Result<PgBoard, BoxError>) -> Result<(), BoxError> {
    let board = pg_board?;
    let project = project_of_alice(&board)?;
    let spec = TaskSpec {
        project_id: project,
        bucket: Bucket::Backlog,
        title: TaskTitle::new("late")?,
        details: String::new(),
        assignee_id: None,
        difficulty: Difficulty::DEFAULT,
    };
    let task = Task::new(spec, Position::new(0)?, &DefaultClock);
    let deadline = Duration::from_millis(20);

    let outcome = board.run(board.store.transaction(deadline, move |tx| {
        tx.insert_task(&task)?;
        std::thread::sleep(deadline * 3);
        Ok::<_, StoreError>(())
    }));

    assert!(
        matches!(outcome, Err(StoreError::DeadlineExceeded(limit)) if limit == deadline),
        "{outcome:?}"
    );
    assert_eq!(board.count_rows("tasks", project, "")?, 0);
    Ok(())
}
