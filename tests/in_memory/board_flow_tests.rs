//! In-memory integration tests for task placement.

use super::helpers::{Board, board, column, is_dense};
use forgeboard::error::ErrorKind;
use forgeboard::project::services::CreateProjectRequest;
use forgeboard::task::domain::Bucket;
use forgeboard::task::services::{CreateTaskRequest, UpdateTaskRequest};
use rstest::rstest;

fn titled(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs
        .iter()
        .map(|(title, position)| ((*title).to_owned(), *position))
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn snapshot_orders_tasks_by_bucket_then_position(
    board: Result<Board, eyre::Report>,
) -> Result<(), eyre::Report> {
    let board = board?;
    let project = board
        .projects
        .create_project(&board.alice, CreateProjectRequest::new("Launch"))
        .await?
        .project
        .id();
    for (title, bucket) in [
        ("ship", "done"),
        ("design", "backlog"),
        ("build", "inProgress"),
        ("wait", "blocked"),
        ("polish", "backlog"),
    ] {
        board
            .tasks
            .create_task(
                &board.alice,
                project,
                CreateTaskRequest::new(title).with_bucket(bucket),
            )
            .await?;
    }

    let snapshot = board.projects.snapshot(&board.alice, project).await?;
    let order: Vec<&str> = snapshot
        .tasks
        .iter()
        .map(|task| task.title().as_str())
        .collect();

    eyre::ensure!(
        order == ["design", "polish", "build", "wait", "ship"],
        "unexpected board order {order:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_day_of_board_edits_keeps_buckets_dense(
    board: Result<Board, eyre::Report>,
) -> Result<(), eyre::Report> {
    let board = board?;
    let project = board
        .projects
        .create_project(&board.alice, CreateProjectRequest::new("Sprint"))
        .await?
        .project
        .id();
    let mut ids = Vec::new();
    for title in ["a", "b", "c", "d", "e"] {
        let task = board
            .tasks
            .create_task(&board.alice, project, CreateTaskRequest::new(title))
            .await?;
        ids.push(task.id());
    }
    let [a, b, c, d, e] = *ids.as_slice() else {
        eyre::bail!("expected five tasks");
    };

    let edits = [
        (c, UpdateTaskRequest::new().with_bucket("inProgress")),
        (a, UpdateTaskRequest::new().with_position(3)),
        (e, UpdateTaskRequest::new().with_bucket("inProgress").with_position(0)),
        (b, UpdateTaskRequest::new().with_bucket("done")),
        (c, UpdateTaskRequest::new().with_bucket("done").with_position(0)),
    ];
    for (task, edit) in edits {
        board.tasks.update_task(&board.alice, project, task, edit).await?;
        let snapshot = board.projects.snapshot(&board.alice, project).await?;
        eyre::ensure!(is_dense(&snapshot), "positions lost density");
    }
    board.tasks.delete_task(&board.alice, project, d).await?;

    let snapshot = board.projects.snapshot(&board.alice, project).await?;
    eyre::ensure!(is_dense(&snapshot), "positions lost density after delete");
    eyre::ensure!(column(&snapshot, Bucket::Backlog) == titled(&[("a", 0)]));
    eyre::ensure!(column(&snapshot, Bucket::InProgress) == titled(&[("e", 0)]));
    eyre::ensure!(column(&snapshot, Bucket::Done) == titled(&[("c", 0), ("b", 1)]));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn projects_do_not_share_buckets(
    board: Result<Board, eyre::Report>,
) -> Result<(), eyre::Report> {
    let board = board?;
    let first = board
        .projects
        .create_project(&board.alice, CreateProjectRequest::new("One"))
        .await?
        .project
        .id();
    let second = board
        .projects
        .create_project(&board.alice, CreateProjectRequest::new("Two"))
        .await?
        .project
        .id();

    board
        .tasks
        .create_task(&board.alice, first, CreateTaskRequest::new("x"))
        .await?;
    let other = board
        .tasks
        .create_task(&board.alice, second, CreateTaskRequest::new("y"))
        .await?;

    eyre::ensure!(other.position().value() == 0, "second project starts at zero");

    let err = board
        .tasks
        .create_task(&board.bob, first, CreateTaskRequest::new("z"))
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("bob is not a member"))?;
    eyre::ensure!(err.kind() == ErrorKind::Forbidden);
    Ok(())
}
