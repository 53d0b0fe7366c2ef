//! In-memory integration tests for joining a project through an invitation.

use super::helpers::{Board, board, column};
use forgeboard::error::ErrorKind;
use forgeboard::invitation::domain::InvitationStatus;
use forgeboard::invitation::services::{CreateInviteRequest, RECEIVED_INVITE_LIST_LIMIT};
use forgeboard::project::services::CreateProjectRequest;
use forgeboard::task::domain::Bucket;
use forgeboard::task::services::{CreateTaskRequest, UpdateTaskRequest};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invitee_joins_and_edits_the_board(
    board: Result<Board, eyre::Report>,
) -> Result<(), eyre::Report> {
    let board = board?;
    let project = board
        .projects
        .create_project(&board.alice, CreateProjectRequest::new("Garden"))
        .await?
        .project
        .id();
    let weeding = board
        .tasks
        .create_task(&board.alice, project, CreateTaskRequest::new("weed"))
        .await?;

    let before = board.projects.list_projects(&board.bob).await?;
    eyre::ensure!(before.is_empty(), "bob sees a project before joining");

    let invite = board
        .invites
        .create_invite(&board.alice, project, CreateInviteRequest::new("Bob"))
        .await?;
    let received = board.invites.list_received_invites(&board.bob, None).await?;
    eyre::ensure!(received.len() == 1, "expected one pending invitation");

    let joined = board.invites.accept_invite(&board.bob, invite.id()).await?;
    eyre::ensure!(joined.has_member(board.bob.user_id()), "bob is not a member");

    board
        .tasks
        .create_task(
            &board.bob,
            project,
            CreateTaskRequest::new("water").at_position(0),
        )
        .await?;
    board
        .tasks
        .update_task(
            &board.bob,
            project,
            weeding.id(),
            UpdateTaskRequest::new().with_bucket("done"),
        )
        .await?;

    let snapshot = board.projects.snapshot(&board.alice, project).await?;
    eyre::ensure!(column(&snapshot, Bucket::Backlog) == [("water".to_owned(), 0)]);
    eyre::ensure!(column(&snapshot, Bucket::Done) == [("weed".to_owned(), 0)]);

    let listed = board.projects.list_projects(&board.bob).await?;
    eyre::ensure!(listed.len() == 1, "bob should see the joined project");

    let pending = board
        .invites
        .list_received_invites(&board.bob, Some(InvitationStatus::Pending))
        .await?;
    eyre::ensure!(pending.is_empty(), "accepted invitation is still listed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn declined_invitee_stays_outside(
    board: Result<Board, eyre::Report>,
) -> Result<(), eyre::Report> {
    let board = board?;
    let project = board
        .projects
        .create_project(&board.alice, CreateProjectRequest::new("Garden"))
        .await?
        .project
        .id();
    let invite = board
        .invites
        .create_invite(&board.alice, project, CreateInviteRequest::new("bob"))
        .await?;

    board.invites.decline_invite(&board.bob, invite.id()).await?;

    let err = board
        .projects
        .snapshot(&board.bob, project)
        .await
        .err()
        .ok_or_else(|| eyre::eyre!("bob declined and must not see the board"))?;
    eyre::ensure!(err.kind() == ErrorKind::Forbidden);

    let declined = board
        .invites
        .list_received_invites(&board.bob, Some(InvitationStatus::Declined))
        .await?;
    eyre::ensure!(declined.len() == 1, "declined invitation should be listed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn received_invites_stop_at_the_list_limit(
    board: Result<Board, eyre::Report>,
) -> Result<(), eyre::Report> {
    let board = board?;
    for index in 0..=RECEIVED_INVITE_LIST_LIMIT {
        let project = board
            .projects
            .create_project(&board.alice, CreateProjectRequest::new(format!("P{index}")))
            .await?
            .project
            .id();
        board
            .invites
            .create_invite(&board.alice, project, CreateInviteRequest::new("bob"))
            .await?;
    }

    let received = board.invites.list_received_invites(&board.bob, None).await?;
    eyre::ensure!(
        received.len() == usize::try_from(RECEIVED_INVITE_LIST_LIMIT)?,
        "expected {RECEIVED_INVITE_LIST_LIMIT} invitations, got {}",
        received.len()
    );
    eyre::ensure!(
        received
            .windows(2)
            .all(|pair| matches!(pair, [newer, older] if newer.created_at >= older.created_at)),
        "received invitations are not newest first"
    );
    Ok(())
}
