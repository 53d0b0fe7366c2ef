//! When steps for dense task ordering BDD scenarios.

use super::world::{OrderingWorld, run_async};
use forgeboard::task::services::UpdateTaskRequest;
use rstest_bdd_macros::when;

fn submit(
    world: &mut OrderingWorld,
    title: &str,
    request: UpdateTaskRequest,
) -> Result<(), eyre::Report> {
    let (owner, project) = world.board()?;
    let task = world.task(title)?;
    world.last_error = run_async(world.tasks.update_task(&owner, project, task, request)).err();
    Ok(())
}

#[when(r#""{title}" is moved to position {position:i64}"#)]
fn move_to_position(
    world: &mut OrderingWorld,
    title: String,
    position: i64,
) -> Result<(), eyre::Report> {
    submit(world, &title, UpdateTaskRequest::new().with_position(position))
}

#[when(r#""{title}" is moved to the "{bucket}" bucket"#)]
fn move_to_bucket(
    world: &mut OrderingWorld,
    title: String,
    bucket: String,
) -> Result<(), eyre::Report> {
    submit(world, &title, UpdateTaskRequest::new().with_bucket(bucket))
}

#[when(r#""{title}" is deleted"#)]
fn delete_task(world: &mut OrderingWorld, title: String) -> Result<(), eyre::Report> {
    let (owner, project) = world.board()?;
    let task = world.task(&title)?;
    world.last_error = run_async(world.tasks.delete_task(&owner, project, task)).err();
    Ok(())
}
