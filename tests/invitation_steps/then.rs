//! Then steps for invitation BDD scenarios.

use super::world::{InvitationWorld, run_async};
use forgeboard::error::{BoardError, ConflictReason, ErrorKind, NotFound};
use rstest_bdd_macros::then;

fn invite_error(world: &InvitationWorld) -> Result<&BoardError, eyre::Report> {
    match world.last_invite_result.as_ref() {
        Some(Err(err)) => Ok(err),
        Some(Ok(created)) => Err(eyre::eyre!("expected a rejection, created {}", created.id())),
        None => Err(eyre::eyre!("missing invitation result")),
    }
}

#[then("the invitation is rejected as already pending")]
fn rejected_as_pending(world: &InvitationWorld) -> Result<(), eyre::Report> {
    let err = invite_error(world)?;
    if !matches!(err, BoardError::Conflict(ConflictReason::InvitationPending)) {
        return Err(eyre::eyre!("expected a pending-invitation conflict, found {err}"));
    }
    Ok(())
}

#[then("the invitation is rejected as forbidden")]
fn rejected_as_forbidden(world: &InvitationWorld) -> Result<(), eyre::Report> {
    let err = invite_error(world)?;
    if err.kind() != ErrorKind::Forbidden {
        return Err(eyre::eyre!("expected a forbidden error, found {err}"));
    }
    Ok(())
}

#[then("the invitation is created")]
fn invitation_created(world: &InvitationWorld) -> Result<(), eyre::Report> {
    match world.last_invite_result.as_ref() {
        Some(Ok(_)) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("invitation was rejected: {err}")),
        None => Err(eyre::eyre!("missing invitation result")),
    }
}

#[then(r#"the returned board lists "{name}" once"#)]
fn board_lists_member_once(world: &InvitationWorld, name: String) -> Result<(), eyre::Report> {
    let actor = world.actor(&name)?;
    let snapshot = match world.last_answer.as_ref() {
        Some(Ok(Some(snapshot))) => snapshot,
        Some(Ok(None)) => return Err(eyre::eyre!("the answer returned no board")),
        Some(Err(err)) => return Err(eyre::eyre!("the answer failed: {err}")),
        None => return Err(eyre::eyre!("missing answer result")),
    };
    let count = snapshot
        .members
        .iter()
        .filter(|member| member.user_id == actor.user_id())
        .count();
    if count != 1 {
        return Err(eyre::eyre!("expected one membership for {name}, found {count}"));
    }
    Ok(())
}

#[then("the answer is rejected as not found")]
fn answer_not_found(world: &InvitationWorld) -> Result<(), eyre::Report> {
    match world.last_answer.as_ref() {
        Some(Err(BoardError::NotFound(NotFound::Invitation(_)))) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected a missing invitation, found {err}")),
        Some(Ok(_)) => Err(eyre::eyre!("expected the answer to be rejected")),
        None => Err(eyre::eyre!("missing answer result")),
    }
}

#[then(r#""{name}" has {count:usize} pending invitation"#)]
fn pending_count(world: &InvitationWorld, name: String, count: usize) -> Result<(), eyre::Report> {
    let actor = world.actor(&name)?;
    let pending = run_async(world.invites.list_received_invites(&actor, None))?;
    if pending.len() != count {
        return Err(eyre::eyre!(
            "expected {count} pending invitations for {name}, found {}",
            pending.len()
        ));
    }
    Ok(())
}

#[then(r#""{name}" can open the project"#)]
fn can_open_project(world: &InvitationWorld, name: String) -> Result<(), eyre::Report> {
    let actor = world.actor(&name)?;
    let project = world.project()?;
    run_async(world.projects.snapshot(&actor, project))?;
    Ok(())
}
