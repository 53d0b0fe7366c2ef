//! When steps for invitation BDD scenarios.

use super::world::{InvitationWorld, run_async};
use forgeboard::invitation::domain::{Invitation, InvitationId};
use forgeboard::invitation::services::CreateInviteRequest;
use rstest_bdd_macros::when;

fn answered(world: &InvitationWorld) -> Result<InvitationId, eyre::Report> {
    world
        .last_invitation
        .as_ref()
        .map(Invitation::id)
        .ok_or_else(|| eyre::eyre!("missing invitation in scenario world"))
}

#[when(r#""{inviter}" invites "{invitee}""#)]
fn invites(
    world: &mut InvitationWorld,
    inviter: String,
    invitee: String,
) -> Result<(), eyre::Report> {
    let actor = world.actor(&inviter)?;
    let project = world.project()?;
    let result = run_async(
        world
            .invites
            .create_invite(&actor, project, CreateInviteRequest::new(invitee)),
    );
    if let Ok(created) = &result {
        world.last_invitation = Some(created.clone());
    }
    world.last_invite_result = Some(result);
    Ok(())
}

#[when(r#""{invitee}" accepts the invitation"#)]
fn accepts(world: &mut InvitationWorld, invitee: String) -> Result<(), eyre::Report> {
    let actor = world.actor(&invitee)?;
    let invitation = answered(world)?;
    let result = run_async(world.invites.accept_invite(&actor, invitation));
    world.last_answer = Some(result.map(Some));
    Ok(())
}

#[when(r#""{invitee}" declines the invitation"#)]
fn declines(world: &mut InvitationWorld, invitee: String) -> Result<(), eyre::Report> {
    let actor = world.actor(&invitee)?;
    let invitation = answered(world)?;
    let result = run_async(world.invites.decline_invite(&actor, invitation));
    world.last_answer = Some(result.map(|()| None));
    Ok(())
}
