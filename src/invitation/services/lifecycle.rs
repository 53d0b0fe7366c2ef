//! Invitation state machine: create, list, accept, decline and delete.

use crate::config::{DeadlineClass, OperationDeadlines};
use crate::error::{BoardError, BoardResult, ConflictReason, NotFound, log_rejection};
use crate::invitation::domain::{
    Invitation, InvitationDomainError, InvitationId, InvitationStatus, ProjectInvites,
    ReceivedInvitation,
};
use crate::project::domain::{
    Actor, Membership, ProjectId, ProjectSnapshot, RoleKey, UserId, Username,
};
use crate::project::services::access::{display_name, ensure_member, load_snapshot};
use crate::store::ports::{StoreTransaction, TransactionalStore};
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Maximum number of invitations returned for one project.
pub const PROJECT_INVITE_LIST_LIMIT: u32 = 50;

/// Maximum number of invitations returned to one invitee.
pub const RECEIVED_INVITE_LIST_LIMIT: u32 = 50;

/// Request payload for inviting a user to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInviteRequest {
    username: String,
    role_key: Option<String>,
}

impl CreateInviteRequest {
    /// Creates a request inviting the user with `username`.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role_key: None,
        }
    }

    /// Sets the role the membership will carry. Defaults to `member`.
    #[must_use]
    pub fn with_role_key(mut self, role_key: impl Into<String>) -> Self {
        self.role_key = Some(role_key.into());
        self
    }
}

/// Invitation orchestration service.
#[derive(Clone)]
pub struct InvitationService<S, C>
where
    S: TransactionalStore,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    clock: Arc<C>,
    deadlines: OperationDeadlines,
}

impl<S, C> InvitationService<S, C>
where
    S: TransactionalStore,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a service with default deadlines.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            deadlines: OperationDeadlines::default(),
        }
    }

    /// Replaces the operation deadlines.
    #[must_use]
    pub const fn with_deadlines(mut self, deadlines: OperationDeadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// Invites a user, looked up by username, to `project`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `NotFound` for an unknown username,
    /// `Conflict` for self-invitations, existing members or an already
    /// pending invitation, and `Forbidden` when the actor is not a member.
    pub async fn create_invite(
        &self,
        actor: &Actor,
        project: ProjectId,
        request: CreateInviteRequest,
    ) -> BoardResult<Invitation> {
        let result = self.try_create_invite(actor, project, request).await;
        result.inspect_err(|err| log_rejection("create_invite", err))
    }

    async fn try_create_invite(
        &self,
        actor: &Actor,
        project: ProjectId,
        request: CreateInviteRequest,
    ) -> BoardResult<Invitation> {
        let username = Username::new(request.username)?;
        let role_key = RoleKey::or_default_member(request.role_key.as_deref());
        let inviter = actor.clone();
        let clock = Arc::clone(&self.clock);
        let invitation = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Standard), move |tx| {
                let invitee = tx
                    .find_user_by_username(&username)?
                    .ok_or_else(|| BoardError::NotFound(NotFound::User(username.to_string())))?;
                if invitee.id == inviter.user_id() {
                    return Err(InvitationDomainError::SelfInvitation.into());
                }
                ensure_member(tx, project, &inviter)?;
                if tx.is_member(project, invitee.id)? {
                    return Err(BoardError::Conflict(ConflictReason::AlreadyMember));
                }
                if tx.find_pending_invitation(project, invitee.id)?.is_some() {
                    return Err(BoardError::Conflict(ConflictReason::InvitationPending));
                }
                let created =
                    Invitation::new(project, inviter.user_id(), invitee.id, role_key, &*clock)?;
                tx.insert_invitation(&created)?;
                Ok(created)
            })
            .await?;
        info!(
            %project,
            invitation = %invitation.id(),
            invitee = %invitation.invitee_id(),
            "created invitation"
        );
        Ok(invitation)
    }

    /// Lists the newest invitations of `project`, grouped by status.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `Forbidden` when the actor is not a
    /// member.
    pub async fn list_project_invites(
        &self,
        actor: &Actor,
        project: ProjectId,
    ) -> BoardResult<ProjectInvites> {
        let caller = actor.clone();
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Standard), move |tx| {
                ensure_member(tx, project, &caller)?;
                let views = tx.list_project_invitations(project, PROJECT_INVITE_LIST_LIMIT)?;
                Ok(ProjectInvites::partition(views))
            })
            .await;
        result.inspect_err(|err| log_rejection("list_project_invites", err))
    }

    /// Accepts an invitation addressed to the actor.
    ///
    /// The membership is created and the invitation removed in the same
    /// transaction; the returned snapshot already lists the actor.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `NotFound` when no invitation with
    /// this id is addressed to the actor, or `Conflict` when it has already
    /// been answered.
    pub async fn accept_invite(
        &self,
        actor: &Actor,
        invitation: InvitationId,
    ) -> BoardResult<ProjectSnapshot> {
        let invitee = actor.clone();
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Heavy), move |tx| {
                let pending = lock_addressed_to(tx, invitation, invitee.user_id())?;
                pending.ensure_pending()?;

                let username = display_name(tx, &invitee)?;
                let membership = Membership::new(
                    pending.project_id(),
                    invitee.user_id(),
                    username,
                    pending.role_key().clone(),
                );
                tx.insert_membership(&membership)?;
                tx.delete_invitation(invitation)?;
                load_snapshot(tx, pending.project_id())
            })
            .await;
        match &result {
            Ok(snapshot) => info!(
                %invitation,
                project = %snapshot.project.id(),
                member = %actor.user_id(),
                "accepted invitation"
            ),
            Err(err) => log_rejection("accept_invite", err),
        }
        result
    }

    /// Declines a pending invitation addressed to the actor.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `NotFound` when no pending invitation
    /// with this id is addressed to the actor.
    pub async fn decline_invite(
        &self,
        actor: &Actor,
        invitation: InvitationId,
    ) -> BoardResult<()> {
        let invitee = actor.user_id();
        let clock = Arc::clone(&self.clock);
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Standard), move |tx| {
                if tx.decline_invitation(invitation, invitee, clock.utc())? {
                    Ok(())
                } else {
                    Err(BoardError::NotFound(NotFound::Invitation(invitation)))
                }
            })
            .await;
        match &result {
            Ok(()) => info!(%invitation, %invitee, "declined invitation"),
            Err(err) => log_rejection("decline_invite", err),
        }
        result
    }

    /// Deletes an invitation the actor sent.
    ///
    /// Pending invitations are revoked; declined ones are cleared from the
    /// project's list.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `NotFound` when the actor did not
    /// send an invitation with this id.
    pub async fn delete_invite(
        &self,
        actor: &Actor,
        invitation: InvitationId,
    ) -> BoardResult<()> {
        let inviter = actor.user_id();
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Standard), move |tx| {
                let sent = tx
                    .find_invitation_for_update(invitation)?
                    .filter(|found| found.inviter_id() == inviter)
                    .ok_or(BoardError::NotFound(NotFound::Invitation(invitation)))?;
                if !sent.status().is_deletable_by_inviter() {
                    return Err(InvitationDomainError::NotPending(sent.status()).into());
                }
                if tx.delete_invitation(invitation)? {
                    Ok(sent.status())
                } else {
                    Err(BoardError::NotFound(NotFound::Invitation(invitation)))
                }
            })
            .await;
        match result {
            Ok(status) => {
                info!(%invitation, %inviter, %status, "deleted invitation");
                Ok(())
            }
            Err(err) => {
                log_rejection("delete_invite", &err);
                Err(err)
            }
        }
    }

    /// Lists up to [`RECEIVED_INVITE_LIST_LIMIT`] invitations addressed to
    /// the actor, newest first.
    ///
    /// `status` defaults to [`InvitationStatus::Pending`].
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] with kind `Internal` when the store fails.
    pub async fn list_received_invites(
        &self,
        actor: &Actor,
        status: Option<InvitationStatus>,
    ) -> BoardResult<Vec<ReceivedInvitation>> {
        let invitee = actor.user_id();
        let wanted = status.unwrap_or(InvitationStatus::Pending);
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Light), move |tx| {
                Ok(tx.list_received_invitations(
                    invitee,
                    wanted,
                    RECEIVED_INVITE_LIST_LIMIT,
                )?)
            })
            .await;
        result.inspect_err(|err| log_rejection("list_received_invites", err))
    }
}

fn lock_addressed_to(
    tx: &mut dyn StoreTransaction,
    invitation: InvitationId,
    invitee: UserId,
) -> BoardResult<Invitation> {
    tx.find_invitation_for_update(invitation)?
        .filter(|found| found.invitee_id() == invitee)
        .ok_or(BoardError::NotFound(NotFound::Invitation(invitation)))
}
