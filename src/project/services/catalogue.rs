//! Project creation and member-scoped project reads.

use super::access::{display_name, ensure_member, load_snapshot};
use crate::config::{DeadlineClass, OperationDeadlines};
use crate::error::{BoardResult, log_rejection};
use crate::project::domain::{
    Actor, Membership, Project, ProjectId, ProjectName, ProjectSnapshot, RoleKey,
};
use crate::store::ports::TransactionalStore;
use mockable::Clock;
use std::sync::Arc;
use tracing::info;

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    name: String,
    description: Option<String>,
}

impl CreateProjectRequest {
    /// Creates a request with the required name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Sets the project description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Project orchestration service.
#[derive(Clone)]
pub struct ProjectService<S, C>
where
    S: TransactionalStore,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<S>,
    clock: Arc<C>,
    deadlines: OperationDeadlines,
}

impl<S, C> ProjectService<S, C>
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

    /// Creates a project owned by `actor`, who becomes its first member.
    ///
    /// The project is placed after the owner's existing projects.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BoardError`] with kind `Validation` for an
    /// empty name, or `Internal` when the store fails.
    pub async fn create_project(
        &self,
        actor: &Actor,
        request: CreateProjectRequest,
    ) -> BoardResult<ProjectSnapshot> {
        let result = self.try_create_project(actor, request).await;
        result.inspect_err(|err| log_rejection("create_project", err))
    }

    async fn try_create_project(
        &self,
        actor: &Actor,
        request: CreateProjectRequest,
    ) -> BoardResult<ProjectSnapshot> {
        let name = ProjectName::new(request.name)?;
        let description = request.description.unwrap_or_default();
        let owner = actor.clone();
        let clock = Arc::clone(&self.clock);
        let snapshot = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Light), move |tx| {
                let sort_index = tx.next_project_sort_index(owner.user_id())?;
                let project =
                    Project::new(name, description, owner.user_id(), sort_index, &*clock);
                tx.insert_project(&project)?;
                let username = display_name(tx, &owner)?;
                tx.insert_membership(&Membership::new(
                    project.id(),
                    owner.user_id(),
                    username,
                    RoleKey::owner(),
                ))?;
                load_snapshot(tx, project.id())
            })
            .await?;
        info!(
            project = %snapshot.project.id(),
            owner = %actor.user_id(),
            sort_index = snapshot.project.sort_index(),
            "created project"
        );
        Ok(snapshot)
    }

    /// Lists every project the actor belongs to, with members and tasks.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BoardError`] with kind `Internal` when the
    /// store fails.
    pub async fn list_projects(&self, actor: &Actor) -> BoardResult<Vec<ProjectSnapshot>> {
        let member = actor.user_id();
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Light), move |tx| {
                tx.list_member_projects(member)?
                    .into_iter()
                    .map(|project| load_snapshot(tx, project.id()))
                    .collect::<BoardResult<Vec<_>>>()
            })
            .await;
        result.inspect_err(|err| log_rejection("list_projects", err))
    }

    /// Reads one project the actor belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::BoardError`] with kind `Forbidden` for
    /// non-members, `NotFound` when the project is gone, or `Internal` when
    /// the store fails.
    pub async fn snapshot(
        &self,
        actor: &Actor,
        project: ProjectId,
    ) -> BoardResult<ProjectSnapshot> {
        let caller = actor.clone();
        let result = self
            .store
            .transaction(self.deadlines.for_class(DeadlineClass::Light), move |tx| {
                ensure_member(tx, project, &caller)?;
                load_snapshot(tx, project)
            })
            .await;
        result.inspect_err(|err| log_rejection("snapshot", err))
    }
}
