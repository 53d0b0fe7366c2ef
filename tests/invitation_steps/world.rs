//! Shared world state for invitation BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use forgeboard::error::BoardResult;
use forgeboard::invitation::domain::Invitation;
use forgeboard::invitation::services::InvitationService;
use forgeboard::project::domain::{Actor, ProjectId, ProjectSnapshot};
use forgeboard::project::services::ProjectService;
use forgeboard::store::adapters::memory::InMemoryBoardStore;
use mockable::DefaultClock;
use rstest::fixture;

/// Scenario world for invitation behaviour tests.
pub struct InvitationWorld {
    pub store: Arc<InMemoryBoardStore>,
    pub projects: ProjectService<InMemoryBoardStore, DefaultClock>,
    pub invites: InvitationService<InMemoryBoardStore, DefaultClock>,
    pub actors: HashMap<String, Actor>,
    pub project: Option<ProjectId>,
    pub last_invitation: Option<Invitation>,
    pub last_invite_result: Option<BoardResult<Invitation>>,
    pub last_answer: Option<BoardResult<Option<ProjectSnapshot>>>,
}

impl InvitationWorld {
    /// Creates a world over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryBoardStore::new());
        let clock = Arc::new(DefaultClock);
        Self {
            projects: ProjectService::new(Arc::clone(&store), Arc::clone(&clock)),
            invites: InvitationService::new(Arc::clone(&store), clock),
            store,
            actors: HashMap::new(),
            project: None,
            last_invitation: None,
            last_invite_result: None,
            last_answer: None,
        }
    }

    /// Looks up a user registered by an earlier step.
    ///
    /// # Errors
    ///
    /// Returns an error when `name` was never registered.
    pub fn actor(&self, name: &str) -> Result<Actor, eyre::Report> {
        self.actors
            .get(name)
            .cloned()
            .ok_or_else(|| eyre::eyre!("unknown user {name} in scenario world"))
    }

    /// Returns the project created by an earlier step.
    ///
    /// # Errors
    ///
    /// Returns an error when no project exists yet.
    pub fn project(&self) -> Result<ProjectId, eyre::Report> {
        self.project
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }
}

impl Default for InvitationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> InvitationWorld {
    InvitationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
