//! In-memory board store for unit, integration and behaviour tests.

mod transaction;

use crate::project::domain::UserAccount;
use crate::store::ports::{StoreError, StoreTransaction, TransactionalStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use transaction::{BoardState, MemoryTransaction};

/// Thread-safe in-memory board store.
///
/// Transactions are serialised by one mutex. A transaction runs against a
/// clone of the state and replaces the shared state only when the operation
/// succeeds, the slot constraint holds and the deadline has not elapsed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardStore {
    state: Arc<Mutex<BoardState>>,
}

impl InMemoryBoardStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose user directory holds `users`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the state lock is poisoned.
    pub fn with_users(users: impl IntoIterator<Item = UserAccount>) -> Result<Self, StoreError> {
        let store = Self::new();
        for user in users {
            store.register_user(user)?;
        }
        Ok(store)
    }

    /// Adds or replaces a user directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the state lock is poisoned.
    pub fn register_user(&self, user: UserAccount) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        state.users.insert(user.id, user);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BoardState>, StoreError> {
        self.state
            .lock()
            .map_err(|err| StoreError::connection(format!("store state lock poisoned: {err}")))
    }

    fn run<T, E, F>(&self, deadline: Duration, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
        E: From<StoreError>,
    {
        let started = Instant::now();
        let mut shared = self.lock()?;
        let mut working = shared.clone();

        let value = operation(&mut MemoryTransaction::new(&mut working))?;
        working.check_task_slots()?;

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            debug!(?elapsed, ?deadline, "rolling back transaction past its deadline");
            return Err(StoreError::DeadlineExceeded(deadline).into());
        }

        *shared = working;
        Ok(value)
    }
}

#[async_trait]
impl TransactionalStore for InMemoryBoardStore {
    async fn transaction<T, E, F>(&self, deadline: Duration, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        self.run(deadline, operation)
    }
}
