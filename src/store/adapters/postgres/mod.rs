//! `PostgreSQL` board store built on Diesel and r2d2.
//!
//! Every [`TransactionalStore::transaction`] call checks out one pooled
//! connection on the blocking thread pool and runs the operation inside a
//! single database transaction. The deadline is enforced twice: as a
//! `statement_timeout` for the server, and by checking the elapsed time
//! before commit.

pub mod migrations;
mod models;
mod schema;
mod transaction;

use crate::config::BoardConfig;
use crate::store::ports::{StoreError, StoreTransaction, TransactionalStore};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use std::time::{Duration, Instant};
use tracing::debug;

use transaction::{PgTransaction, map_diesel_error};

/// `PostgreSQL` connection pool used by the board store.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed board store.
#[derive(Debug, Clone)]
pub struct PostgresBoardStore {
    pool: BoardPgPool,
}

impl PostgresBoardStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    /// Builds a pool from `config` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] when the pool cannot open its
    /// initial connections.
    pub fn connect(config: &BoardConfig) -> Result<Self, StoreError> {
        let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
        let pool = Pool::builder()
            .max_size(config.pool_max_size)
            .build(manager)
            .map_err(StoreError::connection)?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TransactionalStore for PostgresBoardStore {
    async fn transaction<T, E, F>(&self, deadline: Duration, operation: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || run_in_transaction(&pool, deadline, operation))
            .await
            .map_err(|err| StoreError::connection(format!("task join error: {err}")))?
    }
}

/// Why a database transaction was rolled back.
enum TxAbort<E> {
    Store(StoreError),
    Operation(E),
}

impl<E> From<diesel::result::Error> for TxAbort<E> {
    fn from(err: diesel::result::Error) -> Self {
        Self::Store(map_diesel_error(err))
    }
}

impl<E: From<StoreError>> TxAbort<E> {
    fn into_error(self) -> E {
        match self {
            Self::Store(err) => err.into(),
            Self::Operation(err) => err,
        }
    }
}

fn run_in_transaction<T, E, F>(pool: &BoardPgPool, deadline: Duration, operation: F) -> Result<T, E>
where
    F: FnOnce(&mut dyn StoreTransaction) -> Result<T, E>,
    E: From<StoreError>,
{
    let started = Instant::now();
    let mut pooled = pool.get().map_err(StoreError::connection)?;
    let connection: &mut PgConnection = &mut pooled;

    let outcome = connection.transaction::<T, TxAbort<E>, _>(|conn| {
        diesel::sql_query(format!(
            "SET LOCAL statement_timeout = {}",
            statement_timeout_millis(deadline)
        ))
        .execute(conn)?;

        let value = operation(&mut PgTransaction::new(conn, started, deadline))
            .map_err(TxAbort::Operation)?;

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            debug!(?elapsed, ?deadline, "rolling back transaction past its deadline");
            return Err(TxAbort::Store(StoreError::DeadlineExceeded(deadline)));
        }
        Ok(value)
    });
    outcome.map_err(TxAbort::into_error)
}

/// Server-side timeout for `deadline`; `0` would disable the timeout.
fn statement_timeout_millis(deadline: Duration) -> u128 {
    deadline.as_millis().max(1)
}
