//! Fixtures wiring the board services to a throwaway `PostgreSQL` database.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster};
use super::cluster::TemporaryDatabase;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::{BigInt, Text, Uuid as SqlUuid};
use forgeboard::invitation::services::InvitationService;
use forgeboard::project::domain::{
    Actor, ProjectId, ProjectSnapshot, UserAccount, UserId, Username,
};
use forgeboard::project::services::ProjectService;
use forgeboard::store::adapters::postgres::PostgresBoardStore;
use forgeboard::store::adapters::postgres::migrations::apply_pending;
use forgeboard::task::domain::Bucket;
use forgeboard::task::services::TaskBoardService;
use mockable::DefaultClock;
use rstest::fixture;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Database every test database is cloned from.
pub const TEMPLATE_DB: &str = "forgeboard_test_template";

/// Connections per test pool; enough for the concurrency tests to race.
const POOL_SIZE: u32 = 4;

/// Builds the runtime tests drive the async services with.
///
/// # Errors
///
/// Returns an error when the runtime cannot start.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?)
}

/// Creates the migrated template database once per cluster.
///
/// # Errors
///
/// Returns an error when the template cannot be created or migrated.
pub fn ensure_template(cluster: PostgresCluster) -> Result<(), BoxError> {
    cluster.ensure_template_exists(TEMPLATE_DB, |url| {
        let mut conn = PgConnection::establish(url)?;
        apply_pending(&mut conn)?;
        Ok(())
    })
}

/// Row shape for `SELECT count(*) AS count` queries.
#[derive(QueryableByName)]
pub struct CountRow {
    /// The counted rows.
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Board services over a fresh database whose directory holds alice, bob
/// and carol.
pub struct PgBoard {
    pub projects: ProjectService<PostgresBoardStore, DefaultClock>,
    pub tasks: TaskBoardService<PostgresBoardStore, DefaultClock>,
    pub invites: InvitationService<PostgresBoardStore, DefaultClock>,
    pub store: Arc<PostgresBoardStore>,
    pub alice: Actor,
    pub bob: Actor,
    pub carol: Actor,
    db: TemporaryDatabase,
    runtime: Runtime,
}

impl PgBoard {
    /// Runs `future` to completion on the board's runtime.
    pub fn run<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Opens a direct connection to the test database.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection fails.
    pub fn connection(&self) -> Result<PgConnection, BoxError> {
        Ok(PgConnection::establish(&self.db.url())?)
    }

    /// Counts `project`'s rows in `table` that match `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error when the query fails.
    pub fn count_rows(
        &self,
        table: &str,
        project: ProjectId,
        filter: &str,
    ) -> Result<i64, BoxError> {
        let sql = format!("SELECT count(*) AS count FROM {table} WHERE project_id = $1 {filter}");
        let row = diesel::sql_query(sql)
            .bind::<SqlUuid, _>(project.into_inner())
            .get_result::<CountRow>(&mut self.connection()?)?;
        Ok(row.count)
    }

    /// Adds a directory entry and returns it as an actor.
    ///
    /// # Errors
    ///
    /// Returns an error when the insert fails.
    pub fn register_user(&self, name: &str) -> Result<Actor, BoxError> {
        let account = insert_user(&mut self.connection()?, name)?;
        Ok(account.as_actor())
    }
}

fn insert_user(conn: &mut PgConnection, name: &str) -> Result<UserAccount, BoxError> {
    let account = UserAccount::new(UserId::new(), Username::new(name)?);
    diesel::sql_query("INSERT INTO users (id, username) VALUES ($1, $2)")
        .bind::<SqlUuid, _>(account.id.into_inner())
        .bind::<Text, _>(account.username.as_str())
        .execute(conn)?;
    Ok(account)
}

/// Provides board services over a database cloned from the template.
///
/// # Errors
///
/// Returns an error when the database or its pool cannot be set up.
#[fixture]
pub fn pg_board(postgres_cluster: PostgresCluster) -> Result<PgBoard, BoxError> {
    ensure_template(postgres_cluster)?;
    let db = postgres_cluster.temporary_database_from_template(
        &format!("forgeboard_test_{}", uuid::Uuid::new_v4().simple()),
        TEMPLATE_DB,
    )?;

    let mut conn = PgConnection::establish(&db.url())?;
    let [alice, bob, carol] = [
        insert_user(&mut conn, "alice")?,
        insert_user(&mut conn, "bob")?,
        insert_user(&mut conn, "carol")?,
    ];
    drop(conn);

    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(ConnectionManager::<PgConnection>::new(db.url()))?;
    let store = Arc::new(PostgresBoardStore::new(pool));
    let clock = Arc::new(DefaultClock);
    Ok(PgBoard {
        projects: ProjectService::new(Arc::clone(&store), Arc::clone(&clock)),
        tasks: TaskBoardService::new(Arc::clone(&store), Arc::clone(&clock)),
        invites: InvitationService::new(Arc::clone(&store), clock),
        store,
        alice: alice.as_actor(),
        bob: bob.as_actor(),
        carol: carol.as_actor(),
        db,
        runtime: test_runtime()?,
    })
}

/// Titles of `bucket`'s tasks in position order, with their positions.
#[must_use]
pub fn column(snapshot: &ProjectSnapshot, bucket: Bucket) -> Vec<(String, u32)> {
    snapshot
        .tasks
        .iter()
        .filter(|task| task.bucket() == bucket)
        .map(|task| (task.title().as_str().to_owned(), task.position().value()))
        .collect()
}

/// Returns `true` when every bucket of the snapshot holds positions `0..n`.
#[must_use]
pub fn is_dense(snapshot: &ProjectSnapshot) -> bool {
    Bucket::ALL.iter().all(|bucket| {
        column(snapshot, *bucket)
            .iter()
            .enumerate()
            .all(|(index, (_, position))| u32::try_from(index).ok() == Some(*position))
    })
}
