use crate::config::Postgres;
use diesel_async::AsyncMigrationHarness;
use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::{BuildError, Pool, PoolError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use thiserror::Error;
use tracing::info;

pub mod models;
pub mod schema;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type PgPool = Pool<AsyncPgConnection>;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("postgres pool error: `{0}`")]
    PgPool(#[from] PoolError),
    #[error("migration failed: `{0}`")]
    Migration(String),
    #[error("migration task panicked: `{0}`")]
    Join(#[from] tokio::task::JoinError),
}

pub fn init_pg_pool(postgres: &Postgres) -> Result<PgPool, BuildError> {
    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(postgres.database_url());
    Pool::builder(config).build()
}

/// Creates the `cars` table if it is not there yet.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let conn = pool.get().await?;
    // the harness drives the connection with a blocking executor
    let applied = tokio::task::spawn_blocking(move || {
        let mut harness = AsyncMigrationHarness::new(conn);
        harness
            .run_pending_migrations(MIGRATIONS)
            .map(|versions| versions.len())
            .map_err(|e| MigrationError::Migration(e.to_string()))
    })
    .await??;
    info!("applied `{applied}` pending migrations");
    Ok(())
}
