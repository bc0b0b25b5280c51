//! # agenthub-db
//!
//! Persistence layer for Agent Hub. Everything lives in **PostgreSQL**:
//! users and tokens, agents, channels, chats and messages, boards and tasks.
//! Repository functions are plain `async fn`s over a [`sqlx::PgPool`].

pub mod postgres;
pub mod repository;

use agenthub_common::config::DatabaseConfig;
use anyhow::Result;
use sqlx::PgPool;

/// Shared database handle passed through application state.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        tracing::info!("Connecting to PostgreSQL...");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// Wrap a pool that was built elsewhere (tests use a lazy pool).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }
}
