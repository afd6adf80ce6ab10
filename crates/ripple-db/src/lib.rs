//! # ripple-db
//!
//! Database layer for Ripple. Manages connections to:
//! - **PostgreSQL** — users, conversations, messages (authoritative history)
//! - **Redis** (optional) — revoked-token blocklist

pub mod blocklist;
pub mod repository;

use anyhow::Result;
use sqlx::PgPool;

/// Shared database state passed through Axum extractors.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    /// Present only when `redis.url` is configured.
    pub redis: Option<redis::aio::ConnectionManager>,
}

impl Database {
    /// Connect to PostgreSQL and, if configured, Redis.
    pub async fn connect(config: &ripple_common::config::AppConfig) -> Result<Self> {
        tracing::info!("Connecting to PostgreSQL...");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;
        tracing::info!("Connected to PostgreSQL");

        let redis = match &config.redis.url {
            Some(url) => {
                tracing::info!("Connecting to Redis...");
                let client = redis::Client::open(url.as_str())?;
                let manager = redis::aio::ConnectionManager::new(client).await?;
                tracing::info!("Connected to Redis");
                Some(manager)
            }
            None => {
                tracing::warn!("No redis.url configured — token blocklist disabled");
                None
            }
        };

        Ok(Self { pool, redis })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Migrations complete");
        Ok(())
    }
}
