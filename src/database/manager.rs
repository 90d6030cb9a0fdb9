use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::query::QueryError;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the application's single connection pool.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Build the pool without opening a connection; the first query connects.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let url = config
            .connection_url()
            .map_err(|e| DatabaseError::ConnectionError(format!("invalid database url: {}", e)))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_lazy(&url)?;

        info!("Database pool configured for {}:{}/{}", config.host, config.port, config.name);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Apply pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Environment};

    #[tokio::test]
    async fn lazy_pool_does_not_connect_up_front() {
        let mut config = AppConfig::for_environment(Environment::Local).database;
        config.url = Some("postgres://nobody@127.0.0.1:1/none".to_string());
        config.connection_timeout = 1;
        let db = DatabaseManager::connect_lazy(&config).unwrap();
        assert!(db.health_check().await.is_err());
    }

    #[tokio::test]
    async fn rejects_unparseable_urls() {
        let mut config = AppConfig::for_environment(Environment::Local).database;
        config.url = Some("not a url".to_string());
        assert!(matches!(
            DatabaseManager::connect_lazy(&config),
            Err(DatabaseError::ConnectionError(_)) | Err(DatabaseError::Sqlx(_))
        ));
    }
}
