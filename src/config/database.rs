use super::env::env_or;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, DbErr> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DbErr::Custom("DATABASE_URL must be set".to_string()))?;

        Ok(Self::new(
            url,
            env_or("DB_MAX_CONNECTIONS", 10),
            env_or("DB_MIN_CONNECTIONS", 2),
        ))
    }

    /// A pool needs at least one connection, and min never exceeds max.
    fn new(url: String, max_connections: u32, min_connections: u32) -> Self {
        let max_connections = max_connections.max(1);
        Self {
            url,
            max_connections,
            min_connections: min_connections.min(max_connections),
        }
    }

    fn connect_options(&self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true);
        opt
    }
}

pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    tracing::debug!(
        "Connecting to database (pool {}..={})",
        config.min_connections,
        config.max_connections
    );
    Database::connect(config.connect_options()).await
}
