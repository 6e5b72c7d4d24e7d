// db/db.rs
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

const SCHEMA: &str = include_str!("schema.sql");

#[derive(Debug, Clone)]
pub struct DBClient {
    pub pool: SqlitePool,
}

impl DBClient {
    pub fn new(pool: SqlitePool) -> Self {
        DBClient { pool }
    }

    /// Open the ledger store behind a single pooled connection.
    ///
    /// Every operation runs in one transaction on that connection, which is
    /// what keeps operations totally ordered.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::debug!("ledger schema is in place");
        Ok(())
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let client = Self::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        client.migrate().await.expect("schema");
        client
    }
}
