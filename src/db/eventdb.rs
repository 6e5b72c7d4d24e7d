// db/eventdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqliteConnection};
use uuid::Uuid;

use crate::models::marketmodel::StoredEvent;

#[async_trait]
pub trait EventExt {
    async fn append_event(
        &mut self,
        job_id: Option<i64>,
        kind: &str,
        caller_id: Uuid,
        payload: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<StoredEvent, Error>;

    async fn get_events_after(&mut self, after: i64, limit: i64) -> Result<Vec<StoredEvent>, Error>;

    async fn get_job_events(&mut self, job_id: i64) -> Result<Vec<StoredEvent>, Error>;
}

#[async_trait]
impl EventExt for SqliteConnection {
    async fn append_event(
        &mut self,
        job_id: Option<i64>,
        kind: &str,
        caller_id: Uuid,
        payload: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<StoredEvent, Error> {
        sqlx::query_as::<_, StoredEvent>(
            r#"
            INSERT INTO ledger_events (job_id, kind, caller_id, payload, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(kind)
        .bind(caller_id)
        .bind(payload)
        .bind(recorded_at)
        .fetch_one(&mut *self)
        .await
    }

    async fn get_events_after(&mut self, after: i64, limit: i64) -> Result<Vec<StoredEvent>, Error> {
        sqlx::query_as::<_, StoredEvent>(
            "SELECT * FROM ledger_events WHERE sequence > ? ORDER BY sequence ASC LIMIT ?",
        )
        .bind(after)
        .bind(limit)
        .fetch_all(&mut *self)
        .await
    }

    async fn get_job_events(&mut self, job_id: i64) -> Result<Vec<StoredEvent>, Error> {
        sqlx::query_as::<_, StoredEvent>(
            "SELECT * FROM ledger_events WHERE job_id = ? ORDER BY sequence ASC",
        )
        .bind(job_id)
        .fetch_all(&mut *self)
        .await
    }
}
