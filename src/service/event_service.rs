// service/event_service.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, eventdb::EventExt},
    models::marketmodel::{EventRecord, LedgerEvent},
    service::error::ServiceError,
};

/// Receives every event after the operation that produced it has committed.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, record: &EventRecord);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

#[async_trait]
impl EventSink for LogEventSink {
    async fn publish(&self, record: &EventRecord) {
        tracing::info!(
            sequence = record.sequence,
            kind = record.event.kind(),
            caller = %record.caller_id,
            "ledger event committed"
        );
    }
}

/// Fans committed events out to in-process subscribers.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: broadcast::Sender<EventRecord>,
}

impl ChannelEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn publish(&self, record: &EventRecord) {
        // No subscribers is not an error.
        let _ = self.sender.send(record.clone());
    }
}

#[derive(Clone)]
pub struct EventService {
    db_client: Arc<DBClient>,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for EventService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventService")
            .field("db_client", &self.db_client)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl EventService {
    pub fn new(db_client: Arc<DBClient>, sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { db_client, sinks }
    }

    /// Appends the event to the durable log on the caller's transaction, so
    /// it commits or rolls back together with the operation.
    pub async fn record(
        &self,
        conn: &mut SqliteConnection,
        caller: Uuid,
        event: LedgerEvent,
    ) -> Result<EventRecord, ServiceError> {
        let payload = serde_json::to_string(&event)?;
        let row = conn
            .append_event(event.job_id(), event.kind(), caller, &payload, Utc::now())
            .await?;

        Ok(EventRecord {
            sequence: row.sequence,
            caller_id: caller,
            recorded_at: row.recorded_at,
            event,
        })
    }

    pub async fn publish(&self, record: &EventRecord) {
        for sink in &self.sinks {
            sink.publish(record).await;
        }
    }

    pub async fn events_since(&self, after: i64, limit: i64) -> Result<Vec<EventRecord>, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        let rows = conn.get_events_after(after, limit).await?;

        rows.into_iter()
            .map(|row| EventRecord::try_from(row).map_err(ServiceError::from))
            .collect()
    }

    pub async fn job_events(&self, job_id: i64) -> Result<Vec<EventRecord>, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        let rows = conn.get_job_events(job_id).await?;

        rows.into_iter()
            .map(|row| EventRecord::try_from(row).map_err(ServiceError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_record_is_durable_and_published_to_every_sink() {
        let db = Arc::new(DBClient::in_memory().await);
        let channel = ChannelEventSink::new(8);
        let mut feed = channel.subscribe();
        let service = EventService::new(
            db.clone(),
            vec![Arc::new(LogEventSink), Arc::new(channel.clone())],
        );

        let caller = Uuid::new_v4();
        let mut tx = db.pool.begin().await.unwrap();
        let record = service
            .record(&mut tx, caller, LedgerEvent::JobCompleted { job_id: 3 })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        service.publish(&record).await;

        let received = feed.recv().await.unwrap();
        assert_eq!(received, record);

        let stored = service.job_events(3).await.unwrap();
        assert_eq!(stored, vec![record]);
    }

    #[tokio::test]
    async fn test_rolled_back_record_leaves_no_trace() {
        let db = Arc::new(DBClient::in_memory().await);
        let service = EventService::new(db.clone(), Vec::new());

        {
            let mut tx = db.pool.begin().await.unwrap();
            service
                .record(&mut tx, Uuid::new_v4(), LedgerEvent::JobCompleted { job_id: 1 })
                .await
                .unwrap();
            // dropped without commit
        }

        assert!(service.events_since(0, 100).await.unwrap().is_empty());
    }
}
