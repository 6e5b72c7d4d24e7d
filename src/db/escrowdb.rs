// db/escrowdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqliteConnection};
use uuid::Uuid;

use crate::models::marketmodel::EscrowHolding;

#[async_trait]
pub trait EscrowExt {
    async fn insert_holding(
        &mut self,
        job_id: i64,
        depositor_id: Uuid,
        amount: i64,
    ) -> Result<EscrowHolding, Error>;

    async fn get_holding(&mut self, job_id: i64) -> Result<Option<EscrowHolding>, Error>;

    /// Empties the holding and records where the funds went. Returns `None`
    /// when the holding was already settled.
    async fn settle_holding(
        &mut self,
        job_id: i64,
        released_to_freelancer: i64,
        platform_fee: i64,
        refunded: i64,
        settled_at: DateTime<Utc>,
    ) -> Result<Option<EscrowHolding>, Error>;

    async fn get_total_held(&mut self) -> Result<i64, Error>;
}

#[async_trait]
impl EscrowExt for SqliteConnection {
    async fn insert_holding(
        &mut self,
        job_id: i64,
        depositor_id: Uuid,
        amount: i64,
    ) -> Result<EscrowHolding, Error> {
        sqlx::query_as::<_, EscrowHolding>(
            r#"
            INSERT INTO escrow_holdings (job_id, depositor_id, deposited, held)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(depositor_id)
        .bind(amount)
        .bind(amount)
        .fetch_one(&mut *self)
        .await
    }

    async fn get_holding(&mut self, job_id: i64) -> Result<Option<EscrowHolding>, Error> {
        sqlx::query_as::<_, EscrowHolding>("SELECT * FROM escrow_holdings WHERE job_id = ?")
            .bind(job_id)
            .fetch_optional(&mut *self)
            .await
    }

    async fn settle_holding(
        &mut self,
        job_id: i64,
        released_to_freelancer: i64,
        platform_fee: i64,
        refunded: i64,
        settled_at: DateTime<Utc>,
    ) -> Result<Option<EscrowHolding>, Error> {
        sqlx::query_as::<_, EscrowHolding>(
            r#"
            UPDATE escrow_holdings
            SET held = 0, released_to_freelancer = ?, platform_fee = ?, refunded = ?, settled_at = ?
            WHERE job_id = ? AND settled_at IS NULL
            RETURNING *
            "#,
        )
        .bind(released_to_freelancer)
        .bind(platform_fee)
        .bind(refunded)
        .bind(settled_at)
        .bind(job_id)
        .fetch_optional(&mut *self)
        .await
    }

    async fn get_total_held(&mut self) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(SUM(held), 0) FROM escrow_holdings")
            .fetch_one(&mut *self)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{db::DBClient, jobdb::JobExt};
    use chrono::Duration;

    async fn seed_job(conn: &mut SqliteConnection, job_id: i64, budget: i64) {
        conn.insert_job(
            job_id,
            Uuid::new_v4(),
            "Seed",
            "Seeded job",
            budget,
            Utc::now() + Duration::days(1),
            Utc::now(),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_holdings_sum_to_custody() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        seed_job(&mut conn, 0, 400).await;
        seed_job(&mut conn, 1, 600).await;

        conn.insert_holding(0, Uuid::new_v4(), 400).await.unwrap();
        conn.insert_holding(1, Uuid::new_v4(), 600).await.unwrap();
        assert_eq!(conn.get_total_held().await.unwrap(), 1_000);

        let settled = conn
            .settle_holding(0, 392, 8, 0, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settled.held, 0);
        assert_eq!(settled.released_to_freelancer, 392);
        assert_eq!(conn.get_total_held().await.unwrap(), 600);
    }

    #[tokio::test]
    async fn test_holding_settles_once() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        seed_job(&mut conn, 0, 100).await;
        conn.insert_holding(0, Uuid::new_v4(), 100).await.unwrap();

        assert!(conn.settle_holding(0, 98, 2, 0, Utc::now()).await.unwrap().is_some());
        assert!(conn.settle_holding(0, 98, 2, 0, Utc::now()).await.unwrap().is_none());
        assert!(conn.get_holding(0).await.unwrap().unwrap().settled_at.is_some());
    }
}
