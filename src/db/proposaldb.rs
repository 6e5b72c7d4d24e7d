// db/proposaldb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqliteConnection};
use uuid::Uuid;

use crate::models::marketmodel::Proposal;

#[async_trait]
pub trait ProposalExt {
    /// Appends a proposal at the next submission index for the job.
    async fn append_proposal(
        &mut self,
        job_id: i64,
        freelancer_id: Uuid,
        description: &str,
        bid: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<Proposal, Error>;

    async fn get_job_proposals(&mut self, job_id: i64) -> Result<Vec<Proposal>, Error>;

    async fn get_latest_proposal_by(
        &mut self,
        job_id: i64,
        freelancer_id: Uuid,
    ) -> Result<Option<Proposal>, Error>;
}

#[async_trait]
impl ProposalExt for SqliteConnection {
    async fn append_proposal(
        &mut self,
        job_id: i64,
        freelancer_id: Uuid,
        description: &str,
        bid: i64,
        submitted_at: DateTime<Utc>,
    ) -> Result<Proposal, Error> {
        // Proposals are append-only, so the row count is the next index.
        let seq = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM proposals WHERE job_id = ?")
            .bind(job_id)
            .fetch_one(&mut *self)
            .await?;

        sqlx::query_as::<_, Proposal>(
            r#"
            INSERT INTO proposals (job_id, seq, freelancer_id, description, bid, submitted_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(seq)
        .bind(freelancer_id)
        .bind(description)
        .bind(bid)
        .bind(submitted_at)
        .fetch_one(&mut *self)
        .await
    }

    async fn get_job_proposals(&mut self, job_id: i64) -> Result<Vec<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE job_id = ? ORDER BY seq ASC")
            .bind(job_id)
            .fetch_all(&mut *self)
            .await
    }

    async fn get_latest_proposal_by(
        &mut self,
        job_id: i64,
        freelancer_id: Uuid,
    ) -> Result<Option<Proposal>, Error> {
        sqlx::query_as::<_, Proposal>(
            r#"
            SELECT * FROM proposals
            WHERE job_id = ? AND freelancer_id = ?
            ORDER BY seq DESC
            LIMIT 1
            "#,
        )
        .bind(job_id)
        .bind(freelancer_id)
        .fetch_optional(&mut *self)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{db::DBClient, jobdb::JobExt};
    use chrono::Duration;

    #[tokio::test]
    async fn test_proposals_keep_submission_order() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        conn.insert_job(
            0,
            Uuid::new_v4(),
            "API",
            "Build an API",
            1_000,
            Utc::now() + Duration::days(2),
            Utc::now(),
        )
        .await
        .unwrap();

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        conn.append_proposal(0, alice, "first", 900, Utc::now()).await.unwrap();
        conn.append_proposal(0, bob, "second", 800, Utc::now()).await.unwrap();
        let revised = conn.append_proposal(0, alice, "third", 700, Utc::now()).await.unwrap();
        assert_eq!(revised.seq, 2);

        let listed = conn.get_job_proposals(0).await.unwrap();
        let order: Vec<(i64, i64)> = listed.iter().map(|p| (p.seq, p.bid)).collect();
        assert_eq!(order, vec![(0, 900), (1, 800), (2, 700)]);

        let latest = conn.get_latest_proposal_by(0, alice).await.unwrap().unwrap();
        assert_eq!(latest.bid, 700);
        assert!(conn
            .get_latest_proposal_by(0, Uuid::new_v4())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_job_without_proposals_lists_empty() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        assert!(conn.get_job_proposals(42).await.unwrap().is_empty());
    }
}
