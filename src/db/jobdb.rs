// db/jobdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqliteConnection};
use uuid::Uuid;

use crate::models::marketmodel::Job;

#[async_trait]
pub trait JobExt {
    /// Next id to hand out. Jobs are never deleted, so this only grows.
    async fn next_job_id(&mut self) -> Result<i64, Error>;

    async fn insert_job(
        &mut self,
        job_id: i64,
        client_id: Uuid,
        title: &str,
        description: &str,
        budget: i64,
        deadline: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Job, Error>;

    async fn get_job(&mut self, job_id: i64) -> Result<Option<Job>, Error>;

    async fn get_jobs(
        &mut self,
        open_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, Error>;

    /// Binds the freelancer and closes the job to new proposals. Returns
    /// `None` when the job was no longer open.
    async fn mark_job_awarded(
        &mut self,
        job_id: i64,
        freelancer_id: Uuid,
        awarded_bid: i64,
        payout_basis: i64,
    ) -> Result<Option<Job>, Error>;

    /// Flips `is_completed` once. Returns `None` when the job is not awarded
    /// or was already completed.
    async fn mark_job_completed(
        &mut self,
        job_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<Job>, Error>;
}

#[async_trait]
impl JobExt for SqliteConnection {
    async fn next_job_id(&mut self) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(id) + 1, 0) FROM jobs")
            .fetch_one(&mut *self)
            .await
    }

    async fn insert_job(
        &mut self,
        job_id: i64,
        client_id: Uuid,
        title: &str,
        description: &str,
        budget: i64,
        deadline: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<Job, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs
            (id, client_id, title, description, budget, deadline, is_active, is_completed, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, 0, ?)
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(client_id)
        .bind(title)
        .bind(description)
        .bind(budget)
        .bind(deadline)
        .bind(created_at)
        .fetch_one(&mut *self)
        .await
    }

    async fn get_job(&mut self, job_id: i64) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?")
            .bind(job_id)
            .fetch_optional(&mut *self)
            .await
    }

    async fn get_jobs(
        &mut self,
        open_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT * FROM jobs
            WHERE (? = 0 OR is_active = 1)
            ORDER BY id ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(open_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *self)
        .await
    }

    async fn mark_job_awarded(
        &mut self,
        job_id: i64,
        freelancer_id: Uuid,
        awarded_bid: i64,
        payout_basis: i64,
    ) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET freelancer_id = ?, awarded_bid = ?, payout_basis = ?, is_active = 0
            WHERE id = ? AND is_active = 1 AND freelancer_id IS NULL
            RETURNING *
            "#,
        )
        .bind(freelancer_id)
        .bind(awarded_bid)
        .bind(payout_basis)
        .bind(job_id)
        .fetch_optional(&mut *self)
        .await
    }

    async fn mark_job_completed(
        &mut self,
        job_id: i64,
        completed_at: DateTime<Utc>,
    ) -> Result<Option<Job>, Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET is_completed = 1, completed_at = ?
            WHERE id = ? AND is_completed = 0 AND freelancer_id IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(completed_at)
        .bind(job_id)
        .fetch_optional(&mut *self)
        .await
    }
}
