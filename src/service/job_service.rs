// service/job_service.rs
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, jobdb::JobExt, proposaldb::ProposalExt},
    dtos::marketdtos::CreateJobDto,
    models::marketmodel::{Job, LedgerEvent},
    service::{
        access::ensure_client,
        error::ServiceError,
        escrow_service::{EscrowService, Settlement},
        event_service::EventService,
    },
};

#[derive(Debug, Clone, Serialize)]
pub struct JobCompletionResult {
    pub job: Job,
    pub settlement: Settlement,
}

#[derive(Debug, Clone)]
pub struct JobService {
    db_client: Arc<DBClient>,
    escrow_service: Arc<EscrowService>,
    event_service: Arc<EventService>,
}

impl JobService {
    pub fn new(
        db_client: Arc<DBClient>,
        escrow_service: Arc<EscrowService>,
        event_service: Arc<EventService>,
    ) -> Self {
        Self {
            db_client,
            escrow_service,
            event_service,
        }
    }

    /// Opens a job funded by moving `escrow_amount` out of the caller's balance.
    pub async fn create_job(&self, client_id: Uuid, job_data: CreateJobDto) -> Result<Job, ServiceError> {
        if job_data.escrow_amount <= 0 {
            return Err(ServiceError::InvalidArgument(
                "escrow amount must be greater than zero".to_string(),
            ));
        }
        let now = Utc::now();
        if job_data.deadline <= now {
            return Err(ServiceError::InvalidArgument(
                "deadline must be in the future".to_string(),
            ));
        }

        let mut tx = self.db_client.pool.begin().await?;

        let job_id = tx.next_job_id().await?;
        let job = tx
            .insert_job(
                job_id,
                client_id,
                &job_data.title,
                &job_data.description,
                job_data.escrow_amount,
                job_data.deadline,
                now,
            )
            .await?;

        self.escrow_service
            .hold(&mut tx, job.id, client_id, job_data.escrow_amount)
            .await?;

        let record = self
            .event_service
            .record(
                &mut tx,
                client_id,
                LedgerEvent::JobCreated {
                    job_id: job.id,
                    client_id,
                    title: job.title.clone(),
                    budget: job.budget,
                },
            )
            .await?;

        tx.commit().await?;
        self.event_service.publish(&record).await;

        tracing::info!(job_id = job.id, client = %client_id, budget = job.budget, "job created");
        Ok(job)
    }

    pub async fn get_job(&self, job_id: i64) -> Result<Job, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        conn.get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn get_jobs(&self, open_only: bool, page: u32, limit: u32) -> Result<Vec<Job>, ServiceError> {
        let offset = (page.max(1) as i64 - 1) * limit as i64;

        let mut conn = self.db_client.pool.acquire().await?;
        Ok(conn.get_jobs(open_only, limit as i64, offset).await?)
    }

    /// Binds the freelancer to the job and commits the payout against their
    /// most recent proposal.
    pub async fn award_job(&self, caller: Uuid, job_id: i64, freelancer_id: Uuid) -> Result<Job, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;

        let job = tx
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;
        ensure_client(caller, &job)?;

        if !job.is_active {
            return Err(ServiceError::invalid_state(job_id, "awarded", "job is no longer open"));
        }

        let proposal = tx
            .get_latest_proposal_by(job_id, freelancer_id)
            .await?
            .ok_or(ServiceError::NoSuchProposal {
                job_id,
                freelancer: freelancer_id,
            })?;

        let payout_basis = self
            .escrow_service
            .payout_basis()
            .committed_amount(job.budget, proposal.bid);

        let job = tx
            .mark_job_awarded(job_id, freelancer_id, proposal.bid, payout_basis)
            .await?
            .ok_or_else(|| ServiceError::invalid_state(job_id, "awarded", "job is no longer open"))?;

        let record = self
            .event_service
            .record(
                &mut tx,
                caller,
                LedgerEvent::JobAwarded {
                    job_id,
                    freelancer_id,
                    bid: proposal.bid,
                },
            )
            .await?;

        tx.commit().await?;
        self.event_service.publish(&record).await;

        tracing::info!(job_id, freelancer = %freelancer_id, bid = proposal.bid, payout_basis, "job awarded");
        Ok(job)
    }

    /// Marks the job complete and releases its escrow. Nothing changes unless
    /// both succeed.
    pub async fn complete_job(&self, caller: Uuid, job_id: i64) -> Result<JobCompletionResult, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;

        let job = tx
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;
        ensure_client(caller, &job)?;

        if job.freelancer_id.is_none() {
            return Err(ServiceError::invalid_state(job_id, "completed", "no freelancer has been awarded"));
        }
        if job.is_completed {
            return Err(ServiceError::invalid_state(job_id, "completed", "job is already completed"));
        }

        let job = tx
            .mark_job_completed(job_id, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::invalid_state(job_id, "completed", "job is already completed"))?;

        // An error here drops `tx`, which also undoes the completion flag.
        let settlement = self.escrow_service.settle(&mut tx, &job).await?;

        let record = self
            .event_service
            .record(&mut tx, caller, LedgerEvent::JobCompleted { job_id })
            .await?;

        tx.commit().await?;
        self.event_service.publish(&record).await;

        tracing::info!(job_id, payout = settlement.payout, fee = settlement.platform_fee, "job completed");
        Ok(JobCompletionResult { job, settlement })
    }
}
