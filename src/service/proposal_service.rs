// service/proposal_service.rs
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    db::{db::DBClient, jobdb::JobExt, proposaldb::ProposalExt},
    models::marketmodel::{LedgerEvent, Proposal},
    service::{error::ServiceError, event_service::EventService},
};

#[derive(Debug, Clone)]
pub struct ProposalService {
    db_client: Arc<DBClient>,
    event_service: Arc<EventService>,
}

impl ProposalService {
    pub fn new(db_client: Arc<DBClient>, event_service: Arc<EventService>) -> Self {
        Self {
            db_client,
            event_service,
        }
    }

    pub async fn submit_proposal(
        &self,
        freelancer_id: Uuid,
        job_id: i64,
        description: &str,
        bid: i64,
    ) -> Result<Proposal, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;

        let job = tx
            .get_job(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;
        if !job.is_active {
            return Err(ServiceError::invalid_state(job_id, "bid on", "job is no longer open"));
        }
        if bid <= 0 || bid > job.budget {
            return Err(ServiceError::InvalidArgument(format!(
                "bid {} must be between 1 and the job budget {}",
                bid, job.budget
            )));
        }

        let proposal = tx
            .append_proposal(job_id, freelancer_id, description, bid, Utc::now())
            .await?;

        let record = self
            .event_service
            .record(
                &mut tx,
                freelancer_id,
                LedgerEvent::ProposalSubmitted {
                    job_id,
                    freelancer_id,
                    bid,
                },
            )
            .await?;

        tx.commit().await?;
        self.event_service.publish(&record).await;

        tracing::info!(job_id, seq = proposal.seq, freelancer = %freelancer_id, bid, "proposal submitted");
        Ok(proposal)
    }

    /// Proposals in submission order.
    pub async fn get_job_proposals(&self, job_id: i64) -> Result<Vec<Proposal>, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;

        if conn.get_job(job_id).await?.is_none() {
            return Err(ServiceError::JobNotFound(job_id));
        }

        Ok(conn.get_job_proposals(job_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{
        error::ErrorKind,
        testing::{harness, job_dto},
    };

    #[tokio::test]
    async fn test_bid_bounds() {
        let h = harness().await;
        let client = h.funded(500).await;
        let freelancer = Uuid::new_v4();
        let job = h.jobs.create_job(client, job_dto("Icons", 500)).await.unwrap();

        for bid in [0, -1, 501] {
            let err = h
                .proposals
                .submit_proposal(freelancer, job.id, "icons", bid)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "bid {}", bid);
        }

        for bid in [1, 500] {
            h.proposals
                .submit_proposal(freelancer, job.id, "icons", bid)
                .await
                .unwrap();
        }
        assert_eq!(h.proposals.get_job_proposals(job.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_proposals_keep_submission_order() {
        let h = harness().await;
        let client = h.funded(1_000).await;
        let job = h.jobs.create_job(client, job_dto("Blog", 1_000)).await.unwrap();
        assert!(h.proposals.get_job_proposals(job.id).await.unwrap().is_empty());

        let bidders: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for (i, bidder) in bidders.iter().enumerate() {
            h.proposals
                .submit_proposal(*bidder, job.id, "post", 100 * (i as i64 + 1))
                .await
                .unwrap();
        }

        let proposals = h.proposals.get_job_proposals(job.id).await.unwrap();
        let order: Vec<Uuid> = proposals.iter().map(|p| p.freelancer_id).collect();
        let seqs: Vec<i64> = proposals.iter().map(|p| p.seq).collect();
        assert_eq!(order, bidders);
        assert_eq!(seqs, vec![0, 1, 2, 3]);

        // Reading twice yields the same sequence.
        assert_eq!(h.proposals.get_job_proposals(job.id).await.unwrap(), proposals);
    }

    #[tokio::test]
    async fn test_closed_or_missing_jobs_reject_proposals() {
        let h = harness().await;
        let client = h.funded(100).await;
        let freelancer = Uuid::new_v4();

        let err = h
            .proposals
            .submit_proposal(freelancer, 7, "nothing here", 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(h.proposals.get_job_proposals(7).await.unwrap_err().kind(), ErrorKind::NotFound);

        let job = h.jobs.create_job(client, job_dto("Fix", 100)).await.unwrap();
        h.proposals.submit_proposal(freelancer, job.id, "fix", 90).await.unwrap();
        h.jobs.award_job(client, job.id, freelancer).await.unwrap();

        let err = h
            .proposals
            .submit_proposal(Uuid::new_v4(), job.id, "late", 80)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
