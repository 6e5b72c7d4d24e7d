// service/access.rs
//! Caller checks shared by every mutating operation. Each one runs before
//! the operation writes anything.

use uuid::Uuid;

use crate::{models::marketmodel::Job, service::error::ServiceError};

pub fn ensure_client(caller: Uuid, job: &Job) -> Result<(), ServiceError> {
    if job.client_id != caller {
        tracing::warn!(job_id = job.id, %caller, "caller is not the job's client");
        return Err(ServiceError::Unauthorized {
            caller,
            job_id: job.id,
            role: "client",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job_for(client: Uuid, freelancer: Option<Uuid>) -> Job {
        Job {
            id: 5,
            client_id: client,
            title: "Landing page".to_string(),
            description: "One page".to_string(),
            budget: 100,
            deadline: Utc::now(),
            freelancer_id: freelancer,
            awarded_bid: None,
            payout_basis: None,
            is_active: freelancer.is_none(),
            is_completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_client_check() {
        let client = Uuid::new_v4();
        let job = job_for(client, None);

        assert!(ensure_client(client, &job).is_ok());
        let err = ensure_client(Uuid::new_v4(), &job).unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized { role: "client", job_id: 5, .. }));
    }
}
