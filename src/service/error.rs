use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::error::HttpError;

/// Failure categories every operation reports in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidState,
    InvalidArgument,
    InsufficientFunds,
    Internal,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Caller {caller} is not the {role} of job {job_id}")]
    Unauthorized {
        caller: Uuid,
        job_id: i64,
        role: &'static str,
    },

    #[error("Job {0} not found")]
    JobNotFound(i64),

    #[error("Freelancer {freelancer} has no proposal on job {job_id}")]
    NoSuchProposal { job_id: i64, freelancer: Uuid },

    #[error("Job {job_id} cannot be {action}: {reason}")]
    InvalidState {
        job_id: i64,
        action: &'static str,
        reason: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Crediting {amount} would overflow the balance of {identity}")]
    BalanceOverflow { identity: Uuid, amount: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    pub fn invalid_state(job_id: i64, action: &'static str, reason: &'static str) -> Self {
        ServiceError::InvalidState {
            job_id,
            action,
            reason,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthorized { .. } => ErrorKind::Unauthorized,
            ServiceError::JobNotFound(_) | ServiceError::NoSuchProposal { .. } => ErrorKind::NotFound,
            ServiceError::InvalidState { .. } => ErrorKind::InvalidState,
            ServiceError::InvalidArgument(_) | ServiceError::BalanceOverflow { .. } => {
                ErrorKind::InvalidArgument
            }
            ServiceError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            ServiceError::Database(_) | ServiceError::Serialization(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidState => StatusCode::CONFLICT,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error.kind() {
            // Storage details stay in the logs.
            ErrorKind::Internal => {
                tracing::error!("ledger operation failed: {}", error);
                HttpError::server_error("Internal server error")
            }
            _ => HttpError::new(error.to_string(), error.status_code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_status_codes() {
        let caller = Uuid::new_v4();
        let cases = vec![
            (
                ServiceError::Unauthorized { caller, job_id: 1, role: "client" },
                StatusCode::FORBIDDEN,
            ),
            (ServiceError::JobNotFound(9), StatusCode::NOT_FOUND),
            (
                ServiceError::NoSuchProposal { job_id: 1, freelancer: caller },
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::invalid_state(1, "awarded", "job is no longer open"),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::InvalidArgument("bid must be positive".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::BalanceOverflow { identity: caller, amount: 1 },
                StatusCode::BAD_REQUEST,
            ),
            (
                ServiceError::InsufficientFunds { required: 10, available: 3 },
                StatusCode::PAYMENT_REQUIRED,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{}", error);
            let http: HttpError = error.into();
            assert_eq!(http.status, status);
        }
    }

    #[test]
    fn test_database_errors_are_not_leaked() {
        let http: HttpError = ServiceError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(http.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(http.message, "Internal server error");
    }

    #[test]
    fn test_messages_name_the_job() {
        let error = ServiceError::invalid_state(4, "completed", "no freelancer has been awarded");
        assert_eq!(
            error.to_string(),
            "Job 4 cannot be completed: no freelancer has been awarded"
        );
    }
}
