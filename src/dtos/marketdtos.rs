// dtos/marketdtos.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::marketmodel::{Job, JobStatus};

// Job DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    pub deadline: DateTime<Utc>,

    /// Moved from the client's balance into escrow; becomes the job's budget.
    #[validate(range(min = 1, message = "Escrow amount must be greater than zero"))]
    pub escrow_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AwardJobDto {
    pub freelancer_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponseDto {
    #[serde(flatten)]
    pub job: Job,
    pub status: JobStatus,
}

impl From<Job> for JobResponseDto {
    fn from(job: Job) -> Self {
        let status = job.status();
        Self { job, status }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobListQueryDto {
    pub open_only: Option<bool>,

    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

// Proposal DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitProposalDto {
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    #[validate(range(min = 1, message = "Bid must be greater than zero"))]
    pub bid: i64,
}

// User DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileDto {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Skills must be at most 1000 characters"))]
    pub skills: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateUserDto {
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5"))]
    pub score: i64,
}

// Wallet DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DepositDto {
    #[validate(range(min = 1, message = "Deposit must be greater than zero"))]
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowSummaryDto {
    pub custody_total: i64,
    pub platform_account: Uuid,
    pub platform_balance: i64,
    pub payout_basis: String,
}

// Event DTOs
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventQueryDto {
    #[validate(range(min = 0, message = "Cursor cannot be negative"))]
    pub after: Option<i64>,

    #[validate(range(min = 1, max = 500, message = "Limit must be between 1 and 500"))]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}
