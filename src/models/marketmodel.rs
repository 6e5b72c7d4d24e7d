// models/marketmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a job sits in its lifecycle. Derived from the stored flags, never
/// persisted on its own.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Awarded,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Job {
    pub id: i64,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    /// Exact amount moved into escrow at creation, in the smallest unit.
    pub budget: i64,
    /// Advisory only; nothing expires when it passes.
    pub deadline: DateTime<Utc>,
    pub freelancer_id: Option<Uuid>,
    pub awarded_bid: Option<i64>,
    /// Amount settlement pays out against, fixed at award time.
    pub payout_basis: Option<i64>,
    pub is_active: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn status(&self) -> JobStatus {
        if self.is_completed {
            JobStatus::Completed
        } else if self.freelancer_id.is_some() {
            JobStatus::Awarded
        } else {
            JobStatus::Open
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Proposal {
    pub job_id: i64,
    /// Zero-based submission index within the job.
    pub seq: i64,
    pub freelancer_id: Uuid,
    pub description: String,
    pub bid: i64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct UserProfile {
    pub identity: Uuid,
    pub name: String,
    pub skills: String,
    pub rating: i64,
    pub total_ratings: i64,
    #[serde(skip)]
    pub rating_sum: i64,
}

impl UserProfile {
    /// Zero-value profile for an identity the ledger has never touched.
    pub fn empty(identity: Uuid) -> Self {
        Self {
            identity,
            name: String::new(),
            skills: String::new(),
            rating: 0,
            total_ratings: 0,
            rating_sum: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct EscrowHolding {
    pub job_id: i64,
    pub depositor_id: Uuid,
    pub deposited: i64,
    /// Still in custody. Drops to zero when the job settles.
    pub held: i64,
    pub released_to_freelancer: i64,
    pub platform_fee: i64,
    pub refunded: i64,
    pub settled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct Account {
    pub identity: Uuid,
    pub balance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    JobCreated {
        job_id: i64,
        client_id: Uuid,
        title: String,
        budget: i64,
    },
    ProposalSubmitted {
        job_id: i64,
        freelancer_id: Uuid,
        bid: i64,
    },
    JobAwarded {
        job_id: i64,
        freelancer_id: Uuid,
        bid: i64,
    },
    JobCompleted {
        job_id: i64,
    },
    UserRated {
        target_id: Uuid,
        score: i64,
        new_rating: i64,
    },
}

impl LedgerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::JobCreated { .. } => "job_created",
            LedgerEvent::ProposalSubmitted { .. } => "proposal_submitted",
            LedgerEvent::JobAwarded { .. } => "job_awarded",
            LedgerEvent::JobCompleted { .. } => "job_completed",
            LedgerEvent::UserRated { .. } => "user_rated",
        }
    }

    pub fn job_id(&self) -> Option<i64> {
        match self {
            LedgerEvent::JobCreated { job_id, .. }
            | LedgerEvent::ProposalSubmitted { job_id, .. }
            | LedgerEvent::JobAwarded { job_id, .. }
            | LedgerEvent::JobCompleted { job_id } => Some(*job_id),
            LedgerEvent::UserRated { .. } => None,
        }
    }
}

/// Row shape of `ledger_events`; the payload is the JSON-encoded event.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredEvent {
    pub sequence: i64,
    pub job_id: Option<i64>,
    pub kind: String,
    pub caller_id: Uuid,
    pub payload: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub sequence: i64,
    pub caller_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

impl TryFrom<StoredEvent> for EventRecord {
    type Error = serde_json::Error;

    fn try_from(row: StoredEvent) -> Result<Self, Self::Error> {
        Ok(EventRecord {
            sequence: row.sequence,
            caller_id: row.caller_id,
            recorded_at: row.recorded_at,
            event: serde_json::from_str(&row.payload)?,
        })
    }
}
