// service/testing.rs
//! Shared fixtures for service and router tests: a fresh in-memory ledger
//! wired exactly as the server wires it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    config::Config,
    db::db::DBClient,
    dtos::marketdtos::CreateJobDto,
    models::marketmodel::EventRecord,
    service::{
        account_service::AccountService, escrow_service::EscrowService, escrow_service::PayoutBasis,
        event_service::EventService, job_service::JobService, proposal_service::ProposalService,
        user_service::UserService,
    },
    AppState,
};

pub const TEST_SECRET: &str = "gigledger-test-secret";

pub struct Harness {
    pub state: Arc<AppState>,
    pub db: Arc<DBClient>,
    pub accounts: Arc<AccountService>,
    pub escrow: Arc<EscrowService>,
    pub events: Arc<EventService>,
    pub jobs: Arc<JobService>,
    pub proposals: Arc<ProposalService>,
    pub users: Arc<UserService>,
    pub feed: broadcast::Receiver<EventRecord>,
    pub platform: Uuid,
}

impl Harness {
    /// A new identity holding `amount`.
    pub async fn funded(&self, amount: i64) -> Uuid {
        let identity = Uuid::new_v4();
        self.accounts.deposit(identity, amount).await.unwrap();
        identity
    }
}

pub fn test_config(basis: PayoutBasis) -> Config {
    let basis = basis.to_str().to_string();
    Config::from_lookup(|key| match key {
        "JWT_SECRET_KEY" => Some(TEST_SECRET.to_string()),
        "PLATFORM_ACCOUNT_ID" => Some("00000000-0000-0000-0000-00000000fee5".to_string()),
        "PAYOUT_BASIS" => Some(basis.clone()),
        _ => None,
    })
    .unwrap()
}

pub async fn harness() -> Harness {
    harness_with(PayoutBasis::Budget).await
}

pub async fn harness_with(basis: PayoutBasis) -> Harness {
    let config = test_config(basis);
    let platform = config.platform_account;
    let state = Arc::new(AppState::new(DBClient::in_memory().await, config));

    Harness {
        db: state.db_client.clone(),
        accounts: state.account_service.clone(),
        escrow: state.escrow_service.clone(),
        events: state.event_service.clone(),
        jobs: state.job_service.clone(),
        proposals: state.proposal_service.clone(),
        users: state.user_service.clone(),
        feed: state.event_stream.subscribe(),
        platform,
        state,
    }
}

pub fn job_dto(title: &str, escrow_amount: i64) -> CreateJobDto {
    CreateJobDto {
        title: title.to_string(),
        description: format!("{} for the test suite", title),
        deadline: Utc::now() + Duration::days(1),
        escrow_amount,
    }
}
