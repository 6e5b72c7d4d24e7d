pub mod access;
pub mod account_service;
pub mod error;
pub mod escrow_service;
pub mod event_service;
pub mod job_service;
pub mod proposal_service;
pub mod user_service;

#[cfg(test)]
pub mod testing;
