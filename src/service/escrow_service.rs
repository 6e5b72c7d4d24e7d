// service/escrow_service.rs
use std::{str::FromStr, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::{
    db::{accountdb::AccountExt, db::DBClient, escrowdb::EscrowExt},
    models::marketmodel::{EscrowHolding, Job},
    service::error::ServiceError,
};

pub const PLATFORM_FEE_PERCENT: i64 = 2;

/// Which amount an awarded job pays out against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutBasis {
    /// The whole escrowed budget goes out, less the fee.
    #[default]
    Budget,
    /// The accepted bid goes out, less the fee; the rest returns to the client.
    AwardedBid,
}

impl PayoutBasis {
    pub fn to_str(&self) -> &str {
        match self {
            PayoutBasis::Budget => "budget",
            PayoutBasis::AwardedBid => "awarded_bid",
        }
    }

    pub fn committed_amount(&self, budget: i64, bid: i64) -> i64 {
        match self {
            PayoutBasis::Budget => budget,
            PayoutBasis::AwardedBid => bid,
        }
    }
}

impl FromStr for PayoutBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "budget" => Ok(PayoutBasis::Budget),
            "awarded_bid" | "bid" => Ok(PayoutBasis::AwardedBid),
            other => Err(format!("unknown payout basis '{}'", other)),
        }
    }
}

/// Fee on a payout, rounded toward zero.
pub fn platform_fee(amount: i64) -> i64 {
    (amount as i128 * PLATFORM_FEE_PERCENT as i128 / 100) as i64
}

/// Credits `amount` on the caller's transaction, refusing balances past `i64::MAX`.
pub async fn credit(conn: &mut SqliteConnection, identity: Uuid, amount: i64) -> Result<i64, ServiceError> {
    conn.credit_account(identity, amount).await?.ok_or_else(|| {
        tracing::warn!(%identity, amount, "credit refused, balance would overflow");
        ServiceError::BalanceOverflow { identity, amount }
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settlement {
    pub job_id: i64,
    pub freelancer_id: Uuid,
    pub payout: i64,
    pub platform_fee: i64,
    pub refund: i64,
    pub refunded_to: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct EscrowService {
    db_client: Arc<DBClient>,
    platform_account: Uuid,
    payout_basis: PayoutBasis,
}

impl EscrowService {
    pub fn new(db_client: Arc<DBClient>, platform_account: Uuid, payout_basis: PayoutBasis) -> Self {
        Self {
            db_client,
            platform_account,
            payout_basis,
        }
    }

    pub fn payout_basis(&self) -> PayoutBasis {
        self.payout_basis
    }

    pub fn platform_account(&self) -> Uuid {
        self.platform_account
    }

    /// Moves `amount` from the depositor's balance into custody for `job_id`.
    pub async fn hold(
        &self,
        conn: &mut SqliteConnection,
        job_id: i64,
        depositor: Uuid,
        amount: i64,
    ) -> Result<EscrowHolding, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidArgument(
                "escrow amount must be greater than zero".to_string(),
            ));
        }

        if conn.debit_account(depositor, amount).await?.is_none() {
            let available = conn.get_balance(depositor).await?;
            tracing::warn!(job_id, %depositor, amount, available, "escrow deposit refused");
            return Err(ServiceError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        let holding = conn.insert_holding(job_id, depositor, amount).await?;
        tracing::debug!(job_id, %depositor, amount, "escrow funded");
        Ok(holding)
    }

    /// Releases the job's custody: payout to the freelancer, fee to the
    /// platform account, any remainder back to the depositor.
    pub async fn settle(&self, conn: &mut SqliteConnection, job: &Job) -> Result<Settlement, ServiceError> {
        let freelancer_id = job
            .freelancer_id
            .ok_or_else(|| ServiceError::invalid_state(job.id, "settled", "no freelancer has been awarded"))?;
        let basis = job
            .payout_basis
            .ok_or_else(|| ServiceError::invalid_state(job.id, "settled", "no payout was committed at award"))?;

        let holding = conn
            .get_holding(job.id)
            .await?
            .ok_or(ServiceError::InsufficientFunds {
                required: basis,
                available: 0,
            })?;
        if holding.settled_at.is_some() {
            return Err(ServiceError::invalid_state(job.id, "settled", "escrow was already released"));
        }
        if holding.held < basis {
            tracing::error!(job_id = job.id, held = holding.held, basis, "escrow holds less than the committed payout");
            return Err(ServiceError::InsufficientFunds {
                required: basis,
                available: holding.held,
            });
        }

        let fee = platform_fee(basis);
        let payout = basis - fee;
        let refund = holding.held - basis;

        conn.settle_holding(job.id, payout, fee, refund, Utc::now())
            .await?
            .ok_or_else(|| ServiceError::invalid_state(job.id, "settled", "escrow was already released"))?;

        credit(conn, freelancer_id, payout).await?;
        if fee > 0 {
            credit(conn, self.platform_account, fee).await?;
        }
        let refunded_to = if refund > 0 {
            credit(conn, holding.depositor_id, refund).await?;
            Some(holding.depositor_id)
        } else {
            None
        };

        tracing::info!(job_id = job.id, %freelancer_id, payout, fee, refund, "escrow released");

        Ok(Settlement {
            job_id: job.id,
            freelancer_id,
            payout,
            platform_fee: fee,
            refund,
            refunded_to,
        })
    }

    pub async fn get_holding(&self, job_id: i64) -> Result<Option<EscrowHolding>, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        Ok(conn.get_holding(job_id).await?)
    }

    /// Everything currently in custody across all jobs.
    pub async fn custody_total(&self) -> Result<i64, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        Ok(conn.get_total_held().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_rounds_toward_zero() {
        assert_eq!(platform_fee(1_000_000_000_000_000_000), 20_000_000_000_000_000);
        assert_eq!(platform_fee(100), 2);
        assert_eq!(platform_fee(149), 2);
        assert_eq!(platform_fee(49), 0);
        assert_eq!(platform_fee(i64::MAX), i64::MAX / 50);
    }

    #[test]
    fn test_payout_basis_parsing() {
        assert_eq!("budget".parse::<PayoutBasis>().unwrap(), PayoutBasis::Budget);
        assert_eq!(" Awarded_Bid ".parse::<PayoutBasis>().unwrap(), PayoutBasis::AwardedBid);
        assert!("half".parse::<PayoutBasis>().is_err());
        assert_eq!(PayoutBasis::default(), PayoutBasis::Budget);

        assert_eq!(PayoutBasis::Budget.committed_amount(1_000, 800), 1_000);
        assert_eq!(PayoutBasis::AwardedBid.committed_amount(1_000, 800), 800);
    }
}
