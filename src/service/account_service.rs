// service/account_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{accountdb::AccountExt, db::DBClient},
    models::marketmodel::Account,
    service::{error::ServiceError, escrow_service::credit},
};

/// Host-side balances that escrow draws from and settlement pays into.
#[derive(Debug, Clone)]
pub struct AccountService {
    db_client: Arc<DBClient>,
}

impl AccountService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn deposit(&self, identity: Uuid, amount: i64) -> Result<Account, ServiceError> {
        if amount <= 0 {
            return Err(ServiceError::InvalidArgument(
                "deposit must be greater than zero".to_string(),
            ));
        }

        let mut tx = self.db_client.pool.begin().await?;
        let balance = credit(&mut tx, identity, amount).await?;
        tx.commit().await?;

        tracing::info!(%identity, amount, balance, "deposit credited");
        Ok(Account { identity, balance })
    }

    pub async fn balance(&self, identity: Uuid) -> Result<Account, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        let balance = conn.get_balance(identity).await?;
        Ok(Account { identity, balance })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deposits_accumulate() {
        let service = AccountService::new(Arc::new(DBClient::in_memory().await));
        let who = Uuid::new_v4();

        assert_eq!(service.balance(who).await.unwrap().balance, 0);
        service.deposit(who, 40).await.unwrap();
        let account = service.deposit(who, 2).await.unwrap();
        assert_eq!(account, Account { identity: who, balance: 42 });

        assert!(matches!(
            service.deposit(who, 0).await.unwrap_err(),
            ServiceError::InvalidArgument(_)
        ));
    }

    #[tokio::test]
    async fn test_deposit_past_ceiling_is_refused() {
        let service = AccountService::new(Arc::new(DBClient::in_memory().await));
        let who = Uuid::new_v4();

        service.deposit(who, i64::MAX).await.unwrap();
        let err = service.deposit(who, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::BalanceOverflow { amount: 1, .. }));
        assert_eq!(err.kind(), crate::service::error::ErrorKind::InvalidArgument);

        assert_eq!(service.balance(who).await.unwrap().balance, i64::MAX);
    }
}
