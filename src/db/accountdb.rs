// db/accountdb.rs
use async_trait::async_trait;
use sqlx::{Error, SqliteConnection};
use uuid::Uuid;

#[async_trait]
pub trait AccountExt {
    /// Balance of an identity; unknown identities hold nothing.
    async fn get_balance(&mut self, identity: Uuid) -> Result<i64, Error>;

    /// Returns `None` and leaves the balance alone when the credit would
    /// push it past `i64::MAX`.
    async fn credit_account(&mut self, identity: Uuid, amount: i64) -> Result<Option<i64>, Error>;

    /// Returns `None` and leaves the balance alone when it cannot cover
    /// `amount`.
    async fn debit_account(&mut self, identity: Uuid, amount: i64) -> Result<Option<i64>, Error>;
}

#[async_trait]
impl AccountExt for SqliteConnection {
    async fn get_balance(&mut self, identity: Uuid) -> Result<i64, Error> {
        let balance = sqlx::query_scalar::<_, i64>("SELECT balance FROM accounts WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&mut *self)
            .await?;

        Ok(balance.unwrap_or(0))
    }

    async fn credit_account(&mut self, identity: Uuid, amount: i64) -> Result<Option<i64>, Error> {
        // SQLite would silently widen an overflowing sum to REAL.
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO accounts (identity, balance) VALUES (?, ?)
            ON CONFLICT(identity) DO UPDATE SET balance = balance + excluded.balance
            WHERE accounts.balance <= ? - excluded.balance
            RETURNING balance
            "#,
        )
        .bind(identity)
        .bind(amount)
        .bind(i64::MAX)
        .fetch_optional(&mut *self)
        .await
    }

    async fn debit_account(&mut self, identity: Uuid, amount: i64) -> Result<Option<i64>, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE accounts SET balance = balance - ?
            WHERE identity = ? AND balance >= ?
            RETURNING balance
            "#,
        )
        .bind(amount)
        .bind(identity)
        .bind(amount)
        .fetch_optional(&mut *self)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::db::DBClient;

    #[tokio::test]
    async fn test_credit_then_debit() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let who = Uuid::new_v4();

        assert_eq!(conn.get_balance(who).await.unwrap(), 0);
        assert_eq!(conn.credit_account(who, 300).await.unwrap(), Some(300));
        assert_eq!(conn.credit_account(who, 200).await.unwrap(), Some(500));
        assert_eq!(conn.debit_account(who, 450).await.unwrap(), Some(50));
    }

    #[tokio::test]
    async fn test_overdraw_is_refused() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let who = Uuid::new_v4();
        conn.credit_account(who, 100).await.unwrap();

        assert_eq!(conn.debit_account(who, 101).await.unwrap(), None);
        assert_eq!(conn.get_balance(who).await.unwrap(), 100);
        assert_eq!(conn.debit_account(Uuid::new_v4(), 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credit_past_ceiling_is_refused() {
        let db = DBClient::in_memory().await;
        let mut conn = db.pool.acquire().await.unwrap();
        let who = Uuid::new_v4();

        assert_eq!(conn.credit_account(who, i64::MAX - 5).await.unwrap(), Some(i64::MAX - 5));
        assert_eq!(conn.credit_account(who, 6).await.unwrap(), None);
        assert_eq!(conn.get_balance(who).await.unwrap(), i64::MAX - 5);

        assert_eq!(conn.credit_account(who, 5).await.unwrap(), Some(i64::MAX));
        assert_eq!(conn.credit_account(who, 1).await.unwrap(), None);
        assert_eq!(conn.get_balance(who).await.unwrap(), i64::MAX);
    }
}
