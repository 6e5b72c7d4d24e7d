// service/user_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, userdb::UserExt},
    models::marketmodel::{LedgerEvent, UserProfile},
    service::{error::ServiceError, event_service::EventService},
};

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// Integer mean of `count` scores summing to `sum`, halves rounded up.
pub fn rounded_average(sum: i64, count: i64) -> i64 {
    if count <= 0 {
        return 0;
    }
    (2 * sum + count) / (2 * count)
}

#[derive(Debug, Clone)]
pub struct UserService {
    db_client: Arc<DBClient>,
    event_service: Arc<EventService>,
}

impl UserService {
    pub fn new(db_client: Arc<DBClient>, event_service: Arc<EventService>) -> Self {
        Self {
            db_client,
            event_service,
        }
    }

    /// Replaces the caller's name and skills. Ratings are left as they are.
    pub async fn update_user_profile(
        &self,
        identity: Uuid,
        name: &str,
        skills: &str,
    ) -> Result<UserProfile, ServiceError> {
        let mut tx = self.db_client.pool.begin().await?;
        let profile = tx.upsert_user_profile(identity, name, skills).await?;
        tx.commit().await?;

        tracing::debug!(%identity, "profile updated");
        Ok(profile)
    }

    pub async fn get_user_profile(&self, identity: Uuid) -> Result<UserProfile, ServiceError> {
        let mut conn = self.db_client.pool.acquire().await?;
        Ok(conn
            .get_user_profile(identity)
            .await?
            .unwrap_or_else(|| UserProfile::empty(identity)))
    }

    pub async fn rate_user(&self, caller: Uuid, target: Uuid, score: i64) -> Result<UserProfile, ServiceError> {
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(ServiceError::InvalidArgument(format!(
                "score {} must be between {} and {}",
                score, MIN_SCORE, MAX_SCORE
            )));
        }

        let mut tx = self.db_client.pool.begin().await?;

        let current = tx
            .get_user_profile(target)
            .await?
            .unwrap_or_else(|| UserProfile::empty(target));
        let total_ratings = current.total_ratings + 1;
        let rating_sum = current.rating_sum + score;
        let rating = rounded_average(rating_sum, total_ratings);

        let profile = tx
            .save_user_rating(target, rating, total_ratings, rating_sum)
            .await?;

        let record = self
            .event_service
            .record(
                &mut tx,
                caller,
                LedgerEvent::UserRated {
                    target_id: target,
                    score,
                    new_rating: rating,
                },
            )
            .await?;

        tx.commit().await?;
        self.event_service.publish(&record).await;

        tracing::info!(%target, score, rating, total_ratings, "user rated");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{error::ErrorKind, testing::harness};

    #[test]
    fn test_rounded_average() {
        assert_eq!(rounded_average(0, 0), 0);
        assert_eq!(rounded_average(4, 1), 4);
        assert_eq!(rounded_average(9, 2), 5);
        assert_eq!(rounded_average(7, 2), 4);
        assert_eq!(rounded_average(7, 3), 2);
        assert_eq!(rounded_average(8, 3), 3);
    }

    #[tokio::test]
    async fn test_rating_tracks_exact_average() {
        let h = harness().await;
        let target = Uuid::new_v4();
        let scores = [5, 4, 4, 1, 2, 5, 3];

        let mut sum = 0;
        for (k, score) in scores.iter().enumerate() {
            sum += score;
            let profile = h.users.rate_user(Uuid::new_v4(), target, *score).await.unwrap();
            let count = k as i64 + 1;
            assert_eq!(profile.total_ratings, count);
            assert_eq!(profile.rating, rounded_average(sum, count));
        }

        let profile = h.users.get_user_profile(target).await.unwrap();
        assert_eq!(profile.total_ratings, 7);
        // 24 / 7 = 3.43
        assert_eq!(profile.rating, 3);
    }

    #[tokio::test]
    async fn test_score_out_of_range() {
        let h = harness().await;
        let target = Uuid::new_v4();

        for score in [0, 6, -3] {
            let err = h.users.rate_user(Uuid::new_v4(), target, score).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert_eq!(h.users.get_user_profile(target).await.unwrap(), UserProfile::empty(target));
    }

    #[tokio::test]
    async fn test_profile_update_is_idempotent_and_keeps_rating() {
        let h = harness().await;
        let who = Uuid::new_v4();

        assert_eq!(h.users.get_user_profile(who).await.unwrap(), UserProfile::empty(who));

        h.users.rate_user(Uuid::new_v4(), who, 4).await.unwrap();
        let first = h.users.update_user_profile(who, "Ada", "rust, sql").await.unwrap();
        let second = h.users.update_user_profile(who, "Ada", "rust, sql").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(second.rating, 4);
        assert_eq!(second.total_ratings, 1);

        let stored = h.users.get_user_profile(who).await.unwrap();
        assert_eq!(serde_json::to_string(&stored).unwrap(), serde_json::to_string(&first).unwrap());
    }

    #[tokio::test]
    async fn test_rating_emits_event() {
        let mut h = harness().await;
        let target = Uuid::new_v4();
        h.users.rate_user(Uuid::new_v4(), target, 5).await.unwrap();

        let record = h.feed.recv().await.unwrap();
        assert_eq!(
            record.event,
            LedgerEvent::UserRated {
                target_id: target,
                score: 5,
                new_rating: 5
            }
        );
    }
}
