// db/userdb.rs
use async_trait::async_trait;
use sqlx::{Error, SqliteConnection};
use uuid::Uuid;

use crate::models::marketmodel::UserProfile;

#[async_trait]
pub trait UserExt {
    async fn get_user_profile(&mut self, identity: Uuid) -> Result<Option<UserProfile>, Error>;

    /// Writes name and skills only; rating columns keep their values.
    async fn upsert_user_profile(
        &mut self,
        identity: Uuid,
        name: &str,
        skills: &str,
    ) -> Result<UserProfile, Error>;

    async fn save_user_rating(
        &mut self,
        identity: Uuid,
        rating: i64,
        total_ratings: i64,
        rating_sum: i64,
    ) -> Result<UserProfile, Error>;
}

#[async_trait]
impl UserExt for SqliteConnection {
    async fn get_user_profile(&mut self, identity: Uuid) -> Result<Option<UserProfile>, Error> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&mut *self)
            .await
    }

    async fn upsert_user_profile(
        &mut self,
        identity: Uuid,
        name: &str,
        skills: &str,
    ) -> Result<UserProfile, Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (identity, name, skills) VALUES (?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET name = excluded.name, skills = excluded.skills
            RETURNING *
            "#,
        )
        .bind(identity)
        .bind(name)
        .bind(skills)
        .fetch_one(&mut *self)
        .await
    }

    async fn save_user_rating(
        &mut self,
        identity: Uuid,
        rating: i64,
        total_ratings: i64,
        rating_sum: i64,
    ) -> Result<UserProfile, Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (identity, rating, total_ratings, rating_sum) VALUES (?, ?, ?, ?)
            ON CONFLICT(identity) DO UPDATE SET
                rating = excluded.rating,
                total_ratings = excluded.total_ratings,
                rating_sum = excluded.rating_sum
            RETURNING *
            "#,
        )
        .bind(identity)
        .bind(rating)
        .bind(total_ratings)
        .bind(rating_sum)
        .fetch_one(&mut *self)
        .await
    }
}
