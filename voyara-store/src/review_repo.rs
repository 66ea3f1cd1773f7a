use async_trait::async_trait;
use sqlx::PgPool;

use voyara_core::models::Review;
use voyara_core::repository::{RepoError, ReviewStore};

pub struct SqlReviewStore {
    pool: PgPool,
}

impl SqlReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    tour_id: i64,
    rating: i32,
    comment: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

fn map_review(row: ReviewRow) -> Review {
    Review {
        id: row.id,
        user_id: row.user_id,
        tour_id: row.tour_id,
        rating: row.rating,
        comment: row.comment,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

#[async_trait]
impl ReviewStore for SqlReviewStore {
    async fn get_review(&self, user_id: i64, tour_id: i64) -> Result<Option<Review>, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            "SELECT id, user_id, tour_id, rating, comment, created_at, updated_at
             FROM reviews WHERE user_id = $1 AND tour_id = $2",
        )
        .bind(user_id)
        .bind(tour_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_review))
    }

    async fn upsert_review(
        &self,
        user_id: i64,
        tour_id: i64,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Review, RepoError> {
        // Overwrite-on-conflict is deliberate: one review per (user, tour),
        // the latest write wins.
        let row = sqlx::query_as::<_, ReviewRow>(
            "INSERT INTO reviews (user_id, tour_id, rating, comment)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, tour_id)
             DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, updated_at = NOW()
             RETURNING id, user_id, tour_id, rating, comment, created_at, updated_at",
        )
        .bind(user_id)
        .bind(tour_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(map_review(row))
    }
}
