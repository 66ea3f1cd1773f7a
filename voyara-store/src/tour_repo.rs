use async_trait::async_trait;
use sqlx::PgPool;

use voyara_core::models::Tour;
use voyara_core::repository::{RepoError, TourStore};

pub struct SqlTourStore {
    pool: PgPool,
}

impl SqlTourStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TourRow {
    id: i64,
    title: String,
    location: String,
    price: i64,
    duration_days: Option<i32>,
    start_date: Option<chrono::DateTime<chrono::Utc>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

fn map_tour(row: TourRow) -> Tour {
    Tour {
        id: row.id,
        title: row.title,
        location: row.location,
        price: row.price,
        duration_days: row.duration_days,
        start_date: row.start_date,
        created_at: row.created_at,
    }
}

#[async_trait]
impl TourStore for SqlTourStore {
    async fn get_tour(&self, id: i64) -> Result<Option<Tour>, RepoError> {
        let row = sqlx::query_as::<_, TourRow>(
            "SELECT id, title, location, price, duration_days, start_date, created_at
             FROM tours WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_tour))
    }

    async fn list_tours(&self) -> Result<Vec<Tour>, RepoError> {
        let rows = sqlx::query_as::<_, TourRow>(
            "SELECT id, title, location, price, duration_days, start_date, created_at
             FROM tours ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_tour).collect())
    }
}
