use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::StoreError,
    models::trip::{NewTrip, Trip, TripPatch},
    services::store::{not_found, TripStore},
};

/// Local SQLite-backed store, used for self-hosting and tests.
#[derive(Clone)]
pub struct SqliteTripStore {
    db: DbPool,
}

impl SqliteTripStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TripStore for SqliteTripStore {
    async fn select_all(&self) -> Result<Vec<Trip>, StoreError> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"SELECT id, user_id, title, description, destination, start_date, end_date,
                      budget, ai_suggestions, created_at, updated_at
               FROM trips
               ORDER BY created_at DESC, rowid DESC"#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(trips)
    }

    async fn insert(&self, trip: &NewTrip) -> Result<Trip, StoreError> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Trip>(
            r#"INSERT INTO trips (id, user_id, title, description, destination, start_date,
                                  end_date, budget, ai_suggestions, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
               RETURNING id, user_id, title, description, destination, start_date, end_date,
                         budget, ai_suggestions, created_at, updated_at"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&trip.user_id)
        .bind(&trip.title)
        .bind(&trip.description)
        .bind(&trip.destination)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.budget)
        .bind(&trip.ai_suggestions)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db)
        .await?;
        debug!(id = %created.id, "inserted trip");
        Ok(created)
    }

    async fn update(&self, id: &str, patch: &TripPatch) -> Result<Trip, StoreError> {
        let mut tx = self.db.begin().await?;
        let mut trip = sqlx::query_as::<_, Trip>(
            r#"SELECT id, user_id, title, description, destination, start_date, end_date,
                      budget, ai_suggestions, created_at, updated_at
               FROM trips WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| not_found(id))?;

        trip.apply(patch);
        trip.updated_at = Utc::now();

        sqlx::query(
            r#"UPDATE trips
               SET title = ?1, description = ?2, destination = ?3, start_date = ?4,
                   end_date = ?5, budget = ?6, ai_suggestions = ?7, updated_at = ?8
               WHERE id = ?9"#,
        )
        .bind(&trip.title)
        .bind(&trip.description)
        .bind(&trip.destination)
        .bind(trip.start_date)
        .bind(trip.end_date)
        .bind(trip.budget)
        .bind(&trip.ai_suggestions)
        .bind(trip.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        debug!(id, "updated trip");
        Ok(trip)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        debug!(id, "deleted trip");
        Ok(())
    }
}
