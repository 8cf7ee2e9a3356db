//! Gym class storage.
//!
//! The seat counter on each row belongs to
//! [`CapacityLedger`](crate::db::handlers::capacity::CapacityLedger); this
//! repository never touches `current_bookings`.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::gym_classes::{
    GymClassCreateDBRequest, GymClassDBResponse, GymClassUpdateDBRequest,
};
use crate::types::ClassId;

pub struct GymClasses<'c> {
    db: &'c mut SqliteConnection,
}

/// Filter for listing gym classes.
#[derive(Debug)]
pub struct GymClassFilter {
    pub skip: i64,
    pub limit: i64,
}

impl Default for GymClassFilter {
    fn default() -> Self {
        Self { skip: 0, limit: 100 }
    }
}

impl<'c> GymClasses<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Flip `is_cancelled` and stamp `updated_at`. Counter and reservation
    /// cleanup belong to the booking manager's cascade.
    #[instrument(skip(self, now), err)]
    pub async fn mark_cancelled(
        &mut self,
        class_id: ClassId,
        now: DateTime<Utc>,
    ) -> Result<GymClassDBResponse> {
        let class = sqlx::query_as::<_, GymClassDBResponse>(
            r#"
            UPDATE gym_classes
            SET is_cancelled = 1, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(class_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(class)
    }
}

#[async_trait::async_trait]
impl Repository for GymClasses<'_> {
    type CreateRequest = GymClassCreateDBRequest;
    type UpdateRequest = GymClassUpdateDBRequest;
    type Response = GymClassDBResponse;
    type Id = ClassId;
    type Filter = GymClassFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let class = sqlx::query_as::<_, GymClassDBResponse>(
            r#"
            INSERT INTO gym_classes (name, instructor_id, start_time, end_time, capacity, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.instructor_id)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.capacity)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(class)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let class = sqlx::query_as::<_, GymClassDBResponse>("SELECT * FROM gym_classes WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(class)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let classes = sqlx::query_as::<_, GymClassDBResponse>(
            r#"
            SELECT * FROM gym_classes
            ORDER BY start_time, id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(classes)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let class = sqlx::query_as::<_, GymClassDBResponse>(
            r#"
            UPDATE gym_classes
            SET name = COALESCE(?, name),
                instructor_id = COALESCE(?, instructor_id),
                start_time = COALESCE(?, start_time),
                end_time = COALESCE(?, end_time),
                capacity = COALESCE(?, capacity),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(request.instructor_id)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.capacity)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(class)
    }
}
