//! Database models for scheduled gym classes.

use crate::api::models::gym_classes::{GymClassCreate, GymClassUpdate};
use crate::types::{ClassId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new class
#[derive(Debug, Clone)]
pub struct GymClassCreateDBRequest {
    pub name: String,
    pub instructor_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i64,
}

impl From<GymClassCreate> for GymClassCreateDBRequest {
    fn from(api: GymClassCreate) -> Self {
        Self {
            name: api.name,
            instructor_id: api.instructor_id,
            start_time: api.start_time,
            end_time: api.end_time,
            capacity: api.capacity,
        }
    }
}

/// Database request for updating a class
#[derive(Debug, Clone)]
pub struct GymClassUpdateDBRequest {
    pub name: Option<String>,
    pub instructor_id: Option<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
}

impl GymClassUpdateDBRequest {
    pub fn new(update: GymClassUpdate) -> Self {
        Self {
            name: update.name,
            instructor_id: update.instructor_id,
            start_time: update.start_time,
            end_time: update.end_time,
            capacity: update.capacity,
        }
    }
}

/// Database response for a class
#[derive(Debug, Clone, FromRow)]
pub struct GymClassDBResponse {
    pub id: ClassId,
    pub name: String,
    pub instructor_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i64,
    pub current_bookings: i64,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
