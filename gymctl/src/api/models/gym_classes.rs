//! API request/response models for scheduled gym classes.

use crate::db::models::gym_classes::GymClassDBResponse;
use crate::types::{ClassId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for scheduling a new class.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymClassCreate {
    #[schema(example = "Morning Yoga")]
    pub name: String,
    /// Must reference a user holding the `instructor` role
    pub instructor_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Maximum number of confirmed reservations
    #[schema(example = 20, minimum = 1)]
    pub capacity: i64,
}

/// Partial update for a class. All fields are optional; only provided fields
/// are changed. Capacity can grow freely but can never shrink below the
/// number of seats already taken.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymClassUpdate {
    pub name: Option<String>,
    pub instructor_id: Option<UserId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<i64>,
}

/// Request body for cancelling a class; names the admin performing the action.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymClassCancel {
    pub acting_user_id: UserId,
}

/// Full class details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GymClassResponse {
    pub id: ClassId,
    pub name: String,
    pub instructor_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i64,
    /// Seats currently taken by confirmed reservations
    pub current_bookings: i64,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing classes
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListGymClassesQuery {
    /// Number of classes to skip
    pub skip: Option<i64>,
    /// Maximum number of classes to return
    pub limit: Option<i64>,
}

impl From<GymClassDBResponse> for GymClassResponse {
    fn from(db: GymClassDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            instructor_id: db.instructor_id,
            start_time: db.start_time,
            end_time: db.end_time,
            capacity: db.capacity,
            current_bookings: db.current_bookings,
            is_cancelled: db.is_cancelled,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
