//! API request/response models for reservations.

use crate::db::models::reservations::ReservationDBResponse;
use crate::types::{ClassId, ReservationId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Lifecycle state of a reservation.
///
/// Stored as lowercase text in the `reservations.status` column. The only
/// legal transitions are `confirmed -> cancelled`, `waitlisted -> cancelled`
/// and `waitlisted -> confirmed` (waitlist promotion).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Waitlisted,
    Cancelled,
}

/// Request body for booking a spot in a class.
///
/// The outcome depends on remaining capacity: the reservation comes back
/// `confirmed` when a seat is open and `waitlisted` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationCreate {
    pub member_id: UserId,
    pub class_id: ClassId,
}

/// Request body for cancelling a reservation; names the user performing the
/// action (the owning member, or an admin).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationCancel {
    pub acting_user_id: UserId,
}

/// Full reservation details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub member_id: UserId,
    pub class_id: ClassId,
    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing reservations
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListReservationsQuery {
    /// Only return reservations for this class
    pub class_id: Option<ClassId>,
    /// Only return reservations made by this member
    pub member_id: Option<UserId>,
    /// Number of reservations to skip
    pub skip: Option<i64>,
    /// Maximum number of reservations to return
    pub limit: Option<i64>,
}

impl From<ReservationDBResponse> for ReservationResponse {
    fn from(db: ReservationDBResponse) -> Self {
        Self {
            id: db.id,
            member_id: db.member_id,
            class_id: db.class_id,
            status: db.status,
            reserved_at: db.reserved_at,
            cancelled_at: db.cancelled_at,
        }
    }
}
