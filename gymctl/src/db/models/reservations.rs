//! Database models for reservations.

use crate::api::models::reservations::ReservationStatus;
use crate::types::{ClassId, ReservationId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for inserting a reservation.
///
/// The status is decided by the booking manager (confirmed when a seat is
/// open, waitlisted otherwise), never by API input.
#[derive(Debug, Clone)]
pub struct ReservationCreateDBRequest {
    pub member_id: UserId,
    pub class_id: ClassId,
    pub status: ReservationStatus,
}

/// Database response for a reservation
#[derive(Debug, Clone, FromRow)]
pub struct ReservationDBResponse {
    pub id: ReservationId,
    pub member_id: UserId,
    pub class_id: ClassId,
    pub status: ReservationStatus,
    pub reserved_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}
