//! Reservation lifecycle.
//!
//! [`BookingManager`] owns every reservation state transition and its paired
//! capacity-counter update. Each operation takes the class lock, runs all
//! reads and writes inside one transaction, and commits before the lock
//! drops, so the counter and the reservation rows can never drift apart.

pub mod locks;

pub use locks::ClassLocks;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use crate::api::models::reservations::ReservationStatus;
use crate::api::models::users::{MembershipStatus, Role};
use crate::db::errors::DbError;
use crate::db::handlers::{CapacityLedger, GymClasses, Repository, Reservations, Users};
use crate::db::models::gym_classes::GymClassDBResponse;
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse};
use crate::errors::{Error, Result};
use crate::types::{ClassId, ReservationId, UserId};

/// Executes booking operations against the store.
///
/// Holds the pool rather than a connection: every operation opens its own
/// transaction under the class lock.
#[derive(Clone)]
pub struct BookingManager {
    db: SqlitePool,
    locks: ClassLocks,
}

impl BookingManager {
    pub fn new(db: SqlitePool, locks: ClassLocks) -> Self {
        Self { db, locks }
    }

    /// Book a class for a member. Confirms a seat when one is open, otherwise
    /// joins the waitlist.
    #[instrument(skip(self), err)]
    pub async fn create_reservation(
        &self,
        member_id: UserId,
        class_id: ClassId,
    ) -> Result<ReservationDBResponse> {
        let lock = self.locks.lock_for(class_id);
        let _guard = lock.lock().await;

        let mut tx = self.db.begin().await.map_err(Error::transient)?;

        let member = Users::new(&mut tx)
            .get_by_id(member_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "User".to_string(),
                id: member_id.to_string(),
            })?;

        let class = GymClasses::new(&mut tx)
            .get_by_id(class_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Class".to_string(),
                id: class_id.to_string(),
            })?;

        if member.role != Role::Member {
            return Err(Error::InvalidMember {
                member_id,
                reason: "not a member".to_string(),
            });
        }
        match member.membership_status {
            Some(MembershipStatus::Active) => {}
            Some(MembershipStatus::Inactive) => {
                return Err(Error::InvalidMember {
                    member_id,
                    reason: "membership is inactive".to_string(),
                });
            }
            Some(MembershipStatus::Suspended) => {
                return Err(Error::InvalidMember {
                    member_id,
                    reason: "membership is suspended".to_string(),
                });
            }
            None => {
                return Err(Error::InvalidMember {
                    member_id,
                    reason: "no membership on file".to_string(),
                });
            }
        }

        if class.is_cancelled {
            return Err(Error::ClassCancelled { class_id });
        }

        if Reservations::new(&mut tx)
            .find_open_for_member(class_id, member_id)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateBooking {
                member_id,
                class_id,
            });
        }

        let status = {
            let mut ledger = CapacityLedger::new(&mut tx);
            if ledger.has_open_seat(class_id).await? {
                ledger.occupy_seat(class_id).await?;
                ReservationStatus::Confirmed
            } else {
                ReservationStatus::Waitlisted
            }
        };

        let reservation = Reservations::new(&mut tx)
            .insert(
                &ReservationCreateDBRequest {
                    member_id,
                    class_id,
                    status,
                },
                Utc::now(),
            )
            .await?;

        tx.commit().await.map_err(Error::transient)?;

        let status_label = match reservation.status {
            ReservationStatus::Confirmed => "confirmed",
            _ => "waitlisted",
        };
        metrics::counter!("gymctl_reservations_total", "status" => status_label).increment(1);

        info!(
            reservation_id = reservation.id,
            status = ?reservation.status,
            "reservation created"
        );
        Ok(reservation)
    }

    /// Cancel a reservation on behalf of `acting_user_id`, promoting the head
    /// of the waitlist when a confirmed seat frees up.
    #[instrument(skip(self), err)]
    pub async fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        acting_user_id: UserId,
    ) -> Result<ReservationDBResponse> {
        // Pre-read outside the lock to learn which class to serialize on.
        // Reservation rows never move between classes, so the lock is stable;
        // status is re-read under the lock.
        let initial = {
            let mut conn = self.db.acquire().await.map_err(Error::transient)?;
            Reservations::new(&mut conn).get_by_id(reservation_id).await?
        }
        .ok_or_else(|| Error::NotFound {
            resource: "Reservation".to_string(),
            id: reservation_id.to_string(),
        })?;

        let lock = self.locks.lock_for(initial.class_id);
        let _guard = lock.lock().await;

        let mut tx = self.db.begin().await.map_err(Error::transient)?;

        let current = Reservations::new(&mut tx)
            .get_by_id(reservation_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Reservation".to_string(),
                id: reservation_id.to_string(),
            })?;

        if current.status == ReservationStatus::Cancelled {
            return Err(Error::AlreadyCancelled { reservation_id });
        }

        let acting = Users::new(&mut tx)
            .get_by_id(acting_user_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "User".to_string(),
                id: acting_user_id.to_string(),
            })?;

        if acting.role != Role::Admin && acting.id != current.member_id {
            return Err(Error::Unauthorized {
                message: "only the reservation's member or an admin may cancel it".to_string(),
            });
        }

        let now = Utc::now();
        let cancelled = Reservations::new(&mut tx)
            .mark_cancelled(reservation_id, now)
            .await?;

        // A waitlisted reservation never held a seat, so the ledger and the
        // queue stay untouched.
        let mut promoted = None;
        if current.status == ReservationStatus::Confirmed {
            CapacityLedger::new(&mut tx)
                .release_seat(current.class_id)
                .await?;

            if let Some(next) = Reservations::new(&mut tx)
                .next_waitlisted(current.class_id)
                .await?
            {
                Reservations::new(&mut tx).promote_to_confirmed(next.id).await?;
                CapacityLedger::new(&mut tx)
                    .occupy_seat(current.class_id)
                    .await?;
                promoted = Some(next.id);
            }
        }

        tx.commit().await.map_err(Error::transient)?;

        metrics::counter!("gymctl_reservation_cancellations_total").increment(1);
        if promoted.is_some() {
            metrics::counter!("gymctl_waitlist_promotions_total").increment(1);
        }

        info!(
            reservation_id,
            class_id = current.class_id,
            promoted_reservation_id = promoted,
            "reservation cancelled"
        );
        Ok(cancelled)
    }

    /// Cancel a class: close every confirmed or waitlisted reservation and
    /// zero the seat counter, atomically. Re-cancelling is a no-op that
    /// returns the class.
    ///
    /// Authorization is the API layer's job; the core assumes the caller may
    /// cancel.
    #[instrument(skip(self), err)]
    pub async fn cancel_class(&self, class_id: ClassId) -> Result<GymClassDBResponse> {
        let lock = self.locks.lock_for(class_id);
        let _guard = lock.lock().await;

        let mut tx = self.db.begin().await.map_err(Error::transient)?;

        let now = Utc::now();
        let class = GymClasses::new(&mut tx)
            .mark_cancelled(class_id, now)
            .await
            .map_err(|e| match e {
                DbError::NotFound => Error::NotFound {
                    resource: "Class".to_string(),
                    id: class_id.to_string(),
                },
                other => Error::Database(other),
            })?;

        let closed = Reservations::new(&mut tx)
            .cancel_open_for_class(class_id, now)
            .await?;
        CapacityLedger::new(&mut tx).zero_out(class_id).await?;

        tx.commit().await.map_err(Error::transient)?;

        metrics::counter!("gymctl_class_cancellations_total").increment(1);

        info!(class_id, closed_reservations = closed, "class cancelled");
        Ok(class)
    }
}
