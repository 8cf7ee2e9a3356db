//! Seat accounting for gym classes.
//!
//! `gym_classes.current_bookings` is the authoritative count of confirmed
//! reservations per class. Every mutation here runs inside the caller's
//! transaction, paired with the reservation row change that justifies it;
//! the ledger itself never reads or writes reservation rows.

use sqlx::SqliteConnection;
use tracing::instrument;

use crate::db::errors::{DbError, Result};
use crate::types::ClassId;

pub struct CapacityLedger<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> CapacityLedger<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// True when the class is active and a seat is free.
    #[instrument(skip(self), err)]
    pub async fn has_open_seat(&mut self, class_id: ClassId) -> Result<bool> {
        let open: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT current_bookings < capacity
            FROM gym_classes
            WHERE id = ? AND is_cancelled = 0
            "#,
        )
        .bind(class_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(open.unwrap_or(false))
    }

    /// Take one seat. The caller has either verified `has_open_seat` or is
    /// refilling a seat it just released (waitlist promotion).
    #[instrument(skip(self), err)]
    pub async fn occupy_seat(&mut self, class_id: ClassId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE gym_classes
            SET current_bookings = current_bookings + 1
            WHERE id = ?
            "#,
        )
        .bind(class_id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Give one seat back, floored at zero.
    #[instrument(skip(self), err)]
    pub async fn release_seat(&mut self, class_id: ClassId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE gym_classes
            SET current_bookings = MAX(current_bookings - 1, 0)
            WHERE id = ?
            "#,
        )
        .bind(class_id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Reset the counter to zero. Used only when a class is cancelled.
    #[instrument(skip(self), err)]
    pub async fn zero_out(&mut self, class_id: ClassId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE gym_classes
            SET current_bookings = 0
            WHERE id = ?
            "#,
        )
        .bind(class_id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
