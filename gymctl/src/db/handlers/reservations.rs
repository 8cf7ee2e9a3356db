//! Reservation storage.
//!
//! Reads are free-form; writes are the state transitions driven by
//! [`BookingManager`](crate::booking::BookingManager), which owns the pairing
//! of every status change with its capacity-counter update. There is no
//! general-purpose create or update here on purpose.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqliteConnection};
use tracing::instrument;

use crate::api::models::reservations::ReservationStatus;
use crate::db::errors::{DbError, Result};
use crate::db::models::reservations::{ReservationCreateDBRequest, ReservationDBResponse};
use crate::types::{ClassId, ReservationId, UserId};

pub struct Reservations<'c> {
    db: &'c mut SqliteConnection,
}

/// Filter for listing reservations.
#[derive(Debug)]
pub struct ReservationFilter {
    pub class_id: Option<ClassId>,
    pub member_id: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for ReservationFilter {
    fn default() -> Self {
        Self {
            class_id: None,
            member_id: None,
            skip: 0,
            limit: 100,
        }
    }
}

impl<'c> Reservations<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_id(&mut self, id: ReservationId) -> Result<Option<ReservationDBResponse>> {
        let reservation =
            sqlx::query_as::<_, ReservationDBResponse>("SELECT * FROM reservations WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(reservation)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn list(&mut self, filter: &ReservationFilter) -> Result<Vec<ReservationDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM reservations WHERE 1=1");

        if let Some(class_id) = filter.class_id {
            query.push(" AND class_id = ");
            query.push_bind(class_id);
        }
        if let Some(member_id) = filter.member_id {
            query.push(" AND member_id = ");
            query.push_bind(member_id);
        }

        query.push(" ORDER BY reserved_at, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let reservations = query
            .build_query_as::<ReservationDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(reservations)
    }

    /// Insert a reservation in its decided initial status.
    #[instrument(skip(self, request, now), fields(member_id = request.member_id, class_id = request.class_id), err)]
    pub async fn insert(
        &mut self,
        request: &ReservationCreateDBRequest,
        now: DateTime<Utc>,
    ) -> Result<ReservationDBResponse> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            INSERT INTO reservations (member_id, class_id, status, reserved_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.member_id)
        .bind(request.class_id)
        .bind(&request.status)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(reservation)
    }

    /// Transition to cancelled and stamp `cancelled_at`.
    #[instrument(skip(self, now), err)]
    pub async fn mark_cancelled(
        &mut self,
        id: ReservationId,
        now: DateTime<Utc>,
    ) -> Result<ReservationDBResponse> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            UPDATE reservations
            SET status = ?, cancelled_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(ReservationStatus::Cancelled)
        .bind(now)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(reservation)
    }

    /// Waitlisted to confirmed; `reserved_at` keeps its original value so the
    /// queue position is preserved in listings.
    #[instrument(skip(self), err)]
    pub async fn promote_to_confirmed(&mut self, id: ReservationId) -> Result<ReservationDBResponse> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            UPDATE reservations
            SET status = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(ReservationStatus::Confirmed)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(reservation)
    }

    /// The member's non-cancelled reservation for a class, if one exists. The
    /// duplicate-booking rule allows at most one.
    #[instrument(skip(self), err)]
    pub async fn find_open_for_member(
        &mut self,
        class_id: ClassId,
        member_id: UserId,
    ) -> Result<Option<ReservationDBResponse>> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            SELECT * FROM reservations
            WHERE class_id = ? AND member_id = ? AND status != ?
            LIMIT 1
            "#,
        )
        .bind(class_id)
        .bind(member_id)
        .bind(ReservationStatus::Cancelled)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(reservation)
    }

    /// Head of the waitlist: earliest `reserved_at`, lowest id on ties.
    #[instrument(skip(self), err)]
    pub async fn next_waitlisted(
        &mut self,
        class_id: ClassId,
    ) -> Result<Option<ReservationDBResponse>> {
        let reservation = sqlx::query_as::<_, ReservationDBResponse>(
            r#"
            SELECT * FROM reservations
            WHERE class_id = ? AND status = ?
            ORDER BY reserved_at, id
            LIMIT 1
            "#,
        )
        .bind(class_id)
        .bind(ReservationStatus::Waitlisted)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(reservation)
    }

    /// Cancel every confirmed or waitlisted reservation for a class. Returns
    /// the number of rows transitioned; already-cancelled rows keep their
    /// original `cancelled_at`.
    #[instrument(skip(self, now), err)]
    pub async fn cancel_open_for_class(
        &mut self,
        class_id: ClassId,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET status = ?, cancelled_at = ?
            WHERE class_id = ? AND status != ?
            "#,
        )
        .bind(ReservationStatus::Cancelled)
        .bind(now)
        .bind(class_id)
        .bind(ReservationStatus::Cancelled)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_fixtures::{seed_class, seed_instructor, seed_member};
    use chrono::Duration;
    use sqlx::SqlitePool;

    fn request(member_id: UserId, class_id: ClassId, status: ReservationStatus) -> ReservationCreateDBRequest {
        ReservationCreateDBRequest {
            member_id,
            class_id,
            status,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_insert_and_get(pool: SqlitePool) {
        let member = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        let now = Utc::now();
        let created = reservations
            .insert(&request(member.id, class.id, ReservationStatus::Confirmed), now)
            .await
            .unwrap();

        assert_eq!(created.status, ReservationStatus::Confirmed);
        assert_eq!(created.reserved_at, now);
        assert!(created.cancelled_at.is_none());

        let fetched = reservations.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.member_id, member.id);
        assert_eq!(fetched.class_id, class.id);

        assert!(reservations.get_by_id(424242).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters(pool: SqlitePool) {
        let alice = seed_member(&pool).await;
        let bob = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let yoga = seed_class(&pool, instructor.id, 5).await;
        let spin = seed_class(&pool, instructor.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        let now = Utc::now();
        reservations.insert(&request(alice.id, yoga.id, ReservationStatus::Confirmed), now).await.unwrap();
        reservations.insert(&request(bob.id, yoga.id, ReservationStatus::Confirmed), now).await.unwrap();
        reservations.insert(&request(alice.id, spin.id, ReservationStatus::Confirmed), now).await.unwrap();

        let for_yoga = reservations
            .list(&ReservationFilter {
                class_id: Some(yoga.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_yoga.len(), 2);

        let for_alice = reservations
            .list(&ReservationFilter {
                member_id: Some(alice.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(for_alice.len(), 2);

        let both = reservations
            .list(&ReservationFilter {
                class_id: Some(spin.id),
                member_id: Some(alice.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_orders_by_reserved_at_then_id(pool: SqlitePool) {
        let alice = seed_member(&pool).await;
        let bob = seed_member(&pool).await;
        let carol = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        let base = Utc::now();
        let late = reservations
            .insert(&request(alice.id, class.id, ReservationStatus::Confirmed), base + Duration::minutes(5))
            .await
            .unwrap();
        let early = reservations
            .insert(&request(bob.id, class.id, ReservationStatus::Confirmed), base)
            .await
            .unwrap();
        let tied_with_early = reservations
            .insert(&request(carol.id, class.id, ReservationStatus::Confirmed), base)
            .await
            .unwrap();

        let listed = reservations.list(&ReservationFilter::default()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![early.id, tied_with_early.id, late.id]);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_mark_cancelled(pool: SqlitePool) {
        let member = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        let created = reservations
            .insert(&request(member.id, class.id, ReservationStatus::Confirmed), Utc::now())
            .await
            .unwrap();

        let cancelled_at = Utc::now();
        let cancelled = reservations.mark_cancelled(created.id, cancelled_at).await.unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(cancelled.cancelled_at, Some(cancelled_at));

        let err = reservations.mark_cancelled(424242, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_promote_keeps_reserved_at(pool: SqlitePool) {
        let member = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 1).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        let reserved_at = Utc::now();
        let created = reservations
            .insert(&request(member.id, class.id, ReservationStatus::Waitlisted), reserved_at)
            .await
            .unwrap();

        let promoted = reservations.promote_to_confirmed(created.id).await.unwrap();
        assert_eq!(promoted.status, ReservationStatus::Confirmed);
        assert_eq!(promoted.reserved_at, reserved_at);
        assert!(promoted.cancelled_at.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_find_open_for_member(pool: SqlitePool) {
        let member = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 5).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        assert!(reservations.find_open_for_member(class.id, member.id).await.unwrap().is_none());

        let created = reservations
            .insert(&request(member.id, class.id, ReservationStatus::Waitlisted), Utc::now())
            .await
            .unwrap();
        assert!(reservations.find_open_for_member(class.id, member.id).await.unwrap().is_some());

        reservations.mark_cancelled(created.id, Utc::now()).await.unwrap();
        assert!(reservations.find_open_for_member(class.id, member.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_next_waitlisted_fifo_with_id_tie_break(pool: SqlitePool) {
        let alice = seed_member(&pool).await;
        let bob = seed_member(&pool).await;
        let carol = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 1).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        assert!(reservations.next_waitlisted(class.id).await.unwrap().is_none());

        let shared_instant = Utc::now();
        let first_in = reservations
            .insert(&request(alice.id, class.id, ReservationStatus::Waitlisted), shared_instant)
            .await
            .unwrap();
        let tied_newer = reservations
            .insert(&request(bob.id, class.id, ReservationStatus::Waitlisted), shared_instant)
            .await
            .unwrap();
        reservations
            .insert(&request(carol.id, class.id, ReservationStatus::Waitlisted), shared_instant + Duration::seconds(1))
            .await
            .unwrap();

        // Identical reserved_at resolves by insertion order (lowest id).
        let head = reservations.next_waitlisted(class.id).await.unwrap().unwrap();
        assert_eq!(head.id, first_in.id);
        assert!(tied_newer.id > first_in.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancel_open_for_class(pool: SqlitePool) {
        let alice = seed_member(&pool).await;
        let bob = seed_member(&pool).await;
        let carol = seed_member(&pool).await;
        let instructor = seed_instructor(&pool).await;
        let class = seed_class(&pool, instructor.id, 1).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut reservations = Reservations::new(&mut conn);

        let now = Utc::now();
        reservations.insert(&request(alice.id, class.id, ReservationStatus::Confirmed), now).await.unwrap();
        reservations.insert(&request(bob.id, class.id, ReservationStatus::Waitlisted), now).await.unwrap();
        let already = reservations
            .insert(&request(carol.id, class.id, ReservationStatus::Waitlisted), now)
            .await
            .unwrap();
        let first_cancel = now + Duration::seconds(1);
        reservations.mark_cancelled(already.id, first_cancel).await.unwrap();

        let cascade_at = now + Duration::minutes(1);
        let transitioned = reservations.cancel_open_for_class(class.id, cascade_at).await.unwrap();
        assert_eq!(transitioned, 2);

        let all = reservations
            .list(&ReservationFilter {
                class_id: Some(class.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(all.iter().all(|r| r.status == ReservationStatus::Cancelled));

        // The row cancelled before the cascade keeps its original timestamp.
        let untouched = reservations.get_by_id(already.id).await.unwrap().unwrap();
        assert_eq!(untouched.cancelled_at, Some(first_cancel));
    }
}
