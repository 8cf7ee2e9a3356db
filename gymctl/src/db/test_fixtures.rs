//! Seed helpers for repository and booking tests.
//!
//! Emails carry a process-wide counter so fixtures never collide with each
//! other, even across tests sharing a database.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::api::models::users::{MembershipStatus, Role};
use crate::db::handlers::{GymClasses, Repository, Users};
use crate::db::models::gym_classes::{GymClassCreateDBRequest, GymClassDBResponse};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::types::UserId;

static NEXT_EMAIL: AtomicU64 = AtomicU64::new(0);

fn unique_email(prefix: &str) -> String {
    let n = NEXT_EMAIL.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{n}@example.com")
}

async fn seed_user(
    pool: &SqlitePool,
    role: Role,
    membership_status: Option<MembershipStatus>,
) -> UserDBResponse {
    let prefix = match role {
        Role::Member => "member",
        Role::Instructor => "instructor",
        Role::Admin => "admin",
    };
    let mut conn = pool.acquire().await.expect("acquire connection");
    let mut users = Users::new(&mut conn);
    users
        .create(&UserCreateDBRequest {
            name: format!("Test {prefix}"),
            email: unique_email(prefix),
            phone: None,
            role,
            membership_status,
        })
        .await
        .expect("seed user")
}

/// Member with an active membership.
pub async fn seed_member(pool: &SqlitePool) -> UserDBResponse {
    seed_user(pool, Role::Member, Some(MembershipStatus::Active)).await
}

/// Member in the given membership state.
pub async fn seed_member_with_status(
    pool: &SqlitePool,
    status: MembershipStatus,
) -> UserDBResponse {
    seed_user(pool, Role::Member, Some(status)).await
}

pub async fn seed_instructor(pool: &SqlitePool) -> UserDBResponse {
    seed_user(pool, Role::Instructor, None).await
}

pub async fn seed_admin(pool: &SqlitePool) -> UserDBResponse {
    seed_user(pool, Role::Admin, None).await
}

/// Class starting an hour from now with the given capacity.
pub async fn seed_class(
    pool: &SqlitePool,
    instructor_id: UserId,
    capacity: i64,
) -> GymClassDBResponse {
    let start = Utc::now() + Duration::hours(1);
    let mut conn = pool.acquire().await.expect("acquire connection");
    let mut classes = GymClasses::new(&mut conn);
    classes
        .create(&GymClassCreateDBRequest {
            name: "Test Class".to_string(),
            instructor_id,
            start_time: start,
            end_time: start + Duration::hours(1),
            capacity,
        })
        .await
        .expect("seed class")
}
