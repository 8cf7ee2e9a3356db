//! API request/response models for users.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Role a user account holds within the gym.
///
/// Stored as lowercase text in the `users.role` column.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Instructor,
    Admin,
}

/// Membership standing; only meaningful for accounts with the `member` role.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::Type, PartialEq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Inactive,
    Suspended,
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    #[schema(example = "Jamie Ortiz")]
    pub name: String,
    #[schema(example = "jamie@example.com")]
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    /// Ignored for instructors and admins; members default to `active`.
    pub membership_status: Option<MembershipStatus>,
}

/// Partial update for a user. All fields are optional; only provided fields
/// are changed. The role is fixed at creation and cannot be updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Only valid for members; rejected for instructors and admins.
    pub membership_status: Option<MembershipStatus>,
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub membership_status: Option<MembershipStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for listing users
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Only return users holding this role
    pub role: Option<Role>,
    /// Number of users to skip
    pub skip: Option<i64>,
    /// Maximum number of users to return
    pub limit: Option<i64>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            email: db.email,
            phone: db.phone,
            role: db.role,
            membership_status: db.membership_status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
