//! Database models for users.

use crate::api::models::users::{MembershipStatus, Role, UserCreate, UserUpdate};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub membership_status: Option<MembershipStatus>,
}

impl From<UserCreate> for UserCreateDBRequest {
    fn from(api: UserCreate) -> Self {
        let membership_status = match api.role {
            // Members default to active unless the caller says otherwise
            Role::Member => Some(api.membership_status.unwrap_or(MembershipStatus::Active)),
            // Instructors and admins never carry a membership standing
            Role::Instructor | Role::Admin => None,
        };
        Self {
            name: api.name,
            email: api.email,
            phone: api.phone,
            role: api.role,
            membership_status,
        }
    }
}

/// Database request for updating a user
#[derive(Debug, Clone)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub membership_status: Option<MembershipStatus>,
}

impl UserUpdateDBRequest {
    pub fn new(update: UserUpdate) -> Self {
        Self {
            name: update.name,
            email: update.email,
            phone: update.phone,
            membership_status: update.membership_status,
        }
    }
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub membership_status: Option<MembershipStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
