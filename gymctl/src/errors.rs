use crate::db::errors::DbError;
use crate::types::{ClassId, ReservationId, UserId};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// User exists but is not allowed to hold reservations
    #[error("User {member_id} cannot book classes: {reason}")]
    InvalidMember { member_id: UserId, reason: String },

    /// Referenced user exists but does not hold the instructor role
    #[error("User {instructor_id} does not hold the instructor role")]
    InvalidInstructor { instructor_id: UserId },

    /// Booking attempt against a cancelled class
    #[error("Class {class_id} is cancelled")]
    ClassCancelled { class_id: ClassId },

    /// A non-cancelled reservation already exists for this member and class
    #[error("Member {member_id} already has an open reservation for class {class_id}")]
    DuplicateBooking { member_id: UserId, class_id: ClassId },

    /// Reservation is already in the cancelled state
    #[error("Reservation {reservation_id} is already cancelled")]
    AlreadyCancelled { reservation_id: ReservationId },

    /// Acting user may not perform the operation
    #[error("{message}")]
    Unauthorized { message: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The storage layer could not start or finish a unit of work
    #[error("Service temporarily unavailable: {message}")]
    Transient { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Wrap a pool acquire or transaction begin/commit failure. These leave
    /// no partial state behind and callers may retry.
    pub fn transient(e: sqlx::Error) -> Self {
        Error::Transient {
            message: e.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidMember { .. } | Error::InvalidInstructor { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Error::ClassCancelled { .. }
            | Error::DuplicateBooking { .. }
            | Error::AlreadyCancelled { .. }
            | Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Unauthorized { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Transient { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                    StatusCode::CONFLICT
                }
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::InvalidMember { member_id, reason } => {
                format!("User {member_id} cannot book classes: {reason}")
            }
            Error::InvalidInstructor { instructor_id } => {
                format!("User {instructor_id} does not hold the instructor role")
            }
            Error::ClassCancelled { class_id } => format!("Class {class_id} is cancelled"),
            Error::DuplicateBooking {
                member_id,
                class_id,
            } => {
                format!("Member {member_id} already has an open reservation for class {class_id}")
            }
            Error::AlreadyCancelled { reservation_id } => {
                format!("Reservation {reservation_id} is already cancelled")
            }
            Error::Unauthorized { message } => message.clone(),
            Error::BadRequest { message } => message.clone(),
            Error::Conflict { message } => message.clone(),
            Error::Transient { .. } => "Service temporarily unavailable, please retry".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) if c.contains("users.email") => {
                        "A user with this email address already exists".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => {
                    "Invalid reference to related resource".to_string()
                }
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Transient { .. } => {
                tracing::warn!("Transient storage error: {}", self);
            }
            Error::Unauthorized { .. } => {
                tracing::warn!("Authorization error: {}", self);
            }
            Error::ClassCancelled { .. }
            | Error::DuplicateBooking { .. }
            | Error::AlreadyCancelled { .. }
            | Error::Conflict { .. }
            | Error::Database(DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. }) => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::NotFound { .. }
            | Error::BadRequest { .. }
            | Error::InvalidMember { .. }
            | Error::InvalidInstructor { .. }
            | Error::Database(DbError::NotFound | DbError::CheckViolation { .. }) => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let user_message = self.user_message();
        (status, user_message).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                Error::NotFound {
                    resource: "User".to_string(),
                    id: "7".to_string(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                Error::InvalidMember {
                    member_id: 1,
                    reason: "membership is suspended".to_string(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                Error::InvalidInstructor { instructor_id: 2 },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                Error::ClassCancelled { class_id: 3 },
                StatusCode::CONFLICT,
            ),
            (
                Error::DuplicateBooking {
                    member_id: 1,
                    class_id: 3,
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::AlreadyCancelled { reservation_id: 9 },
                StatusCode::CONFLICT,
            ),
            (
                Error::Unauthorized {
                    message: "only admins may cancel classes".to_string(),
                },
                StatusCode::FORBIDDEN,
            ),
            (
                Error::BadRequest {
                    message: "capacity must be positive".to_string(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::Transient {
                    message: "pool timed out".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                Error::Other(anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status_code(), expected, "{error:?}");
        }
    }

    #[test]
    fn test_db_error_mapping() {
        assert_eq!(
            Error::Database(DbError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            Error::Database(DbError::UniqueViolation {
                constraint: Some("users.email".to_string()),
                message: "UNIQUE constraint failed: users.email".to_string(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(DbError::ForeignKeyViolation {
                message: "FOREIGN KEY constraint failed".to_string(),
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            Error::Database(DbError::CheckViolation {
                message: "CHECK constraint failed: capacity".to_string(),
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_unique_violation_user_message_names_email() {
        let error = Error::Database(DbError::UniqueViolation {
            constraint: Some("users.email".to_string()),
            message: "UNIQUE constraint failed: users.email".to_string(),
        });
        assert_eq!(
            error.user_message(),
            "A user with this email address already exists"
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = Error::Other(anyhow!("connection reset by peer"));
        assert_eq!(error.user_message(), "Internal server error");
    }
}
