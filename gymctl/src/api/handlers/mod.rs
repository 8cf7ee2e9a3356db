//! HTTP request handlers for all API endpoints.
//!
//! Handlers validate the request, run the business logic (directly against the
//! repositories in [`crate::db::handlers`] for plain CRUD, or through
//! [`crate::booking::BookingManager`] for anything that touches seat
//! accounting), and serialize the response.
//!
//! - [`users`]: user CRUD and membership management
//! - [`gym_classes`]: class CRUD, class cancellation, and per-class rosters
//! - [`reservations`]: booking and reservation cancellation
//!
//! Handlers return [`crate::errors::Error`], which converts to the
//! appropriate HTTP status code and a plain-text message.

pub mod gym_classes;
pub mod reservations;
pub mod users;
