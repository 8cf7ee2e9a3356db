//! API request and response models.
//!
//! These types define the JSON wire format of the admin API. They are kept
//! separate from the database records in [`crate::db::models`]; each response
//! type implements `From` for its database counterpart.
//!
//! # Modules
//!
//! - [`users`]: member, instructor, and admin accounts
//! - [`gym_classes`]: the class catalogue with capacity and schedule
//! - [`reservations`]: bookings, waitlist entries, and cancellations

pub mod gym_classes;
pub mod reservations;
pub mod users;
