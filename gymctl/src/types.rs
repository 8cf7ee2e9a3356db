//! Common type definitions shared across the database and API layers.
//!
//! All entity IDs are SQLite rowids (`i64`) wrapped in type aliases:
//!
//! - [`UserId`]: user account identifier (members, instructors, admins)
//! - [`ClassId`]: scheduled gym class identifier
//! - [`ReservationId`]: reservation ledger entry identifier

pub type UserId = i64;
pub type ClassId = i64;
pub type ReservationId = i64;
