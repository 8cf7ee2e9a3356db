//! Database record structures matching table schemas.
//!
//! Each entity has up to three shapes: a `*CreateDBRequest` for inserts, a
//! `*UpdateDBRequest` for partial updates, and a `*DBResponse` mirroring the
//! stored row. Conversions from the API models live here so that API-level
//! defaults (like a member's implicit `active` standing) are applied in one
//! place.

pub mod gym_classes;
pub mod reservations;
pub mod users;
