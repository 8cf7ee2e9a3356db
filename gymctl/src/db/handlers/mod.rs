//! Repositories over the SQLite store.
//!
//! Each repository borrows a `&mut SqliteConnection`, so the caller decides
//! the transaction boundary and several repositories can compose into one
//! atomic unit of work.

pub mod capacity;
pub mod gym_classes;
pub mod repository;
pub mod reservations;
pub mod users;

pub use capacity::CapacityLedger;
pub use gym_classes::{GymClassFilter, GymClasses};
pub use repository::Repository;
pub use reservations::{ReservationFilter, Reservations};
pub use users::{UserFilter, Users};
