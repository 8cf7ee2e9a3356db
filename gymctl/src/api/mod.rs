//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! The API is divided into three functional areas, all nested under
//! `/admin/api/v1`:
//!
//! - **Users** (`/users/*`): member, instructor, and admin accounts
//! - **Classes** (`/classes/*`): the class catalogue and class cancellation
//! - **Reservations** (`/reservations/*`): bookings, waitlisting, and
//!   reservation cancellation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`;
//! the rendered documentation is served at `/admin/docs`.

pub mod handlers;
pub mod models;
