//! OpenAPI documentation for the admin API.
//!
//! The rendered document is served at `/api-docs/openapi.json` and browsable
//! at `/admin/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/admin/api/v1", description = "Admin API server")
    ),
    paths(
        api::handlers::users::create_user,
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::gym_classes::create_class,
        api::handlers::gym_classes::list_classes,
        api::handlers::gym_classes::get_class,
        api::handlers::gym_classes::update_class,
        api::handlers::gym_classes::cancel_class,
        api::handlers::gym_classes::list_class_reservations,
        api::handlers::reservations::create_reservation,
        api::handlers::reservations::list_reservations,
        api::handlers::reservations::get_reservation,
        api::handlers::reservations::cancel_reservation,
    ),
    components(
        schemas(
            api::models::users::Role,
            api::models::users::MembershipStatus,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::gym_classes::GymClassCreate,
            api::models::gym_classes::GymClassUpdate,
            api::models::gym_classes::GymClassCancel,
            api::models::gym_classes::GymClassResponse,
            api::models::reservations::ReservationStatus,
            api::models::reservations::ReservationCreate,
            api::models::reservations::ReservationCancel,
            api::models::reservations::ReservationResponse,
        )
    ),
    tags(
        (name = "users", description = "Member, instructor, and admin accounts"),
        (name = "classes", description = "The class catalogue: scheduling, capacity, and cancellation"),
        (name = "reservations", description = "Bookings, the waitlist, and reservation cancellation"),
    )
)]
pub struct ApiDoc;
