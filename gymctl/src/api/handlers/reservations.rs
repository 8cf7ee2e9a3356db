use crate::{
    AppState,
    api::models::reservations::{
        ListReservationsQuery, ReservationCancel, ReservationCreate, ReservationResponse,
    },
    booking::BookingManager,
    db::handlers::{ReservationFilter, Reservations},
    errors::Error,
    types::ReservationId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

// POST /reservations - Book a class
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    summary = "Book a class",
    description = "Book a member into a class. The reservation comes back confirmed while \
                   seats remain and waitlisted once the class is full; a member can hold at \
                   most one open reservation per class.",
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 404, description = "Member or class not found"),
        (status = 409, description = "Class cancelled, or the member already holds an open reservation"),
        (status = 422, description = "User is not a member with an active membership"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<ReservationCreate>,
) -> Result<(StatusCode, Json<ReservationResponse>), Error> {
    let booking = BookingManager::new(state.db.clone(), state.class_locks.clone());
    let reservation = booking
        .create_reservation(request.member_id, request.class_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse::from(reservation))))
}

// GET /reservations - List reservations
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    summary = "List reservations",
    description = "List reservations in booking order, optionally filtered by class or member",
    params(ListReservationsQuery),
    responses(
        (status = 200, description = "List of reservations", body = [ReservationResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<Vec<ReservationResponse>>, Error> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);

    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = Reservations::new(&mut conn);

    let reservations = repo
        .list(&ReservationFilter {
            class_id: query.class_id,
            member_id: query.member_id,
            skip,
            limit,
        })
        .await?;

    Ok(Json(
        reservations.into_iter().map(ReservationResponse::from).collect(),
    ))
}

// GET /reservations/{id} - Get a single reservation
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    summary = "Get reservation",
    params(
        ("id" = i64, Path, description = "Reservation ID"),
    ),
    responses(
        (status = 200, description = "Reservation details", body = ReservationResponse),
        (status = 404, description = "Reservation not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<ReservationId>,
) -> Result<Json<ReservationResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = Reservations::new(&mut conn);

    let reservation = repo
        .get_by_id(reservation_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Reservation".to_string(),
            id: reservation_id.to_string(),
        })?;

    Ok(Json(ReservationResponse::from(reservation)))
}

// POST /reservations/{id}/cancel - Cancel a reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    summary = "Cancel reservation",
    description = "Cancel a reservation on behalf of its member or an admin. Freeing a \
                   confirmed seat promotes the longest-waiting waitlisted member, if any.",
    params(
        ("id" = i64, Path, description = "Reservation ID"),
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = ReservationResponse),
        (status = 403, description = "Acting user may not cancel this reservation"),
        (status = 404, description = "Reservation or acting user not found"),
        (status = 409, description = "Reservation is already cancelled"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Path(reservation_id): Path<ReservationId>,
    Json(request): Json<ReservationCancel>,
) -> Result<Json<ReservationResponse>, Error> {
    let booking = BookingManager::new(state.db.clone(), state.class_locks.clone());
    let reservation = booking
        .cancel_reservation(reservation_id, request.acting_user_id)
        .await?;
    Ok(Json(ReservationResponse::from(reservation)))
}
