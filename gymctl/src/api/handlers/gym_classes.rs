use crate::{
    AppState,
    api::models::{
        gym_classes::{
            GymClassCancel, GymClassCreate, GymClassResponse, GymClassUpdate, ListGymClassesQuery,
        },
        reservations::{ListReservationsQuery, ReservationResponse},
        users::Role,
    },
    booking::BookingManager,
    db::{
        handlers::{GymClassFilter, GymClasses, Repository, ReservationFilter, Reservations, Users},
        models::gym_classes::{GymClassCreateDBRequest, GymClassUpdateDBRequest},
    },
    errors::Error,
    types::ClassId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

// POST /classes - Schedule a class
#[utoipa::path(
    post,
    path = "/classes",
    tag = "classes",
    summary = "Create gym class",
    description = "Schedule a class taught by an existing instructor. Capacity must be \
                   positive and the start time must precede the end time.",
    responses(
        (status = 201, description = "Class created", body = GymClassResponse),
        (status = 400, description = "Invalid capacity or time window"),
        (status = 422, description = "instructor_id does not reference an instructor"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_class(
    State(state): State<AppState>,
    Json(request): Json<GymClassCreate>,
) -> Result<(StatusCode, Json<GymClassResponse>), Error> {
    if request.capacity <= 0 {
        return Err(Error::BadRequest {
            message: "capacity must be positive".to_string(),
        });
    }
    if request.start_time >= request.end_time {
        return Err(Error::BadRequest {
            message: "start_time must be before end_time".to_string(),
        });
    }

    let mut tx = state.db.begin().await.map_err(Error::transient)?;

    match Users::new(&mut tx).get_by_id(request.instructor_id).await? {
        Some(user) if user.role == Role::Instructor => {}
        _ => {
            return Err(Error::InvalidInstructor {
                instructor_id: request.instructor_id,
            });
        }
    }

    let class = GymClasses::new(&mut tx)
        .create(&GymClassCreateDBRequest::from(request))
        .await?;

    tx.commit().await.map_err(Error::transient)?;
    Ok((StatusCode::CREATED, Json(GymClassResponse::from(class))))
}

// GET /classes - List classes
#[utoipa::path(
    get,
    path = "/classes",
    tag = "classes",
    summary = "List gym classes",
    description = "List classes ordered by start time",
    params(ListGymClassesQuery),
    responses(
        (status = 200, description = "List of classes", body = [GymClassResponse]),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_classes(
    State(state): State<AppState>,
    Query(query): Query<ListGymClassesQuery>,
) -> Result<Json<Vec<GymClassResponse>>, Error> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);

    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = GymClasses::new(&mut conn);

    let classes = repo.list(&GymClassFilter { skip, limit }).await?;
    Ok(Json(classes.into_iter().map(GymClassResponse::from).collect()))
}

// GET /classes/{id} - Get a single class
#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "classes",
    summary = "Get gym class",
    params(
        ("id" = i64, Path, description = "Class ID"),
    ),
    responses(
        (status = 200, description = "Class details", body = GymClassResponse),
        (status = 404, description = "Class not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
) -> Result<Json<GymClassResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = GymClasses::new(&mut conn);

    let class = repo.get_by_id(class_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Class".to_string(),
        id: class_id.to_string(),
    })?;

    Ok(Json(GymClassResponse::from(class)))
}

// PATCH /classes/{id} - Update a class
#[utoipa::path(
    patch,
    path = "/classes/{id}",
    tag = "classes",
    summary = "Update gym class",
    description = "Partially update a class. Capacity may grow freely but can never shrink \
                   below the seats already taken; the booking counter and cancellation flag \
                   are not editable.",
    params(
        ("id" = i64, Path, description = "Class ID"),
    ),
    responses(
        (status = 200, description = "Class updated", body = GymClassResponse),
        (status = 400, description = "Invalid capacity or time window"),
        (status = 404, description = "Class not found"),
        (status = 422, description = "instructor_id does not reference an instructor"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn update_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Json(request): Json<GymClassUpdate>,
) -> Result<Json<GymClassResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(Error::transient)?;

    let existing = GymClasses::new(&mut tx)
        .get_by_id(class_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Class".to_string(),
            id: class_id.to_string(),
        })?;

    if let Some(capacity) = request.capacity {
        if capacity <= 0 {
            return Err(Error::BadRequest {
                message: "capacity must be positive".to_string(),
            });
        }
        if capacity < existing.current_bookings {
            return Err(Error::BadRequest {
                message: format!(
                    "capacity {capacity} is below the {} seats already taken",
                    existing.current_bookings
                ),
            });
        }
    }

    // Cross-field check uses the stored value for whichever side is absent.
    let start = request.start_time.unwrap_or(existing.start_time);
    let end = request.end_time.unwrap_or(existing.end_time);
    if start >= end {
        return Err(Error::BadRequest {
            message: "start_time must be before end_time".to_string(),
        });
    }

    if let Some(instructor_id) = request.instructor_id {
        match Users::new(&mut tx).get_by_id(instructor_id).await? {
            Some(user) if user.role == Role::Instructor => {}
            _ => return Err(Error::InvalidInstructor { instructor_id }),
        }
    }

    let class = GymClasses::new(&mut tx)
        .update(class_id, &GymClassUpdateDBRequest::new(request))
        .await?;

    tx.commit().await.map_err(Error::transient)?;
    Ok(Json(GymClassResponse::from(class)))
}

// POST /classes/{id}/cancel - Cancel a class
#[utoipa::path(
    post,
    path = "/classes/{id}/cancel",
    tag = "classes",
    summary = "Cancel gym class",
    description = "Cancel a class and close every confirmed or waitlisted reservation for \
                   it. Only admins may do this; cancelling an already-cancelled class is a \
                   no-op.",
    params(
        ("id" = i64, Path, description = "Class ID"),
    ),
    responses(
        (status = 200, description = "Class cancelled", body = GymClassResponse),
        (status = 403, description = "Acting user is not an admin"),
        (status = 404, description = "Class or acting user not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn cancel_class(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Json(request): Json<GymClassCancel>,
) -> Result<Json<GymClassResponse>, Error> {
    // The role gate lives here; the booking core trusts its caller.
    {
        let mut conn = state.db.acquire().await.map_err(Error::transient)?;
        let acting = Users::new(&mut conn)
            .get_by_id(request.acting_user_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "User".to_string(),
                id: request.acting_user_id.to_string(),
            })?;
        if acting.role != Role::Admin {
            return Err(Error::Unauthorized {
                message: "only admins may cancel classes".to_string(),
            });
        }
    }

    let booking = BookingManager::new(state.db.clone(), state.class_locks.clone());
    let class = booking.cancel_class(class_id).await?;
    Ok(Json(GymClassResponse::from(class)))
}

// GET /classes/{id}/reservations - Reservations for one class
#[utoipa::path(
    get,
    path = "/classes/{id}/reservations",
    tag = "classes",
    summary = "List reservations for a class",
    description = "Reservations for one class in booking order, including cancelled ones",
    params(
        ("id" = i64, Path, description = "Class ID"),
        ("member_id" = Option<i64>, Query, description = "Only reservations made by this member"),
        ("skip" = Option<i64>, Query, description = "Number of reservations to skip"),
        ("limit" = Option<i64>, Query, description = "Maximum number of reservations to return"),
    ),
    responses(
        (status = 200, description = "Reservations for the class", body = [ReservationResponse]),
        (status = 404, description = "Class not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_class_reservations(
    State(state): State<AppState>,
    Path(class_id): Path<ClassId>,
    Query(query): Query<ListReservationsQuery>,
) -> Result<Json<Vec<ReservationResponse>>, Error> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);

    let mut tx = state.db.begin().await.map_err(Error::transient)?;

    GymClasses::new(&mut tx)
        .get_by_id(class_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Class".to_string(),
            id: class_id.to_string(),
        })?;

    // The path segment always wins over a class_id query parameter.
    let reservations = Reservations::new(&mut tx)
        .list(&ReservationFilter {
            class_id: Some(class_id),
            member_id: query.member_id,
            skip,
            limit,
        })
        .await?;

    tx.commit().await.map_err(Error::transient)?;
    Ok(Json(
        reservations.into_iter().map(ReservationResponse::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use crate::api::models::gym_classes::GymClassResponse;
    use crate::api::models::reservations::ReservationResponse;
    use crate::db::test_fixtures::{seed_admin, seed_class, seed_instructor, seed_member};
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_class(pool: SqlitePool) {
        let instructor = seed_instructor(&pool).await;
        let app = create_test_app(pool).await;

        let start = Utc::now() + Duration::hours(1);
        let response = app
            .post("/admin/api/v1/classes")
            .json(&json!({
                "name": "Morning Yoga",
                "instructor_id": instructor.id,
                "start_time": start,
                "end_time": start + Duration::hours(1),
                "capacity": 10,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: GymClassResponse = response.json();
        assert_eq!(created.current_bookings, 0);
        assert!(!created.is_cancelled);

        let response = app.get(&format!("/admin/api/v1/classes/{}", created.id)).await;
        response.assert_status_ok();
        let fetched: GymClassResponse = response.json();
        assert_eq!(fetched.name, "Morning Yoga");

        app.get("/admin/api/v1/classes/424242").await.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_class_validations(pool: SqlitePool) {
        let instructor = seed_instructor(&pool).await;
        let member = seed_member(&pool).await;
        let app = create_test_app(pool).await;

        let start = Utc::now() + Duration::hours(1);
        let end = start + Duration::hours(1);

        let response = app
            .post("/admin/api/v1/classes")
            .json(&json!({
                "name": "Zero Seats",
                "instructor_id": instructor.id,
                "start_time": start,
                "end_time": end,
                "capacity": 0,
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = app
            .post("/admin/api/v1/classes")
            .json(&json!({
                "name": "Ends Before It Starts",
                "instructor_id": instructor.id,
                "start_time": end,
                "end_time": start,
                "capacity": 10,
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        // A member cannot be the instructor, and neither can a missing user.
        let response = app
            .post("/admin/api/v1/classes")
            .json(&json!({
                "name": "Member Taught",
                "instructor_id": member.id,
                "start_time": start,
                "end_time": end,
                "capacity": 10,
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .post("/admin/api/v1/classes")
            .json(&json!({
                "name": "Ghost Taught",
                "instructor_id": 424242,
                "start_time": start,
                "end_time": end,
                "capacity": 10,
            }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_classes_ordered_by_start_time(pool: SqlitePool) {
        let instructor = seed_instructor(&pool).await;
        let later = seed_class(&pool, instructor.id, 10).await;
        let app = create_test_app(pool.clone()).await;

        // Second class starts before the fixture's default (+1h).
        let start = Utc::now() + Duration::minutes(10);
        let response = app
            .post("/admin/api/v1/classes")
            .json(&json!({
                "name": "Early Bird",
                "instructor_id": instructor.id,
                "start_time": start,
                "end_time": start + Duration::hours(1),
                "capacity": 5,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let earlier: GymClassResponse = response.json();

        let response = app.get("/admin/api/v1/classes").await;
        response.assert_status_ok();
        let listed: Vec<GymClassResponse> = response.json();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, earlier.id);
        assert_eq!(listed[1].id, later.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_class(pool: SqlitePool) {
        let instructor = seed_instructor(&pool).await;
        let member = seed_member(&pool).await;
        let class = seed_class(&pool, instructor.id, 2).await;
        let app = create_test_app(pool).await;

        let response = app
            .patch(&format!("/admin/api/v1/classes/{}", class.id))
            .json(&json!({ "name": "Renamed", "capacity": 5 }))
            .await;
        response.assert_status_ok();
        let updated: GymClassResponse = response.json();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.capacity, 5);

        // One seat taken; capacity cannot shrink below it.
        app.post("/admin/api/v1/reservations")
            .json(&json!({ "member_id": member.id, "class_id": class.id }))
            .await
            .assert_status(StatusCode::CREATED);
        let response = app
            .patch(&format!("/admin/api/v1/classes/{}", class.id))
            .json(&json!({ "capacity": 0 }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = app
            .patch(&format!("/admin/api/v1/classes/{}", class.id))
            .json(&json!({ "instructor_id": member.id }))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let response = app
            .patch("/admin/api/v1/classes/424242")
            .json(&json!({ "name": "Ghost" }))
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cancel_class_role_gate(pool: SqlitePool) {
        let instructor = seed_instructor(&pool).await;
        let member = seed_member(&pool).await;
        let admin = seed_admin(&pool).await;
        let class = seed_class(&pool, instructor.id, 2).await;
        let app = create_test_app(pool).await;

        let path = format!("/admin/api/v1/classes/{}/cancel", class.id);

        let response = app.post(&path).json(&json!({ "acting_user_id": member.id })).await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = app.post(&path).json(&json!({ "acting_user_id": 424242 })).await;
        response.assert_status_not_found();

        let response = app.post(&path).json(&json!({ "acting_user_id": admin.id })).await;
        response.assert_status_ok();
        let cancelled: GymClassResponse = response.json();
        assert!(cancelled.is_cancelled);
        assert_eq!(cancelled.current_bookings, 0);

        // Idempotent: a second cancel still returns the class.
        let response = app.post(&path).json(&json!({ "acting_user_id": admin.id })).await;
        response.assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_class_reservations(pool: SqlitePool) {
        let instructor = seed_instructor(&pool).await;
        let alice = seed_member(&pool).await;
        let bob = seed_member(&pool).await;
        let class = seed_class(&pool, instructor.id, 5).await;
        let app = create_test_app(pool).await;

        for member_id in [alice.id, bob.id] {
            app.post("/admin/api/v1/reservations")
                .json(&json!({ "member_id": member_id, "class_id": class.id }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = app.get(&format!("/admin/api/v1/classes/{}/reservations", class.id)).await;
        response.assert_status_ok();
        let all: Vec<ReservationResponse> = response.json();
        assert_eq!(all.len(), 2);

        let response = app
            .get(&format!(
                "/admin/api/v1/classes/{}/reservations?member_id={}",
                class.id, alice.id
            ))
            .await;
        response.assert_status_ok();
        let alices: Vec<ReservationResponse> = response.json();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].member_id, alice.id);

        app.get("/admin/api/v1/classes/424242/reservations")
            .await
            .assert_status_not_found();
    }
}
