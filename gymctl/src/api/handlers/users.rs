use crate::{
    AppState,
    api::models::users::{ListUsersQuery, Role, UserCreate, UserResponse, UserUpdate},
    db::{
        handlers::{Repository, UserFilter, Users},
        models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    },
    errors::Error,
    types::UserId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

// POST /users - Register an account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Register a member, instructor, or admin account. Membership status only \
                   applies to members: staff accounts store none, and members default to active.",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email already in use"),
        (status = 422, description = "Malformed request body"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(user_data): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), Error> {
    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = Users::new(&mut conn);

    let user = repo.create(&UserCreateDBRequest::from(user_data)).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

// GET /users - List accounts
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    description = "List accounts, newest first, optionally filtered by role",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = [UserResponse]),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, Error> {
    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);

    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = Users::new(&mut conn);

    let users = repo
        .list(&UserFilter {
            role: query.role,
            skip,
            limit,
        })
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

// GET /users/{id} - Get a single account
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(
        ("id" = i64, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(Error::transient)?;
    let mut repo = Users::new(&mut conn);

    let user = repo.get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

// PATCH /users/{id} - Update an account
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Partially update an account. The role is fixed at creation; membership \
                   status can only be changed on members.",
    params(
        ("id" = i64, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Membership status supplied for a non-member"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(user_data): Json<UserUpdate>,
) -> Result<Json<UserResponse>, Error> {
    let mut tx = state.db.begin().await.map_err(Error::transient)?;

    let existing = Users::new(&mut tx)
        .get_by_id(user_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: user_id.to_string(),
        })?;

    if user_data.membership_status.is_some() && existing.role != Role::Member {
        return Err(Error::BadRequest {
            message: "membership_status only applies to members".to_string(),
        });
    }

    let user = Users::new(&mut tx)
        .update(user_id, &UserUpdateDBRequest::new(user_data))
        .await?;

    tx.commit().await.map_err(Error::transient)?;
    Ok(Json(UserResponse::from(user)))
}
