use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use utoipa::OpenApi;

use crate::application::blueprint::Blueprint;
use crate::endpoints::extractors::{ResourcePath, ValidatedJson};
use crate::application::database::DbConn;
use crate::error::{is_unique_violation, DomainError, ErrorMessage, Result, ValidationErrorBody};
use crate::models::prelude::*;
use crate::models::user;
use crate::schemas::{CreateUser, LoginRequest, NewUser, UserResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, get_user, login),
    components(schemas(CreateUser, LoginRequest, UserResponse)),
    tags((name = "User", description = "Registration, lookup and login of users"))
)]
pub struct UserApi;

/// The `user` blueprint, mounted at `/users`
pub fn blueprint(state: AppState) -> Blueprint {
    Blueprint::new("user", "/users", users_routes(state), UserApi::openapi())
}

/// Create users routes
pub fn users_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/login", post(login))
        .route("/{user_id}", get(get_user))
        .with_state(state)
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "User",
    responses((status = 200, description = "All users, oldest first", body = [UserResponse]))
)]
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>> {
    let users = User::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "User",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request body", body = ValidationErrorBody),
        (status = 409, description = "Username or email already taken", body = ErrorMessage)
    )
)]
async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let new_user = NewUser::from(request);

    let username_taken = User::find()
        .filter(user::Column::Username.eq(&new_user.username))
        .one(&state.db)
        .await?
        .is_some();
    if username_taken {
        return Err(DomainError::UsernameTaken(new_user.username).into());
    }

    let email_taken = User::find()
        .filter(user::Column::Email.eq(&new_user.email))
        .one(&state.db)
        .await?
        .is_some();
    if email_taken {
        return Err(DomainError::EmailTaken(new_user.email).into());
    }

    let hashed_password = state.hasher.hash_password(&new_user.password)?;
    let created = store_user(&state.db, new_user, hashed_password).await?;

    tracing::info!(user_id = created.id, "Registered user {}", created.username);

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Insert the user row.
///
/// A concurrent registration can pass the lookups above and still lose the
/// insert to the UNIQUE constraints; that is reported as the same conflict.
async fn store_user(db: &DbConn, new_user: NewUser, hashed_password: String) -> Result<user::Model> {
    let now = Utc::now();
    let inserted = user::ActiveModel {
        username: Set(new_user.username.clone()),
        email: Set(new_user.email.clone()),
        hashed_password: Set(hashed_password),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await;

    match inserted {
        Ok(created) => Ok(created),
        Err(e) if is_unique_violation(&e) => {
            let username_taken = User::find()
                .filter(user::Column::Username.eq(&new_user.username))
                .one(db)
                .await?
                .is_some();
            if username_taken {
                Err(DomainError::UsernameTaken(new_user.username).into())
            } else {
                Err(DomainError::EmailTaken(new_user.email).into())
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Get a single user
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "User",
    params(("user_id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "No such user", body = ErrorMessage)
    )
)]
async fn get_user(
    State(state): State<AppState>,
    ResourcePath(user_id): ResourcePath<i64>,
) -> Result<Json<UserResponse>> {
    let found = User::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or(DomainError::UserNotFound(user_id))?;

    Ok(Json(found.into()))
}

/// Check a username/password pair
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "User",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserResponse),
        (status = 400, description = "Invalid request body", body = ValidationErrorBody),
        (status = 401, description = "Invalid username or password", body = ErrorMessage)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<UserResponse>> {
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    let found = User::find()
        .filter(user::Column::Username.eq(username.trim()))
        .one(&state.db)
        .await?;

    match found {
        Some(u) if state.hasher.verify_password(&password, &u.hashed_password) => {
            tracing::debug!(user_id = u.id, "Login succeeded");
            Ok(Json(u.into()))
        }
        _ => {
            tracing::debug!("Login failed for {}", username);
            Err(DomainError::InvalidCredentials.into())
        }
    }
}
