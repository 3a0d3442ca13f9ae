use std::collections::BTreeMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Message returned for any path no blueprint serves.
pub const NOT_FOUND_MESSAGE: &str = "API not found";

/// Message returned when a route exists but not for the request method.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// Message returned for any request body that fails validation.
pub const VALIDATION_MESSAGE: &str = "wrong or missing request property";

/// Key under which body-level (not field-level) validation messages are reported.
pub const SCHEMA_KEY: &str = "_schema";

/// Per-field validation messages: field name -> messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors raised on purpose by program/user business logic.
///
/// Each variant knows its own status code and JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Program {0} not found")]
    ProgramNotFound(i64),

    #[error("User {0} not found")]
    UserNotFound(i64),

    #[error("Program name '{0}' is already taken")]
    ProgramNameTaken(String),

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Email '{0}' is already registered")]
    EmailTaken(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("reward_min ({min}) must not exceed reward_max ({max})")]
    InvalidRewardRange { min: i32, max: i32 },
}

impl DomainError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DomainError::ProgramNotFound(_) | DomainError::UserNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::ProgramNameTaken(_)
            | DomainError::UsernameTaken(_)
            | DomainError::EmailTaken(_) => StatusCode::CONFLICT,
            DomainError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            DomainError::InvalidRewardRange { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "message": self.to_string() })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("API not found")]
    RouteNotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

impl AppError {
    /// Validation failure that is not tied to a single field
    pub fn invalid_body(message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(SCHEMA_KEY.to_string(), vec![message.into()]);
        AppError::Validation(fields)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::RouteNotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            // Raised for the framework's 422 rejections, answered as 400.
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Domain(e) => e.status_code(),
            AppError::Config(_)
            | AppError::Internal(_)
            | AppError::Database(_)
            | AppError::Bcrypt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body shape shared by every non-validation error response
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorMessage {
    pub message: String,
}

/// Body returned for a request that fails validation
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ValidationErrorBody {
    pub message: String,
    /// Messages keyed by request location, then by field
    #[schema(value_type = Object)]
    pub fields: BTreeMap<String, FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::RouteNotFound => json!({ "message": NOT_FOUND_MESSAGE }),
            AppError::MethodNotAllowed => json!({ "message": METHOD_NOT_ALLOWED_MESSAGE }),
            AppError::Validation(fields) => {
                let mut by_location = BTreeMap::new();
                by_location.insert("json".to_string(), fields);
                let body = ValidationErrorBody {
                    message: VALIDATION_MESSAGE.to_string(),
                    fields: by_location,
                };
                return (status, Json(body)).into_response();
            }
            AppError::Domain(e) => e.to_json(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                json!({ "message": "Internal server error" })
            }
            AppError::Bcrypt(e) => {
                tracing::error!("Bcrypt error: {}", e);
                json!({ "message": "Internal server error" })
            }
            AppError::Config(msg) | AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                json!({ "message": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// True when the database refused a write because of a UNIQUE constraint
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Fallback for paths no blueprint matches
pub async fn not_found_handler() -> AppError {
    AppError::RouteNotFound
}

/// Gives framework-generated error responses the JSON bodies handlers use.
///
/// Installed with `middleware::map_response` around every blueprint.
pub async fn json_error_bodies(response: Response) -> Response {
    match response.status() {
        StatusCode::UNPROCESSABLE_ENTITY => unprocessable_as_bad_request(response).await,
        StatusCode::METHOD_NOT_ALLOWED => method_not_allowed(response),
        _ => response,
    }
}

/// Rewrites any 422 produced by a framework extractor into the 400
/// validation body.
///
/// Handlers here use `ValidatedJson`, which never answers 422. This catches
/// framework extractors used without that wrapper.
pub async fn unprocessable_as_bad_request(response: Response) -> Response {
    if response.status() != StatusCode::UNPROCESSABLE_ENTITY {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    let bytes = match axum::body::to_bytes(response.into_body(), 64 * 1024).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Failed to read rejected request body: {}", e);
            return AppError::invalid_body("Invalid request body").into_response();
        }
    };

    let detail = if is_json {
        serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| String::from_utf8_lossy(&bytes).into_owned())
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    AppError::invalid_body(detail).into_response()
}

/// Replace the empty 405 body, keeping `Allow` and any CORS headers.
fn method_not_allowed(response: Response) -> Response {
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);

    let mut rewritten = AppError::MethodNotAllowed.into_response();
    rewritten.headers_mut().extend(parts.headers);
    rewritten
}
