use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::trimmed;
use crate::models::user;

/// Registration payload.
///
/// Fields are optional at the serde level so a missing field is reported
/// by validation alongside the others instead of failing deserialization.
/// Username and email are trimmed before any rule runs.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 3, max = 64, message = "Length must be between 3 and 64.")
    )]
    #[schema(value_type = String, min_length = 3, max_length = 64)]
    pub username: Option<String>,

    #[serde(default, deserialize_with = "trimmed")]
    #[validate(
        required(message = "Missing data for required field."),
        email(message = "Not a valid email address.")
    )]
    #[schema(value_type = String)]
    pub email: Option<String>,

    #[validate(
        required(message = "Missing data for required field."),
        length(min = 8, message = "Shorter than minimum length 8.")
    )]
    #[schema(value_type = String, min_length = 8)]
    pub password: Option<String>,
}

/// A registration payload that passed validation
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<CreateUser> for NewUser {
    fn from(req: CreateUser) -> Self {
        Self {
            username: req.username.unwrap_or_default(),
            email: req.email.unwrap_or_default().to_lowercase(),
            password: req.password.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(required(message = "Missing data for required field."))]
    #[schema(value_type = String)]
    pub username: Option<String>,

    #[validate(required(message = "Missing data for required field."))]
    #[schema(value_type = String)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
