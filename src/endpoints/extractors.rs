use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, FieldErrors};

/// JSON body that has been deserialized and validated.
///
/// Malformed JSON becomes a `_schema` message; failed field rules become
/// per-field messages. Both are answered as 400 with the validation body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid_body(rejection.body_text()))?;

        value.validate().map_err(field_errors)?;
        Ok(ValidatedJson(value))
    }
}

/// Typed path parameters.
///
/// A segment that does not parse (`/programs/abc` for an integer id) names
/// no resource, so it is answered like any other unknown path.
#[derive(Debug, Clone, Copy)]
pub struct ResourcePath<T>(pub T);

impl<T, S> FromRequestParts<S> for ResourcePath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Unmatched path parameters: {}", rejection.body_text());
                AppError::RouteNotFound
            })?;

        Ok(ResourcePath(value))
    }
}

/// Convert validator output into per-field messages
pub fn field_errors(errors: ValidationErrors) -> AppError {
    let fields: FieldErrors = errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| (field.to_string(), errs.iter().map(message_for).collect()))
        .collect();

    AppError::Validation(fields)
}

fn message_for(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => match error.code.as_ref() {
            "required" => "Missing data for required field.".to_string(),
            "email" => "Not a valid email address.".to_string(),
            code => format!("Invalid value ({}).", code),
        },
    }
}
