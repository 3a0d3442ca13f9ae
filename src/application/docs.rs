//! API documentation publisher
//!
//! Merges the OpenAPI fragments of the registered blueprints into one
//! document and serves it as JSON.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use utoipa::openapi::OpenApi as OpenApiDoc;
use utoipa::OpenApi;

use crate::error::{ErrorMessage, ValidationErrorBody};

/// Path the merged document is served at
pub const API_DOC_PATH: &str = "/swagger";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bug Bounty API",
        description = "Bug bounty programs and the users who own them"
    ),
    components(schemas(ErrorMessage, ValidationErrorBody))
)]
pub struct ApiDoc;

/// Build the document for one application.
///
/// Only fragments passed in are merged, so an unregistered blueprint never
/// shows up in the published document.
pub fn build_api_doc(version: &str, fragments: impl IntoIterator<Item = OpenApiDoc>) -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    doc.info.version = version.to_string();

    for fragment in fragments {
        doc.merge(fragment);
    }

    doc
}

pub fn api_doc_routes(doc: OpenApiDoc) -> Router {
    Router::new()
        .route(API_DOC_PATH, get(serve_api_doc))
        .with_state(Arc::new(doc))
}

async fn serve_api_doc(State(doc): State<Arc<OpenApiDoc>>) -> Json<OpenApiDoc> {
    Json(doc.as_ref().clone())
}
