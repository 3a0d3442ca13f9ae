use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set};
use utoipa::OpenApi;

use crate::application::blueprint::Blueprint;
use crate::endpoints::extractors::{ResourcePath, ValidatedJson};
use crate::application::database::DbConn;
use crate::error::{is_unique_violation, AppError, DomainError, ErrorMessage, Result, ValidationErrorBody};
use crate::models::prelude::*;
use crate::models::program;
use crate::schemas::{CreateProgram, NewProgram, ProgramResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_programs, create_program, get_program, delete_program),
    components(schemas(CreateProgram, ProgramResponse)),
    tags((name = "Program", description = "Bug bounty programs"))
)]
pub struct ProgramApi;

/// The `program` blueprint, mounted at `/programs`
pub fn blueprint(state: AppState) -> Blueprint {
    Blueprint::new("program", "/programs", programs_routes(state), ProgramApi::openapi())
}

/// Create programs routes
pub fn programs_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_programs).post(create_program))
        .route("/{program_id}", get(get_program).delete(delete_program))
        .with_state(state)
}

/// List all programs
#[utoipa::path(
    get,
    path = "/programs",
    tag = "Program",
    responses((status = 200, description = "All programs, oldest first", body = [ProgramResponse]))
)]
async fn list_programs(State(state): State<AppState>) -> Result<Json<Vec<ProgramResponse>>> {
    let programs = Program::find()
        .order_by_asc(program::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(programs.into_iter().map(ProgramResponse::from).collect()))
}

/// Create a program owned by an existing user
#[utoipa::path(
    post,
    path = "/programs",
    tag = "Program",
    request_body = CreateProgram,
    responses(
        (status = 201, description = "Program created", body = ProgramResponse),
        (status = 400, description = "Invalid request body or reward range", body = ValidationErrorBody),
        (status = 404, description = "Owner does not exist", body = ErrorMessage),
        (status = 409, description = "Program name already taken", body = ErrorMessage)
    )
)]
async fn create_program(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateProgram>,
) -> Result<(StatusCode, Json<ProgramResponse>)> {
    let new_program = NewProgram::try_from(request)?;

    if User::find_by_id(new_program.owner_id)
        .one(&state.db)
        .await?
        .is_none()
    {
        return Err(DomainError::UserNotFound(new_program.owner_id).into());
    }

    let name_taken = Program::find()
        .filter(program::Column::Name.eq(&new_program.name))
        .one(&state.db)
        .await?
        .is_some();
    if name_taken {
        return Err(DomainError::ProgramNameTaken(new_program.name).into());
    }

    let created = store_program(&state.db, new_program).await?;

    tracing::info!(
        program_id = created.id,
        owner_id = created.owner_id,
        "Created program {}",
        created.name
    );

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Insert the program row, reporting a lost race on the name as a conflict
async fn store_program(db: &DbConn, new_program: NewProgram) -> Result<program::Model> {
    let now = Utc::now();
    let name = new_program.name.clone();

    program::ActiveModel {
        name: Set(new_program.name),
        description: Set(new_program.description),
        reward_min: Set(new_program.reward_min),
        reward_max: Set(new_program.reward_max),
        is_active: Set(true),
        owner_id: Set(new_program.owner_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::from(DomainError::ProgramNameTaken(name))
        } else {
            AppError::from(e)
        }
    })
}

/// Get a single program
#[utoipa::path(
    get,
    path = "/programs/{program_id}",
    tag = "Program",
    params(("program_id" = i64, Path, description = "Program id")),
    responses(
        (status = 200, description = "The program", body = ProgramResponse),
        (status = 404, description = "No such program", body = ErrorMessage)
    )
)]
async fn get_program(
    State(state): State<AppState>,
    ResourcePath(program_id): ResourcePath<i64>,
) -> Result<Json<ProgramResponse>> {
    let found = Program::find_by_id(program_id)
        .one(&state.db)
        .await?
        .ok_or(DomainError::ProgramNotFound(program_id))?;

    Ok(Json(found.into()))
}

/// Delete a program
#[utoipa::path(
    delete,
    path = "/programs/{program_id}",
    tag = "Program",
    params(("program_id" = i64, Path, description = "Program id")),
    responses(
        (status = 204, description = "Program deleted"),
        (status = 404, description = "No such program", body = ErrorMessage)
    )
)]
async fn delete_program(
    State(state): State<AppState>,
    ResourcePath(program_id): ResourcePath<i64>,
) -> Result<StatusCode> {
    let found = Program::find_by_id(program_id)
        .one(&state.db)
        .await?
        .ok_or(DomainError::ProgramNotFound(program_id))?;

    found.delete(&state.db).await?;
    tracing::info!(program_id, "Deleted program");

    Ok(StatusCode::NO_CONTENT)
}
