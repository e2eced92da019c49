/*
 * Responsibility
 * - /actors CRUD handlers
 * - Every handler enforces its permission first; body/path rejections come after
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};

use crate::{
    api::v1::dto::actors::{ActorResponse, CreateActorRequest, UpdateActorRequest},
    error::AppError,
    repos::actor_repo,
    services::auth::Permission,
    state::AppState,
};

pub async fn list_actors(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ActorResponse>>, AppError> {
    state
        .auth
        .enforce(Permission::ViewActor, headers.get(AUTHORIZATION))
        .await?;

    let rows = actor_repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(ActorResponse::from).collect()))
}

pub async fn create_actor(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateActorRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ActorResponse>), AppError> {
    let principal = state
        .auth
        .enforce(Permission::PostActor, headers.get(AUTHORIZATION))
        .await?;

    let Json(req) = body?;
    req.validate()
        .map_err(|msg| AppError::bad_request("invalid_request", msg))?;

    let row = actor_repo::create(&state.db, req.name.trim(), req.age, req.gender.trim()).await?;
    tracing::info!(actor_id = row.id, sub = %principal.subject, "actor created");

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_actor(
    State(state): State<AppState>,
    headers: HeaderMap,
    actor_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateActorRequest>, JsonRejection>,
) -> Result<Json<ActorResponse>, AppError> {
    state
        .auth
        .enforce(Permission::PatchActor, headers.get(AUTHORIZATION))
        .await?;

    let Path(actor_id) = actor_id?;
    let Json(req) = body?;
    req.validate()
        .map_err(|msg| AppError::bad_request("invalid_request", msg))?;

    let row = actor_repo::update(
        &state.db,
        actor_id,
        req.name.as_deref().map(str::trim),
        req.age,
        req.gender.as_deref().map(str::trim),
    )
    .await?
    .ok_or(AppError::not_found("actor"))?;

    Ok(Json(row.into()))
}

pub async fn delete_actor(
    State(state): State<AppState>,
    headers: HeaderMap,
    actor_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let principal = state
        .auth
        .enforce(Permission::DeleteActor, headers.get(AUTHORIZATION))
        .await?;

    let Path(actor_id) = actor_id?;

    if actor_repo::delete(&state.db, actor_id).await? {
        tracing::info!(actor_id, sub = %principal.subject, "actor deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("actor"))
    }
}
