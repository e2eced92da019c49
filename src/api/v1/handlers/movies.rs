/*
 * Responsibility
 * - /movies CRUD handlers
 * - Cast membership (/movies/{movie_id}/actors) reads with view:movie, edits with patch:movie
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
    api::v1::dto::{
        actors::ActorResponse,
        movies::{CreateMovieRequest, MovieResponse, UpdateMovieRequest},
    },
    error::AppError,
    repos::{actor_repo, movie_repo},
    services::auth::Permission,
    state::AppState,
};

pub async fn list_movies(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<MovieResponse>>, AppError> {
    state
        .auth
        .enforce(Permission::ViewMovie, headers.get(AUTHORIZATION))
        .await?;

    let rows = movie_repo::list(&state.db).await?;
    Ok(Json(rows.into_iter().map(MovieResponse::from).collect()))
}

pub async fn create_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateMovieRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MovieResponse>), AppError> {
    let principal = state
        .auth
        .enforce(Permission::PostMovie, headers.get(AUTHORIZATION))
        .await?;

    let Json(req) = body?;
    req.validate()
        .map_err(|msg| AppError::bad_request("invalid_request", msg))?;

    let row = movie_repo::create(&state.db, req.title.trim(), req.release_date).await?;
    tracing::info!(movie_id = row.id, sub = %principal.subject, "movie created");

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn update_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    movie_id: Result<Path<i64>, PathRejection>,
    body: Result<Json<UpdateMovieRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, AppError> {
    state
        .auth
        .enforce(Permission::PatchMovie, headers.get(AUTHORIZATION))
        .await?;

    let Path(movie_id) = movie_id?;
    let Json(req) = body?;
    req.validate()
        .map_err(|msg| AppError::bad_request("invalid_request", msg))?;

    let row = movie_repo::update(
        &state.db,
        movie_id,
        req.title.as_deref().map(str::trim),
        req.release_date,
    )
    .await?
    .ok_or(AppError::not_found("movie"))?;

    Ok(Json(row.into()))
}

pub async fn delete_movie(
    State(state): State<AppState>,
    headers: HeaderMap,
    movie_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let principal = state
        .auth
        .enforce(Permission::DeleteMovie, headers.get(AUTHORIZATION))
        .await?;

    let Path(movie_id) = movie_id?;

    if movie_repo::delete(&state.db, movie_id).await? {
        tracing::info!(movie_id, sub = %principal.subject, "movie deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("movie"))
    }
}

pub async fn list_cast(
    State(state): State<AppState>,
    headers: HeaderMap,
    movie_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<ActorResponse>>, AppError> {
    state
        .auth
        .enforce(Permission::ViewMovie, headers.get(AUTHORIZATION))
        .await?;

    let Path(movie_id) = movie_id?;
    if !movie_repo::exists(&state.db, movie_id).await? {
        return Err(AppError::not_found("movie"));
    }

    let rows = movie_repo::list_cast(&state.db, movie_id).await?;
    Ok(Json(rows.into_iter().map(ActorResponse::from).collect()))
}

pub async fn add_cast_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .enforce(Permission::PatchMovie, headers.get(AUTHORIZATION))
        .await?;

    let Path((movie_id, actor_id)) = ids?;
    if !movie_repo::exists(&state.db, movie_id).await? {
        return Err(AppError::not_found("movie"));
    }
    if !actor_repo::exists(&state.db, actor_id).await? {
        return Err(AppError::not_found("actor"));
    }

    // Re-adding an existing member is a no-op.
    movie_repo::add_to_cast(&state.db, movie_id, actor_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_cast_member(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<StatusCode, AppError> {
    state
        .auth
        .enforce(Permission::PatchMovie, headers.get(AUTHORIZATION))
        .await?;

    let Path((movie_id, actor_id)) = ids?;

    if movie_repo::remove_from_cast(&state.db, movie_id, actor_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("cast member"))
    }
}
