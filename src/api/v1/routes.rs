/*
 * Responsibility
 * - v1 URL layout
 * - Permission per route lives in the handler (enforce is its first statement)
 */
use axum::{
    Router,
    routing::{get, patch, put},
};

use crate::api::v1::handlers::{
    actors::{create_actor, delete_actor, list_actors, update_actor},
    health::health,
    movies::{
        add_cast_member, create_movie, delete_movie, list_cast, list_movies, remove_cast_member,
        update_movie,
    },
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/actors", get(list_actors).post(create_actor))
        .route("/actors/{actor_id}", patch(update_actor).delete(delete_actor))
        .route("/movies", get(list_movies).post(create_movie))
        .route("/movies/{movie_id}", patch(update_movie).delete(delete_movie))
        .route("/movies/{movie_id}/actors", get(list_cast))
        .route(
            "/movies/{movie_id}/actors/{actor_id}",
            put(add_cast_member).delete(remove_cast_member),
        )
}
