/*
 * Responsibility
 * - SQLx operations on movies and the actor_movie association (cast)
 */
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};

use crate::repos::actor_repo::ActorRow;
use crate::repos::error::RepoError;

#[derive(Debug, Clone, FromRow)]
pub struct MovieRow {
    pub id: i64,
    pub title: String,
    pub release_date: NaiveDate,
}

pub async fn list(db: &PgPool) -> Result<Vec<MovieRow>, RepoError> {
    let rows = sqlx::query_as::<_, MovieRow>(
        r#"
        SELECT id, title, release_date
        FROM movies
        ORDER BY id
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows)
}

pub async fn create(
    db: &PgPool,
    title: &str,
    release_date: NaiveDate,
) -> Result<MovieRow, RepoError> {
    let row = sqlx::query_as::<_, MovieRow>(
        r#"
        INSERT INTO movies (title, release_date)
        VALUES ($1, $2)
        RETURNING id, title, release_date
        "#,
    )
    .bind(title)
    .bind(release_date)
    .fetch_one(db)
    .await?;

    Ok(row)
}

pub async fn update(
    db: &PgPool,
    movie_id: i64,
    title: Option<&str>,
    release_date: Option<NaiveDate>,
) -> Result<Option<MovieRow>, RepoError> {
    let row = sqlx::query_as::<_, MovieRow>(
        r#"
        UPDATE movies
        SET
            title = COALESCE($2, title),
            release_date = COALESCE($3, release_date)
        WHERE id = $1
        RETURNING id, title, release_date
        "#,
    )
    .bind(movie_id)
    .bind(title)
    .bind(release_date)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

pub async fn delete(db: &PgPool, movie_id: i64) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM movies
        WHERE id = $1
        "#,
    )
    .bind(movie_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn exists(db: &PgPool, movie_id: i64) -> Result<bool, RepoError> {
    let found: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1)
        "#,
    )
    .bind(movie_id)
    .fetch_one(db)
    .await?;

    Ok(found)
}

pub async fn list_cast(db: &PgPool, movie_id: i64) -> Result<Vec<ActorRow>, RepoError> {
    let rows = sqlx::query_as::<_, ActorRow>(
        r#"
        SELECT a.id, a.name, a.age, a.gender
        FROM actors a
        JOIN actor_movie am ON am.actor_id = a.id
        WHERE am.movie_id = $1
        ORDER BY a.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db)
    .await?;

    Ok(rows)
}

// Idempotent: casting the same actor twice is a no-op.
pub async fn add_to_cast(db: &PgPool, movie_id: i64, actor_id: i64) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO actor_movie (movie_id, actor_id)
        VALUES ($1, $2)
        ON CONFLICT (movie_id, actor_id) DO NOTHING
        "#,
    )
    .bind(movie_id)
    .bind(actor_id)
    .execute(db)
    .await?;

    Ok(())
}

pub async fn remove_from_cast(
    db: &PgPool,
    movie_id: i64,
    actor_id: i64,
) -> Result<bool, RepoError> {
    let result = sqlx::query(
        r#"
        DELETE FROM actor_movie
        WHERE movie_id = $1 AND actor_id = $2
        "#,
    )
    .bind(movie_id)
    .bind(actor_id)
    .execute(db)
    .await?;

    Ok(result.rows_affected() > 0)
}
