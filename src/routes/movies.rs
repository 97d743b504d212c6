// ABOUTME: Movie catalog endpoints: search or popular listing, details, and trailer
// ABOUTME: Any logged-in user may browse; responses come straight from the catalog

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::types::MovieSearchQuery;
use crate::AppState;

/// GET /movies?query= searches by title, or lists popular movies when no query is given.
pub async fn list_movies(
    _user: CurrentUser,
    State(state): State<AppState>,
    query: std::result::Result<Query<MovieSearchQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;

    let movies = match query.query.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => state.catalog.search(title).await?,
        _ => state.catalog.popular().await?,
    };

    Ok(Json(json!({ "movies": movies })))
}

/// GET /movies/:movie_id
pub async fn get_movie(
    _user: CurrentUser,
    State(state): State<AppState>,
    movie_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(movie_id) = movie_id?;
    let movie = state.catalog.details(movie_id).await?;
    Ok(Json(json!({ "movie": movie })))
}

/// GET /movies/:movie_id/play: `null` when the catalog lists no videos.
pub async fn play_movie(
    _user: CurrentUser,
    State(state): State<AppState>,
    movie_id: std::result::Result<Path<i32>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(movie_id) = movie_id?;
    let movie = state.catalog.trailer(movie_id).await?;
    Ok(Json(json!({ "movie": movie })))
}
