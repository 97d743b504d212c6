// ABOUTME: User account endpoints plus per-user favorites and ratings
// ABOUTME: Listing and creating accounts is admin-only; everything else is self-or-admin

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::auth::{AdminUser, CurrentUser};
use crate::error::Result;
use crate::types::{
    FavoriteRequest, FavoriteStatus, MovieIdQuery, NewUserRequest, RatingUpdateRequest,
    UpdateUserRequest, UserWithToken,
};
use crate::AppState;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type UserPath = std::result::Result<Path<i32>, PathRejection>;
type MovieQuery = std::result::Result<Query<MovieIdQuery>, QueryRejection>;

/// Resolves the `:user_id` path segment and checks the caller may act on it.
fn authorized_user(user: &CurrentUser, path: UserPath) -> Result<i32> {
    let Path(user_id) = path?;
    user.ensure_self_or_admin(user_id)?;
    Ok(user_id)
}

/// POST /users lets an admin create an account, possibly another admin, and returns its token.
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    payload: JsonBody<NewUserRequest>,
) -> Result<(StatusCode, Json<UserWithToken>)> {
    let Json(req) = payload?;
    let new_user = req.validate()?;

    let user = state.storage.register(new_user).await?;
    tracing::info!(
        admin_id = admin.user_id,
        user_id = user.id,
        is_admin = user.is_admin,
        "Admin created user"
    );
    let token = state.tokens.issue(&user)?;

    Ok((StatusCode::CREATED, Json(UserWithToken { user, token })))
}

/// GET /users
pub async fn list_users(_admin: AdminUser, State(state): State<AppState>) -> Result<Json<Value>> {
    let users = state.storage.find_all_users().await?;
    Ok(Json(json!({ "users": users })))
}

/// GET /users/:user_id
pub async fn get_user(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    let profile = state.storage.get_user(user_id).await?;
    Ok(Json(json!({ "user": profile })))
}

/// PATCH /users/:user_id: partial update that ignores `isAdmin`.
pub async fn update_user(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
    payload: JsonBody<UpdateUserRequest>,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    let Json(req) = payload?;
    let changes = req.validate()?;

    let profile = state.storage.update_user(user_id, changes).await?;
    Ok(Json(json!({ "user": profile })))
}

/// DELETE /users/:user_id
pub async fn delete_user(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    state.storage.remove_user(user_id).await?;
    Ok(Json(json!({ "deleted": user_id })))
}

/// PUT /users/:user_id/favorites { movieId } => { isFavorite }
pub async fn toggle_favorite(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
    payload: JsonBody<FavoriteRequest>,
) -> Result<Json<FavoriteStatus>> {
    let user_id = authorized_user(&user, path)?;
    let Json(req) = payload?;
    let movie_id = req.validate()?;

    let status = state.storage.toggle_favorite(user_id, movie_id).await?;
    Ok(Json(status))
}

/// GET /users/:user_id/isFavorite?movieId=
pub async fn is_favorite(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
    query: MovieQuery,
) -> Result<Json<FavoriteStatus>> {
    let user_id = authorized_user(&user, path)?;
    let Query(query) = query?;
    let movie_id = query.validate()?;

    let is_favorite = state.storage.is_favorite(user_id, movie_id).await?;
    Ok(Json(FavoriteStatus { is_favorite }))
}

/// GET /users/:user_id/favorites => { favorites: [movie details...] }
pub async fn list_favorites(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    let favorites = state
        .storage
        .all_favorites(user_id, state.catalog.as_ref())
        .await?;
    Ok(Json(json!({ "favorites": favorites })))
}

/// GET /users/:user_id/rating?movieId= => { rating } (null when unrated)
pub async fn get_rating(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
    query: MovieQuery,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    let Query(query) = query?;
    let movie_id = query.validate()?;

    let rating = state.storage.get_rating(user_id, movie_id).await?;
    Ok(Json(json!({ "rating": rating })))
}

/// PATCH /users/:user_id/rating { movieId, rating }
pub async fn update_rating(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
    payload: JsonBody<RatingUpdateRequest>,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    let Json(req) = payload?;
    let (movie_id, score) = req.validate()?;

    let rating = state.storage.update_rating(user_id, movie_id, score).await?;
    Ok(Json(json!({ "rating": rating })))
}

/// DELETE /users/:user_id/rating with `{ movieId }` in the body or `?movieId=` in the query
pub async fn delete_rating(
    user: CurrentUser,
    State(state): State<AppState>,
    path: UserPath,
    query: MovieQuery,
    body: Option<Json<MovieIdQuery>>,
) -> Result<Json<Value>> {
    let user_id = authorized_user(&user, path)?;
    let Query(query) = query?;

    // The body wins when a client sends both
    let from_body = body.and_then(|Json(body)| body.movie_id);
    let movie_id = MovieIdQuery {
        movie_id: from_body.or(query.movie_id),
    }
    .validate()?;

    state.storage.remove_rating(user_id, movie_id).await?;
    Ok(Json(json!({ "deleted": "rating" })))
}
