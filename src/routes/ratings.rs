// ABOUTME: Rating creation endpoint
// ABOUTME: The caller must be the rating's user or an admin

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::types::NewRatingRequest;
use crate::AppState;

/// POST /ratings { userId, movieId, rating } => 201 { rating }
pub async fn create_rating(
    user: CurrentUser,
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewRatingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(req) = payload?;
    let new_rating = req.validate()?;
    user.ensure_self_or_admin(new_rating.user_id)?;

    let rating = state.storage.create_rating(new_rating).await?;
    Ok((StatusCode::CREATED, Json(json!({ "rating": rating }))))
}
