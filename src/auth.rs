// ABOUTME: Authentication endpoints and authorization extractors for bearer-token callers
// ABOUTME: Handles registration, login, and the logged-in / admin / self-or-admin checks

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, State},
    http::{request::Parts, StatusCode},
    Json,
};

use crate::error::{AppError, Result};
use crate::token::Claims;
use crate::types::{LoginRequest, RegisterRequest, TokenResponse};
use crate::AppState;

/// Any caller holding a valid token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid bearer token".to_string()))
    }
}

impl CurrentUser {
    /// Permits the owner of `user_id` and any admin.
    pub fn ensure_self_or_admin(&self, user_id: i32) -> Result<()> {
        if self.0.is_admin || self.0.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "User {} may not act on user {}",
                self.0.user_id, user_id
            )))
        }
    }
}

/// A caller whose token carries the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let CurrentUser(claims) = CurrentUser::from_request_parts(parts, state).await?;
        if !claims.is_admin {
            return Err(AppError::Unauthorized(format!(
                "User {} is not an admin",
                claims.user_id
            )));
        }
        Ok(AdminUser(claims))
    }
}

/// POST /auth/register: public sign-up, always creates a non-admin.
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let Json(req) = payload?;
    let new_user = req.validate()?;

    let user = state.storage.register(new_user).await?;
    let token = state.tokens.issue(&user)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

/// POST /auth/token exchanges username and password for a token.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>> {
    let Json(req) = payload?;
    let (username, password) = req.validate()?;

    let user = state.storage.authenticate(&username, &password).await?;
    let token = state.tokens.issue(&user)?;

    Ok(Json(TokenResponse { token }))
}
