// ABOUTME: Type definitions for API requests, responses, and validated domain inputs
// ABOUTME: Request validation collects every violation before rejecting a payload

use serde::{Deserialize, Serialize};

use crate::entities::{rating, user};
use crate::error::{AppError, Result};

// Profile and account types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub is_admin: bool,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
            profile_image: model.profile_image,
            is_admin: model.is_admin,
        }
    }
}

/// A validated account ready to be stored.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub is_admin: bool,
}

/// Self-service profile changes. Only fields that are `Some` are written.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub password: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.profile_image.is_none()
            && self.password.is_none()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
}

impl RegisterRequest {
    /// Public sign-up never grants admin rights.
    pub fn validate(self) -> Result<NewUser> {
        let mut errors = Vec::new();
        let username = required_len(&mut errors, "username", self.username, 1, 30);
        let password = required_len(&mut errors, "password", self.password, 5, 20);
        let first_name = required_len(&mut errors, "firstName", self.first_name, 1, 30);
        let last_name = required_len(&mut errors, "lastName", self.last_name, 1, 30);
        let email = required_email(&mut errors, self.email);
        check_profile_image(&mut errors, self.profile_image.as_deref());
        finish(errors)?;

        Ok(NewUser {
            username,
            password,
            first_name,
            last_name,
            email,
            profile_image: self.profile_image,
            is_admin: false,
        })
    }
}

/// Admin-only account creation; may create other admins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRequest {
    #[serde(flatten)]
    pub account: RegisterRequest,
    pub is_admin: Option<bool>,
}

impl NewUserRequest {
    pub fn validate(self) -> Result<NewUser> {
        let is_admin = self.is_admin.unwrap_or(false);
        let mut new_user = self.account.validate()?;
        new_user.is_admin = is_admin;
        Ok(new_user)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn validate(self) -> Result<(String, String)> {
        let mut errors = Vec::new();
        let username = required_len(&mut errors, "username", self.username, 1, 30);
        let password = required_len(&mut errors, "password", self.password, 1, 100);
        finish(errors)?;
        Ok((username, password))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<String>,
    pub password: Option<String>,
    /// Accepted so existing clients keep working, but never applied.
    pub is_admin: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserChanges> {
        if self.is_admin.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.profile_image.is_none()
            && self.password.is_none()
        {
            return Err(AppError::BadRequest("No data".to_string()));
        }

        let mut errors = Vec::new();
        if let Some(value) = &self.first_name {
            check_len(&mut errors, "firstName", value, 1, 30);
        }
        if let Some(value) = &self.last_name {
            check_len(&mut errors, "lastName", value, 1, 30);
        }
        if let Some(value) = &self.email {
            check_email(&mut errors, value);
        }
        if let Some(value) = &self.password {
            check_len(&mut errors, "password", value, 5, 20);
        }
        check_profile_image(&mut errors, self.profile_image.as_deref());
        finish(errors)?;

        if self.is_admin.is_some() {
            tracing::debug!("Ignoring isAdmin in partial user update");
        }

        Ok(UserChanges {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            profile_image: self.profile_image,
            password: self.password,
        })
    }
}

// Favorite and rating types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub movie_id: Option<i32>,
}

impl FavoriteRequest {
    pub fn validate(self) -> Result<i32> {
        let mut errors = Vec::new();
        let movie_id = required_movie_id(&mut errors, self.movie_id);
        finish(errors)?;
        Ok(movie_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieIdQuery {
    pub movie_id: Option<i32>,
}

impl MovieIdQuery {
    pub fn validate(self) -> Result<i32> {
        let mut errors = Vec::new();
        let movie_id = required_movie_id(&mut errors, self.movie_id);
        finish(errors)?;
        Ok(movie_id)
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieSearchQuery {
    pub query: Option<String>,
}

/// A validated rating for one (user, movie) pair; `movie_id` is the catalog id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRating {
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRatingRequest {
    pub user_id: Option<i32>,
    pub movie_id: Option<i32>,
    pub rating: Option<f64>,
}

impl NewRatingRequest {
    pub fn validate(self) -> Result<NewRating> {
        let mut errors = Vec::new();
        let user_id = match self.user_id {
            Some(id) if id > 0 => id,
            Some(_) => {
                errors.push("userId must be a positive integer".to_string());
                0
            }
            None => {
                errors.push("userId is required".to_string());
                0
            }
        };
        let movie_id = required_movie_id(&mut errors, self.movie_id);
        let rating = required_score(&mut errors, self.rating);
        finish(errors)?;

        Ok(NewRating {
            user_id,
            movie_id,
            rating,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdateRequest {
    pub movie_id: Option<i32>,
    pub rating: Option<f64>,
}

impl RatingUpdateRequest {
    pub fn validate(self) -> Result<(i32, f64)> {
        let mut errors = Vec::new();
        let movie_id = required_movie_id(&mut errors, self.movie_id);
        let rating = required_score(&mut errors, self.rating);
        finish(errors)?;
        Ok((movie_id, rating))
    }
}

/// Rating as returned to clients; `movie_id` is the external catalog id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: i32,
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: f64,
}

impl RatingView {
    pub fn new(model: rating::Model, external_id: i32) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            movie_id: external_id,
            rating: model.score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserWithToken {
    pub user: UserProfile,
    pub token: String,
}

// Validation helpers
fn finish(errors: Vec<String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn required_len(
    errors: &mut Vec<String>,
    field: &str,
    value: Option<String>,
    min: usize,
    max: usize,
) -> String {
    match value {
        Some(value) => {
            check_len(errors, field, &value, min, max);
            value
        }
        None => {
            errors.push(format!("{} is required", field));
            String::new()
        }
    }
}

fn check_len(errors: &mut Vec<String>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(format!("{} must be {} to {} characters", field, min, max));
    }
}

fn required_email(errors: &mut Vec<String>, value: Option<String>) -> String {
    match value {
        Some(value) => {
            check_email(errors, &value);
            value
        }
        None => {
            errors.push("email is required".to_string());
            String::new()
        }
    }
}

fn check_email(errors: &mut Vec<String>, value: &str) {
    let len = value.chars().count();
    let well_formed = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !(6..=60).contains(&len) || !well_formed {
        errors.push("email must be a valid address of 6 to 60 characters".to_string());
    }
}

fn check_profile_image(errors: &mut Vec<String>, value: Option<&str>) {
    if let Some(value) = value {
        if value.chars().count() > 255 {
            errors.push("profileImage must be at most 255 characters".to_string());
        }
    }
}

fn required_movie_id(errors: &mut Vec<String>, value: Option<i32>) -> i32 {
    match value {
        Some(id) if id > 0 => id,
        Some(_) => {
            errors.push("movieId must be a positive integer".to_string());
            0
        }
        None => {
            errors.push("movieId is required".to_string());
            0
        }
    }
}

fn required_score(errors: &mut Vec<String>, value: Option<f64>) -> f64 {
    match value {
        Some(score) if (0.0..=5.0).contains(&score) && (score * 2.0).fract() == 0.0 => score,
        Some(_) => {
            errors.push("rating must be between 0 and 5 in steps of 0.5".to_string());
            0.0
        }
        None => {
            errors.push("rating is required".to_string());
            0.0
        }
    }
}
