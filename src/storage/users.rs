// ABOUTME: Credential store operations: authenticate, register, list, get, update, remove
// ABOUTME: Password hashes never leave this module; callers receive UserProfile values

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, SqlErr,
};

use super::{require_user, Storage};
use crate::entities::user;
use crate::error::{AppError, Result};
use crate::types::{NewUser, UserChanges, UserProfile};

impl Storage {
    /// Checks credentials. Unknown usernames and wrong passwords fail the same way.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<UserProfile> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        match found {
            Some(found) => {
                let valid = self
                    .passwords
                    .verify(password.to_string(), found.password_hash.clone())
                    .await?;
                if valid {
                    return Ok(found.into());
                }
            }
            None => self.passwords.verify_unknown(password.to_string()).await?,
        }

        Err(AppError::Unauthorized(
            "Invalid username/password".to_string(),
        ))
    }

    pub async fn register(&self, new_user: NewUser) -> Result<UserProfile> {
        let duplicate = user::Entity::find()
            .filter(user::Column::Username.eq(&new_user.username))
            .one(&self.db)
            .await?;
        if duplicate.is_some() {
            return Err(duplicate_username(&new_user.username));
        }

        let password_hash = self.passwords.hash(new_user.password).await?;
        let row = user::ActiveModel {
            username: Set(new_user.username.clone()),
            password_hash: Set(password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            email: Set(new_user.email),
            profile_image: Set(new_user.profile_image),
            is_admin: Set(new_user.is_admin),
            ..Default::default()
        };

        let created = row.insert(&self.db).await.map_err(|err| match err.sql_err() {
            // Lost a race with a concurrent registration
            Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_username(&new_user.username),
            _ => AppError::Database(err),
        })?;

        tracing::info!(user_id = created.id, "Registered user {}", created.username);
        Ok(created.into())
    }

    pub async fn find_all_users(&self) -> Result<Vec<UserProfile>> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::Username)
            .all(&self.db)
            .await?;

        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn get_user(&self, user_id: i32) -> Result<UserProfile> {
        user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound(format!("User does not exist: {}", user_id)))
    }

    /// Partial update. The admin flag is not part of `UserChanges` and is never touched.
    pub async fn update_user(&self, user_id: i32, changes: UserChanges) -> Result<UserProfile> {
        let existing = require_user(&self.db, user_id).await?;
        if changes.is_empty() {
            return Ok(existing.into());
        }

        let mut row: user::ActiveModel = existing.into();
        if let Some(first_name) = changes.first_name {
            row.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            row.last_name = Set(last_name);
        }
        if let Some(email) = changes.email {
            row.email = Set(email);
        }
        if let Some(profile_image) = changes.profile_image {
            row.profile_image = Set(Some(profile_image));
        }
        if let Some(password) = changes.password {
            row.password_hash = Set(self.passwords.hash(password).await?);
        }

        let updated = row.update(&self.db).await?;
        Ok(updated.into())
    }

    /// Deletes the account; favorites and ratings go with it through the cascade.
    pub async fn remove_user(&self, user_id: i32) -> Result<()> {
        let result = user::Entity::delete_by_id(user_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User does not exist: {}", user_id)));
        }

        tracing::info!(user_id, "Removed user");
        Ok(())
    }
}

fn duplicate_username(username: &str) -> AppError {
    AppError::BadRequest(format!("Duplicate username: {}", username))
}
