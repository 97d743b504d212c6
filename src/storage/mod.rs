// ABOUTME: Database storage layer for users, movie references, favorites, and ratings
// ABOUTME: Holds the injected connection pool and password policy; operations live in submodules

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait};
use sea_orm_migration::MigratorTrait;

use crate::entities::user;
use crate::error::{AppError, Result};
use crate::migration::Migrator;
use crate::password::Passwords;

mod favorites;
mod movies;
mod ratings;
mod users;

pub struct Storage {
    pub db: DatabaseConnection,
    pub passwords: Passwords,
}

impl Storage {
    /// Connects to `database_url` and brings the schema up to date.
    pub async fn connect(database_url: &str, passwords: Passwords) -> anyhow::Result<Self> {
        let db = Database::connect(database_url).await?;
        Migrator::up(&db, None).await?;
        tracing::info!("Database ready");

        Ok(Self { db, passwords })
    }
}

/// Loads the user row or fails with `NotFound`.
async fn require_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<user::Model> {
    user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User does not exist: {}", user_id)))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
