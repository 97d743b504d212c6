// ABOUTME: Rating lifecycle with at most one rating per (user, movie) pair
// ABOUTME: Create is transactional and refuses duplicates; update and delete need an existing row

use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait,
    QueryFilter, SqlErr, TransactionTrait,
};

use super::{movies, require_user, Storage};
use crate::entities::{movie, rating};
use crate::error::{AppError, Result};
use crate::types::{NewRating, RatingView};

impl Storage {
    pub async fn create_rating(&self, new_rating: NewRating) -> Result<RatingView> {
        let NewRating {
            user_id,
            movie_id,
            rating: score,
        } = new_rating;

        let txn = self.db.begin().await?;

        let reference = movies::resolve(&txn, movie_id).await?;
        require_user(&txn, user_id).await?;

        if find_rating(&txn, user_id, &reference).await?.is_some() {
            return Err(already_rated(movie_id));
        }

        let row = rating::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(reference.id),
            score: Set(score),
            ..Default::default()
        };
        let created = row.insert(&txn).await.map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => already_rated(movie_id),
            _ => AppError::Database(err),
        })?;

        txn.commit().await?;

        Ok(RatingView::new(created, reference.external_id))
    }

    /// `Ok(None)` when the user exists but has not rated the movie.
    pub async fn get_rating(&self, user_id: i32, movie_id: i32) -> Result<Option<RatingView>> {
        require_user(&self.db, user_id).await?;

        let Some(reference) = movies::find(&self.db, movie_id).await? else {
            return Ok(None);
        };

        Ok(find_rating(&self.db, user_id, &reference)
            .await?
            .map(|row| RatingView::new(row, reference.external_id)))
    }

    pub async fn update_rating(&self, user_id: i32, movie_id: i32, score: f64) -> Result<RatingView> {
        require_user(&self.db, user_id).await?;

        let (reference, existing) = existing_rating(&self.db, user_id, movie_id).await?;

        let mut row: rating::ActiveModel = existing.into();
        row.score = Set(score);
        let updated = row.update(&self.db).await?;

        Ok(RatingView::new(updated, reference.external_id))
    }

    pub async fn remove_rating(&self, user_id: i32, movie_id: i32) -> Result<()> {
        require_user(&self.db, user_id).await?;

        let (_, existing) = existing_rating(&self.db, user_id, movie_id).await?;
        existing.delete(&self.db).await?;

        Ok(())
    }
}

async fn find_rating<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    reference: &movie::Model,
) -> Result<Option<rating::Model>> {
    Ok(rating::Entity::find()
        .filter(rating::Column::UserId.eq(user_id))
        .filter(rating::Column::MovieId.eq(reference.id))
        .one(conn)
        .await?)
}

async fn existing_rating<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    movie_id: i32,
) -> Result<(movie::Model, rating::Model)> {
    let missing = || AppError::NotFound(format!("Rating does not exist: {}", movie_id));

    let reference = movies::find(conn, movie_id).await?.ok_or_else(missing)?;
    let row = find_rating(conn, user_id, &reference)
        .await?
        .ok_or_else(missing)?;

    Ok((reference, row))
}

fn already_rated(movie_id: i32) -> AppError {
    AppError::BadRequest(format!("This movie has already been rated: {}", movie_id))
}
