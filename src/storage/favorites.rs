// ABOUTME: Favorite toggling, lookup, and listing for (user, movie) pairs
// ABOUTME: Toggles are a single upsert inside a transaction so concurrent requests cannot duplicate rows

use futures::future::try_join_all;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, TransactionTrait,
};
use serde_json::Value;

use super::{movies, now_millis, require_user, Storage};
use crate::catalog::MovieCatalog;
use crate::entities::{favorite, movie};
use crate::error::{AppError, Result};
use crate::types::FavoriteStatus;

impl Storage {
    pub async fn is_favorite(&self, user_id: i32, movie_id: i32) -> Result<bool> {
        require_user(&self.db, user_id).await?;

        // Nothing was ever favorited or rated for this catalog id
        let Some(reference) = movies::find(&self.db, movie_id).await? else {
            return Ok(false);
        };

        let row = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::MovieId.eq(reference.id))
            .one(&self.db)
            .await?;

        Ok(row.map(|f| f.is_favorite).unwrap_or(false))
    }

    pub async fn toggle_favorite(&self, user_id: i32, movie_id: i32) -> Result<FavoriteStatus> {
        let txn = self.db.begin().await?;

        let reference = movies::resolve(&txn, movie_id).await?;
        require_user(&txn, user_id).await?;

        let row = favorite::ActiveModel {
            user_id: Set(user_id),
            movie_id: Set(reference.id),
            is_favorite: Set(true),
            updated_at: Set(now_millis()),
            ..Default::default()
        };

        favorite::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([favorite::Column::UserId, favorite::Column::MovieId])
                    .value(
                        favorite::Column::IsFavorite,
                        Expr::col((favorite::Entity, favorite::Column::IsFavorite)).not(),
                    )
                    .update_column(favorite::Column::UpdatedAt)
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        let stored = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::MovieId.eq(reference.id))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Internal("Favorite row missing after upsert".to_string()))?;

        txn.commit().await?;

        tracing::debug!(user_id, movie_id, is_favorite = stored.is_favorite, "Toggled favorite");
        Ok(FavoriteStatus {
            is_favorite: stored.is_favorite,
        })
    }

    /// Catalog ids the user currently favorites, most recently toggled first.
    pub async fn favorite_movie_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        require_user(&self.db, user_id).await?;

        let ids = favorite::Entity::find()
            .select_only()
            .column(movie::Column::ExternalId)
            .join(JoinType::InnerJoin, favorite::Relation::Movie.def())
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::IsFavorite.eq(true))
            .order_by_desc(favorite::Column::UpdatedAt)
            .order_by_desc(favorite::Column::Id)
            .into_tuple::<i32>()
            .all(&self.db)
            .await?;

        Ok(ids)
    }

    /// Full catalog details for every favorite, fetched concurrently.
    ///
    /// A single failed fetch fails the whole list.
    pub async fn all_favorites(
        &self,
        user_id: i32,
        catalog: &dyn MovieCatalog,
    ) -> Result<Vec<Value>> {
        let ids = self.favorite_movie_ids(user_id).await?;
        try_join_all(ids.into_iter().map(|id| catalog.details(id))).await
    }
}
