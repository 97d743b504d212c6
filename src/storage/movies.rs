// ABOUTME: Movie reference resolution from external catalog ids to local rows
// ABOUTME: Creation is an insert-or-ignore against the unique external id

use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::entities::movie;
use crate::error::{AppError, Result};

/// Looks up the reference row for `external_id` without creating it.
pub(super) async fn find<C: ConnectionTrait>(
    conn: &C,
    external_id: i32,
) -> Result<Option<movie::Model>> {
    Ok(movie::Entity::find()
        .filter(movie::Column::ExternalId.eq(external_id))
        .one(conn)
        .await?)
}

/// Returns the reference row for `external_id`, inserting it first if needed.
pub(super) async fn resolve<C: ConnectionTrait>(conn: &C, external_id: i32) -> Result<movie::Model> {
    let reference = movie::ActiveModel {
        external_id: Set(external_id),
        ..Default::default()
    };

    movie::Entity::insert(reference)
        .on_conflict(
            OnConflict::column(movie::Column::ExternalId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    find(conn, external_id).await?.ok_or_else(|| {
        AppError::Internal(format!("Movie reference {} vanished after insert", external_id))
    })
}
