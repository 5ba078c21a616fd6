use sqlx::{PgExecutor, PgPool};

use crate::errors::AppError;
use super::types::*;

/// Append a feed item. Accepts a pool or an open transaction.
pub async fn insert<'e>(exec: impl PgExecutor<'e>, item: &NewFeedItem) -> Result<FeedItem, sqlx::Error> {
    sqlx::query_as::<_, FeedItem>(
        "INSERT INTO feed_items (event_id, title, link, description) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, event_id, title, link, description, created_at",
    )
    .bind(&item.event_id)
    .bind(&item.title)
    .bind(&item.link)
    .bind(&item.description)
    .fetch_one(exec)
    .await
}

/// All feed items of an event, oldest first.
pub async fn find_for_event(pool: &PgPool, event_id: &str) -> Result<Vec<FeedItem>, AppError> {
    let items = sqlx::query_as::<_, FeedItem>(
        "SELECT id, event_id, title, link, description, created_at \
         FROM feed_items WHERE event_id = $1 \
         ORDER BY created_at, id",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}
