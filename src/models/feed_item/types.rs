use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A published decision, shown as one item of the event's RSS feed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedItem {
    pub id: i64,
    pub event_id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedItem {
    pub event_id: String,
    pub title: String,
    pub link: String,
    pub description: String,
}
