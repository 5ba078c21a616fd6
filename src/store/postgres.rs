use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{VoteStore, event_not_found};
use crate::decision::latch::Trigger;
use crate::errors::AppError;
use crate::models::event::{self, Event, EventSettings, NewEvent};
use crate::models::feed_item::{self, FeedItem, NewFeedItem};
use crate::models::participant::{self, NewParticipant, Participant};

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl VoteStore for PgStore {
    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        event::insert(&self.pool, &new).await?;
        self.load_event(&new.id).await
    }

    async fn load_event(&self, id: &str) -> Result<Event, AppError> {
        event::find_by_id(&self.pool, id).await?.ok_or_else(event_not_found)
    }

    async fn load_all_events(&self) -> Result<Vec<Event>, AppError> {
        event::find_all(&self.pool).await
    }

    async fn save_settings(&self, id: &str, settings: &EventSettings, rearm: &[Trigger]) -> Result<(), AppError> {
        event::update_settings(&self.pool, id, settings, rearm).await
    }

    async fn create_participant_with_responses(
        &self,
        event_id: &str,
        new: NewParticipant,
    ) -> Result<Participant, AppError> {
        participant::insert_with_responses(&self.pool, event_id, &new).await
    }

    async fn count_participants(&self, event_id: &str) -> Result<i64, AppError> {
        participant::count_for_event(&self.pool, event_id).await
    }

    async fn record_decision(
        &self,
        event_id: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
        record: NewFeedItem,
    ) -> Result<Option<FeedItem>, AppError> {
        let mut tx = self.pool.begin().await?;

        if !event::claim_latch(&mut *tx, event_id, trigger, now).await? {
            tx.rollback().await?;
            return Ok(None);
        }
        let item = feed_item::insert(&mut *tx, &record).await?;

        tx.commit().await?;
        Ok(Some(item))
    }

    async fn list_decision_records(&self, event_id: &str) -> Result<Vec<FeedItem>, AppError> {
        feed_item::find_for_event(&self.pool, event_id).await
    }
}
