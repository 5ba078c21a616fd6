//! Vote store port.
//!
//! The decision engine never talks to a database handle directly; it is given
//! an `Arc<dyn VoteStore>` at construction. Two adapters ship with the crate:
//!
//! - [`PgStore`] - Postgres via `sqlx`, used by the server binary
//! - [`MemoryStore`] - process-local maps, used by tests and embedders

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::decision::latch::Trigger;
use crate::errors::AppError;
use crate::models::event::{Event, EventSettings, NewEvent};
use crate::models::feed_item::{FeedItem, NewFeedItem};
use crate::models::participant::{NewParticipant, Participant};

#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Create an event together with its candidate dates, atomically.
    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError>;

    /// Load one event with candidate dates, participants and responses.
    /// Fails with `AppError::NotFound` for an unknown id.
    async fn load_event(&self, id: &str) -> Result<Event, AppError>;

    /// Load every event with nested collections populated.
    async fn load_all_events(&self) -> Result<Vec<Event>, AppError>;

    /// Persist new settings, clearing the latches listed in `rearm`.
    async fn save_settings(&self, id: &str, settings: &EventSettings, rearm: &[Trigger]) -> Result<(), AppError>;

    /// Create a participant and all of their responses as one unit.
    /// Fails with `AppError::Conflict` if the participant id is taken within the event.
    async fn create_participant_with_responses(
        &self,
        event_id: &str,
        new: NewParticipant,
    ) -> Result<Participant, AppError>;

    async fn count_participants(&self, event_id: &str) -> Result<i64, AppError>;

    /// Fire `trigger`'s latch and append `record`, or do nothing unless the
    /// trigger's guard still holds against the stored event at `now`: latch
    /// armed, and the deadline passed or the threshold reached. Returns the
    /// stored record when this call won.
    async fn record_decision(
        &self,
        event_id: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
        record: NewFeedItem,
    ) -> Result<Option<FeedItem>, AppError>;

    /// Decision records of an event, oldest first. Empty for an unknown event.
    async fn list_decision_records(&self, event_id: &str) -> Result<Vec<FeedItem>, AppError>;
}

pub(crate) fn event_not_found() -> AppError {
    AppError::NotFound("Event not found".to_string())
}
