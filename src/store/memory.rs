//! In-memory store. All state sits behind one `RwLock`, so every operation,
//! including the latch compare-and-set, is atomic with respect to the others.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{VoteStore, event_not_found};
use crate::decision::latch::{Latch, Trigger};
use crate::decision::policy;
use crate::errors::AppError;
use crate::models::event::{CandidateDate, Event, EventSettings, NewEvent};
use crate::models::feed_item::{FeedItem, NewFeedItem};
use crate::models::participant::{NewParticipant, Participant, Response};

#[derive(Default)]
struct State {
    events: Vec<Event>,
    feed: Vec<FeedItem>,
    next_date_id: i64,
    next_response_id: i64,
    next_feed_id: i64,
}

impl State {
    fn event(&self, id: &str) -> Result<&Event, AppError> {
        self.events.iter().find(|e| e.id == id).ok_or_else(event_not_found)
    }

    fn event_mut(&mut self, id: &str) -> Result<&mut Event, AppError> {
        self.events.iter_mut().find(|e| e.id == id).ok_or_else(event_not_found)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, AppError> {
        self.state
            .read()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, AppError> {
        self.state
            .write()
            .map_err(|_| AppError::Storage("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        let mut state = self.write()?;
        if state.events.iter().any(|e| e.id == new.id) {
            return Err(AppError::Conflict(format!("Event {} already exists", new.id)));
        }

        let now = Utc::now();
        let mut candidate_dates = Vec::with_capacity(new.candidate_dates.len());
        for date_time in new.candidate_dates {
            state.next_date_id += 1;
            candidate_dates.push(CandidateDate {
                id: state.next_date_id,
                event_id: new.id.clone(),
                date_time,
                responses: Vec::new(),
            });
        }

        let event = Event {
            id: new.id,
            title: new.title,
            description: new.description,
            creator_name: new.creator_name,
            created_at: now,
            updated_at: now,
            deadline_reached: false,
            auto_decision_reached: false,
            settings: new.settings,
            candidate_dates,
            participants: Vec::new(),
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn load_event(&self, id: &str) -> Result<Event, AppError> {
        self.read()?.event(id).cloned()
    }

    async fn load_all_events(&self) -> Result<Vec<Event>, AppError> {
        Ok(self.read()?.events.clone())
    }

    async fn save_settings(&self, id: &str, settings: &EventSettings, rearm: &[Trigger]) -> Result<(), AppError> {
        let mut state = self.write()?;
        let event = state.event_mut(id)?;
        event.settings = settings.clone();
        for &trigger in rearm {
            event.set_latch(trigger, Latch::Armed);
        }
        event.updated_at = Utc::now();
        Ok(())
    }

    async fn create_participant_with_responses(
        &self,
        event_id: &str,
        new: NewParticipant,
    ) -> Result<Participant, AppError> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let event = state.events.iter_mut().find(|e| e.id == event_id).ok_or_else(event_not_found)?;
        if event.participants.iter().any(|p| p.id == new.id) {
            return Err(AppError::Conflict(format!(
                "Participant {} is already registered for this event",
                new.id
            )));
        }
        // Validate every reference before mutating so the registration lands whole or not at all.
        if let Some(missing) = new
            .responses
            .iter()
            .find(|r| !event.candidate_dates.iter().any(|d| d.id == r.candidate_date_id))
        {
            return Err(AppError::NotFound(format!(
                "Candidate date {} not found",
                missing.candidate_date_id
            )));
        }

        let mut responses = Vec::with_capacity(new.responses.len());
        for answer in &new.responses {
            state.next_response_id += 1;
            let response = Response {
                id: state.next_response_id,
                participant_id: new.id,
                candidate_date_id: answer.candidate_date_id,
                status: answer.status,
            };
            if let Some(date) = event.candidate_dates.iter_mut().find(|d| d.id == answer.candidate_date_id) {
                date.responses.push(response.clone());
            }
            responses.push(response);
        }

        let participant = Participant {
            id: new.id,
            event_id: event_id.to_string(),
            name: new.name,
            created_at: Utc::now(),
            responses,
        };
        event.participants.push(participant.clone());
        Ok(participant)
    }

    async fn count_participants(&self, event_id: &str) -> Result<i64, AppError> {
        Ok(self.read()?.event(event_id)?.participants.len() as i64)
    }

    async fn record_decision(
        &self,
        event_id: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
        record: NewFeedItem,
    ) -> Result<Option<FeedItem>, AppError> {
        let mut state = self.write()?;

        let event = state.event_mut(event_id)?;
        let still_due = match trigger {
            Trigger::Deadline => policy::deadline_due(event, now),
            Trigger::AutoDecision => policy::threshold_met(event, event.participants.len() as i64),
        };
        if !still_due {
            return Ok(None);
        }
        event.set_latch(trigger, Latch::Fired);
        event.updated_at = Utc::now();

        state.next_feed_id += 1;
        let item = FeedItem {
            id: state.next_feed_id,
            event_id: record.event_id,
            title: record.title,
            link: record.link,
            description: record.description,
            created_at: Utc::now(),
        };
        state.feed.push(item.clone());
        Ok(Some(item))
    }

    async fn list_decision_records(&self, event_id: &str) -> Result<Vec<FeedItem>, AppError> {
        let state = self.read()?;
        Ok(state.feed.iter().filter(|f| f.event_id == event_id).cloned().collect())
    }
}
