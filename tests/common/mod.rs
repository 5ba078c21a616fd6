//! Shared fixtures for engine and API tests.
//!
//! Everything runs against `MemoryStore`, so no database is needed.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use rendezvous::config::FinalizeConfig;
use rendezvous::decision::{Finalizer, Registration};
use rendezvous::models::event::{Event, EventSettings, NewEvent, generate_id};
use rendezvous::models::participant::{NewParticipant, NewResponse, ResponseStatus};
use rendezvous::store::{MemoryStore, VoteStore};

pub const EVENT_TITLE: &str = "Game night";

/// Candidate dates used by `seed_event`: June 1st, 2nd and 3rd 2025, 12:00 UTC.
pub fn candidate_instants() -> Vec<DateTime<Utc>> {
    (1..=3)
        .map(|day| Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap())
        .collect()
}

pub fn finalizer_over(store: Arc<dyn VoteStore>) -> Finalizer {
    Finalizer::new(store, FinalizeConfig::default())
}

pub fn memory_finalizer() -> (Arc<MemoryStore>, Finalizer) {
    let store = Arc::new(MemoryStore::new());
    let finalizer = finalizer_over(store.clone());
    (store, finalizer)
}

pub async fn seed_event(store: &dyn VoteStore, settings: EventSettings) -> Event {
    store
        .create_event(NewEvent {
            id: generate_id(),
            title: EVENT_TITLE.to_string(),
            description: "Monthly board games".to_string(),
            creator_name: "Sora".to_string(),
            candidate_dates: candidate_instants(),
            settings,
        })
        .await
        .unwrap()
}

pub fn past_deadline() -> EventSettings {
    EventSettings {
        deadline_enable: true,
        deadline: Some(Utc::now() - Duration::hours(1)),
        ..EventSettings::default()
    }
}

pub fn auto_decision(threshold: i64) -> EventSettings {
    EventSettings {
        auto_decision_enable: true,
        auto_decision_threshold: threshold,
        ..EventSettings::default()
    }
}

/// Register `participant_id`, marking the dates at `available` (indexes into the
/// event's candidate dates) available and every other date unavailable.
pub async fn vote(finalizer: &Finalizer, event: &Event, participant_id: i64, available: &[usize]) -> Registration {
    let responses = event
        .candidate_dates
        .iter()
        .enumerate()
        .map(|(i, date)| NewResponse {
            candidate_date_id: date.id,
            status: if available.contains(&i) {
                ResponseStatus::Available
            } else {
                ResponseStatus::Unavailable
            },
        })
        .collect();

    finalizer
        .register_participant(
            &event.id,
            NewParticipant {
                id: participant_id,
                name: format!("Participant {participant_id}"),
                responses,
            },
        )
        .await
        .unwrap()
}
