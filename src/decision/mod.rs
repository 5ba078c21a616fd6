//! Decision engine.
//!
//! [`tally`] finds the most voted candidate dates, [`policy`] turns that into
//! a message and decides whether a trigger may fire, [`latch`] models the
//! one-shot flags, and [`scheduler`] drives the periodic deadline sweep.
//! [`Finalizer`] ties them to a [`VoteStore`].

pub mod latch;
pub mod policy;
pub mod scheduler;
pub mod tally;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::FinalizeConfig;
use crate::errors::AppError;
use crate::models::event::{Event, EventSettings};
use crate::models::feed_item::FeedItem;
use crate::models::participant::{NewParticipant, Participant};
use crate::store::VoteStore;
use latch::Trigger;
use policy::Outcome;

/// Outcome of one deadline sweep.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SweepReport {
    /// Events whose deadline decision was recorded by this run.
    pub finalized: Vec<String>,
    /// Events whose deadline was not due in the loaded snapshot.
    pub not_due: usize,
    /// Events that looked due but whose claim was refused: another caller
    /// fired the latch first, or the settings changed since the snapshot.
    pub contended: usize,
    /// Events that failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of registering a participant.
#[derive(Debug, Clone)]
pub struct Registration {
    pub participant: Participant,
    /// The auto-decision record, when this registration made the threshold fire.
    pub decision: Option<FeedItem>,
}

pub struct Finalizer {
    store: Arc<dyn VoteStore>,
    config: FinalizeConfig,
}

impl Finalizer {
    pub fn new(store: Arc<dyn VoteStore>, config: FinalizeConfig) -> Self {
        Finalizer { store, config }
    }

    pub fn store(&self) -> &Arc<dyn VoteStore> {
        &self.store
    }

    pub fn config(&self) -> &FinalizeConfig {
        &self.config
    }

    /// Fire the deadline trigger of every event whose deadline has passed.
    ///
    /// Loading the events is the only failure that aborts the run. Each event
    /// is finalized on its own: a failure is logged and listed in the report
    /// while the remaining events are still processed.
    pub async fn finalize_due_deadlines(&self, now: DateTime<Utc>) -> Result<SweepReport, AppError> {
        let events = self.store.load_all_events().await?;
        let mut report = SweepReport::default();

        for event in &events {
            if !policy::deadline_due(event, now) {
                report.not_due += 1;
                continue;
            }
            log::debug!("Deadline of event {} has passed", event.id);
            match self.finalize(event, Trigger::Deadline, now).await {
                Ok(Some(_)) => report.finalized.push(event.id.clone()),
                Ok(None) => report.contended += 1,
                Err(e) => {
                    log::error!("Deadline finalization failed for event {}: {}", event.id, e);
                    report.failed.push((event.id.clone(), e.to_string()));
                }
            }
        }

        Ok(report)
    }

    /// Fire the auto-decision trigger of one event if enough participants have registered.
    pub async fn check_auto_decision(&self, event_id: &str) -> Result<Option<FeedItem>, AppError> {
        let event = self.store.load_event(event_id).await?;
        if !event.settings.auto_decision_enable || event.latch(Trigger::AutoDecision).is_fired() {
            return Ok(None);
        }

        let count = self.store.count_participants(event_id).await?;
        if !policy::threshold_met(&event, count) {
            log::debug!(
                "Event {} has {} of {} participants needed for auto-decision",
                event_id,
                count,
                event.settings.auto_decision_threshold
            );
            return Ok(None);
        }
        self.finalize(&event, Trigger::AutoDecision, Utc::now()).await
    }

    /// Replace an event's settings, re-arming the latches the change touches.
    pub async fn update_settings(&self, event_id: &str, mut next: EventSettings) -> Result<Event, AppError> {
        let event = self.store.load_event(event_id).await?;
        if !event.settings.allow_setting_changes {
            return Err(AppError::Forbidden("This event's settings cannot be changed".to_string()));
        }
        if !next.deadline_enable {
            next.deadline = None;
        }

        let rearm = latch::rearmed_by(&event.settings, &next);
        self.store.save_settings(event_id, &next, &rearm).await?;
        for trigger in &rearm {
            log::info!("Re-armed {} trigger of event {}", trigger, event_id);
        }

        self.store.load_event(event_id).await
    }

    /// Register a participant with their answers, then run the auto-decision check.
    pub async fn register_participant(&self, event_id: &str, new: NewParticipant) -> Result<Registration, AppError> {
        let event = self.store.load_event(event_id).await?;
        if let Some(missing) = new.responses.iter().find(|r| event.candidate_date(r.candidate_date_id).is_none()) {
            return Err(AppError::NotFound(format!(
                "Candidate date {} not found",
                missing.candidate_date_id
            )));
        }

        let participant = self.store.create_participant_with_responses(event_id, new).await?;
        log::info!("Participant {} registered for event {}", participant.id, event_id);

        let decision = self.check_auto_decision(event_id).await?;
        Ok(Registration { participant, decision })
    }

    /// Tally the snapshot and publish, if the store confirms the guard still holds at `now`.
    async fn finalize(&self, event: &Event, trigger: Trigger, now: DateTime<Utc>) -> Result<Option<FeedItem>, AppError> {
        let outcome = Outcome::from_winners(tally::most_voted(&event.candidate_dates));
        let winners = outcome.winner_count();
        let record = policy::decision_record(event, trigger, &outcome, &self.config);

        match self.store.record_decision(&event.id, trigger, now, record).await? {
            Some(item) => {
                log::info!("Event {} decided by {} trigger ({} winning dates)", event.id, trigger, winners);
                Ok(Some(item))
            }
            None => {
                log::warn!(
                    "The {} trigger of event {} no longer qualifies (already fired or settings changed); nothing recorded",
                    trigger,
                    event.id
                );
                Ok(None)
            }
        }
    }
}
