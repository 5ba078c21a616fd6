//! Engine behaviour: both triggers, latches, re-arming and sweep isolation.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use rendezvous::decision::latch::Trigger;
use rendezvous::errors::AppError;
use rendezvous::models::event::{Event, EventSettings, NewEvent};
use rendezvous::models::feed_item::{FeedItem, NewFeedItem};
use rendezvous::models::participant::{NewParticipant, NewResponse, Participant, ResponseStatus};
use rendezvous::store::{MemoryStore, VoteStore};
use common::*;

#[tokio::test]
async fn deadline_with_clear_leader_names_that_date() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;
    vote(&finalizer, &event, 1, &[0]).await;
    vote(&finalizer, &event, 2, &[0, 1]).await;

    let report = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();
    assert_eq!(report.finalized, vec![event.id.clone()]);
    assert!(report.is_clean());

    let records = store.list_decision_records(&event.id).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].description,
        "[Game night] The deadline has passed. The most popular date is:\nDate: 2025/06/01"
    );
    assert_eq!(records[0].title, EVENT_TITLE);
    assert_eq!(records[0].link, format!("https://localhost:3000/{}/vote", event.id));
}

#[tokio::test]
async fn deadline_with_tie_lists_every_leader() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;
    vote(&finalizer, &event, 1, &[0]).await;
    vote(&finalizer, &event, 2, &[1]).await;

    finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();

    let records = store.list_decision_records(&event.id).await.unwrap();
    assert_eq!(
        records[0].description,
        "[Game night] The deadline has passed, but several dates share the most votes.\nDates: 2025/06/01, 2025/06/02"
    );
}

#[tokio::test]
async fn deadline_without_participants_reports_no_votes() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;

    finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();

    let records = store.list_decision_records(&event.id).await.unwrap();
    assert_eq!(
        records[0].description,
        "[Game night] The deadline has passed, but no candidate date received any votes."
    );
    assert!(store.load_event(&event.id).await.unwrap().deadline_reached);
}

#[tokio::test]
async fn deadline_fires_only_once() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;

    let first = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();
    let second = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();

    assert_eq!(first.finalized.len(), 1);
    assert!(second.finalized.is_empty());
    assert_eq!(second.not_due, 1);
    assert_eq!(second.contended, 0);
    assert_eq!(store.list_decision_records(&event.id).await.unwrap().len(), 1);
    assert!(store.load_event(&event.id).await.unwrap().deadline_reached);
}

#[tokio::test]
async fn concurrent_sweeps_record_one_decision() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;

    let now = Utc::now();
    let (a, b) = tokio::join!(
        finalizer.finalize_due_deadlines(now),
        finalizer.finalize_due_deadlines(now)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    let fired = a.finalized.len() + b.finalized.len();

    assert_eq!(fired, 1);
    assert_eq!(a.contended + b.contended, 1);
    assert_eq!(store.list_decision_records(&event.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn future_or_disabled_deadlines_are_left_alone() {
    let (store, finalizer) = memory_finalizer();
    let future = seed_event(
        &*store,
        EventSettings {
            deadline_enable: true,
            deadline: Some(Utc::now() + Duration::days(1)),
            ..EventSettings::default()
        },
    )
    .await;
    let disabled = seed_event(
        &*store,
        EventSettings {
            deadline_enable: false,
            deadline: Some(Utc::now() - Duration::days(1)),
            ..EventSettings::default()
        },
    )
    .await;

    let report = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();
    assert!(report.finalized.is_empty());
    assert_eq!(report.not_due, 2);
    assert!(store.list_decision_records(&future.id).await.unwrap().is_empty());
    assert!(store.list_decision_records(&disabled.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn threshold_fires_on_the_registration_that_reaches_it() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, auto_decision(2)).await;

    let first = vote(&finalizer, &event, 1, &[0]).await;
    assert!(first.decision.is_none());
    assert!(!store.load_event(&event.id).await.unwrap().auto_decision_reached);

    let second = vote(&finalizer, &event, 2, &[0, 2]).await;
    let decision = second.decision.expect("second registration reaches the threshold");
    assert_eq!(
        decision.description,
        "[Game night] 2 or more participants have responded. The most popular date is:\nDate: 2025/06/01"
    );
    assert!(store.load_event(&event.id).await.unwrap().auto_decision_reached);

    let third = vote(&finalizer, &event, 3, &[1]).await;
    assert!(third.decision.is_none());
    assert_eq!(store.list_decision_records(&event.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn threshold_of_zero_fires_on_first_check() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, auto_decision(0)).await;

    let decision = finalizer.check_auto_decision(&event.id).await.unwrap().unwrap();
    assert_eq!(
        decision.description,
        "[Game night] 0 or more participants have responded, but no candidate date received any votes."
    );
}

#[tokio::test]
async fn disabled_auto_decision_never_fires() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(
        &*store,
        EventSettings { auto_decision_threshold: 1, ..EventSettings::default() },
    )
    .await;

    let registration = vote(&finalizer, &event, 1, &[0]).await;
    assert!(registration.decision.is_none());
    assert!(store.list_decision_records(&event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn changing_threshold_rearms_auto_decision() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, auto_decision(1)).await;
    assert!(vote(&finalizer, &event, 1, &[0]).await.decision.is_some());

    let updated = finalizer.update_settings(&event.id, auto_decision(2)).await.unwrap();
    assert!(!updated.auto_decision_reached);

    let again = vote(&finalizer, &event, 2, &[1]).await;
    let decision = again.decision.expect("re-armed trigger fires again");
    assert!(decision.description.contains("several dates share the most votes"));
    assert_eq!(store.list_decision_records(&event.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unchanged_threshold_keeps_latch() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, auto_decision(1)).await;
    vote(&finalizer, &event, 1, &[0]).await;

    let updated = finalizer
        .update_settings(&event.id, EventSettings { rss_enabled: true, ..auto_decision(1) })
        .await
        .unwrap();
    assert!(updated.auto_decision_reached);
    assert!(updated.settings.rss_enabled);
}

#[tokio::test]
async fn moving_the_deadline_rearms_the_sweep() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;
    finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();

    let moved = EventSettings {
        deadline_enable: true,
        deadline: Some(Utc::now() - Duration::minutes(5)),
        ..EventSettings::default()
    };
    let updated = finalizer.update_settings(&event.id, moved).await.unwrap();
    assert!(!updated.deadline_reached);

    let report = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();
    assert_eq!(report.finalized, vec![event.id.clone()]);
    assert_eq!(store.list_decision_records(&event.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn disabling_the_deadline_clears_it_without_rearming() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, past_deadline()).await;
    finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();

    let updated = finalizer
        .update_settings(
            &event.id,
            EventSettings {
                deadline_enable: false,
                deadline: Some(Utc::now()),
                ..EventSettings::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.settings.deadline, None);
    assert!(updated.deadline_reached);
}

#[tokio::test]
async fn locked_settings_are_forbidden() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(
        &*store,
        EventSettings { allow_setting_changes: false, ..auto_decision(3) },
    )
    .await;

    let err = finalizer.update_settings(&event.id, auto_decision(1)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let unchanged = store.load_event(&event.id).await.unwrap();
    assert_eq!(unchanged.settings.auto_decision_threshold, 3);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let (_store, finalizer) = memory_finalizer();
    assert!(matches!(
        finalizer.check_auto_decision("missing").await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        finalizer.update_settings("missing", EventSettings::default()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn registration_with_foreign_date_is_rejected() {
    let (store, finalizer) = memory_finalizer();
    let event = seed_event(&*store, auto_decision(1)).await;
    let other = seed_event(&*store, EventSettings::default()).await;

    let err = finalizer
        .register_participant(
            &event.id,
            NewParticipant {
                id: 1,
                name: "Kai".to_string(),
                responses: vec![NewResponse {
                    candidate_date_id: other.candidate_dates[0].id,
                    status: ResponseStatus::Available,
                }],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    let event = store.load_event(&event.id).await.unwrap();
    assert!(event.participants.is_empty());
    assert!(!event.auto_decision_reached);
}

/// Delegates to a `MemoryStore` but fails to record decisions for one event.
struct FailingStore {
    inner: MemoryStore,
    broken_event: std::sync::Mutex<Option<String>>,
}

#[async_trait]
impl VoteStore for FailingStore {
    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        self.inner.create_event(new).await
    }

    async fn load_event(&self, id: &str) -> Result<Event, AppError> {
        self.inner.load_event(id).await
    }

    async fn load_all_events(&self) -> Result<Vec<Event>, AppError> {
        self.inner.load_all_events().await
    }

    async fn save_settings(&self, id: &str, settings: &EventSettings, rearm: &[Trigger]) -> Result<(), AppError> {
        self.inner.save_settings(id, settings, rearm).await
    }

    async fn create_participant_with_responses(
        &self,
        event_id: &str,
        new: NewParticipant,
    ) -> Result<Participant, AppError> {
        self.inner.create_participant_with_responses(event_id, new).await
    }

    async fn count_participants(&self, event_id: &str) -> Result<i64, AppError> {
        self.inner.count_participants(event_id).await
    }

    async fn record_decision(
        &self,
        event_id: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
        record: NewFeedItem,
    ) -> Result<Option<FeedItem>, AppError> {
        let broken = self.broken_event.lock().unwrap().clone();
        if broken.as_deref() == Some(event_id) {
            return Err(AppError::Storage("disk full".to_string()));
        }
        self.inner.record_decision(event_id, trigger, now, record).await
    }

    async fn list_decision_records(&self, event_id: &str) -> Result<Vec<FeedItem>, AppError> {
        self.inner.list_decision_records(event_id).await
    }
}

#[tokio::test]
async fn one_failing_event_does_not_stop_the_sweep() {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        broken_event: std::sync::Mutex::new(None),
    });
    let finalizer = finalizer_over(store.clone());

    let broken = seed_event(&*store, past_deadline()).await;
    let healthy = seed_event(&*store, past_deadline()).await;
    *store.broken_event.lock().unwrap() = Some(broken.id.clone());

    let report = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();

    assert_eq!(report.finalized, vec![healthy.id.clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, broken.id);
    assert!(report.failed[0].1.contains("disk full"));
    assert!(!report.is_clean());

    // The failed event stays armed and is picked up once storage recovers.
    assert!(!store.load_event(&broken.id).await.unwrap().deadline_reached);
    *store.broken_event.lock().unwrap() = None;
    let retry = finalizer.finalize_due_deadlines(Utc::now()).await.unwrap();
    assert_eq!(retry.finalized, vec![broken.id.clone()]);
}

/// Delegates to a `MemoryStore`, but applies `interleaved` settings right
/// before the first decision is recorded, as an organizer editing the event
/// while a sweep or registration is in flight would.
struct EditDuringClaimStore {
    inner: MemoryStore,
    interleaved: std::sync::Mutex<Option<(EventSettings, Vec<Trigger>)>>,
}

impl EditDuringClaimStore {
    fn new(settings: EventSettings, rearm: Vec<Trigger>) -> Self {
        EditDuringClaimStore {
            inner: MemoryStore::new(),
            interleaved: std::sync::Mutex::new(Some((settings, rearm))),
        }
    }
}

#[async_trait]
impl VoteStore for EditDuringClaimStore {
    async fn create_event(&self, new: NewEvent) -> Result<Event, AppError> {
        self.inner.create_event(new).await
    }

    async fn load_event(&self, id: &str) -> Result<Event, AppError> {
        self.inner.load_event(id).await
    }

    async fn load_all_events(&self) -> Result<Vec<Event>, AppError> {
        self.inner.load_all_events().await
    }

    async fn save_settings(&self, id: &str, settings: &EventSettings, rearm: &[Trigger]) -> Result<(), AppError> {
        self.inner.save_settings(id, settings, rearm).await
    }

    async fn create_participant_with_responses(
        &self,
        event_id: &str,
        new: NewParticipant,
    ) -> Result<Participant, AppError> {
        self.inner.create_participant_with_responses(event_id, new).await
    }

    async fn count_participants(&self, event_id: &str) -> Result<i64, AppError> {
        self.inner.count_participants(event_id).await
    }

    async fn record_decision(
        &self,
        event_id: &str,
        trigger: Trigger,
        now: DateTime<Utc>,
        record: NewFeedItem,
    ) -> Result<Option<FeedItem>, AppError> {
        let edit = self.interleaved.lock().unwrap().take();
        if let Some((settings, rearm)) = edit {
            self.inner.save_settings(event_id, &settings, &rearm).await?;
        }
        self.inner.record_decision(event_id, trigger, now, record).await
    }

    async fn list_decision_records(&self, event_id: &str) -> Result<Vec<FeedItem>, AppError> {
        self.inner.list_decision_records(event_id).await
    }
}

#[tokio::test]
async fn deadline_moved_during_sweep_is_not_fired_early() {
    let now = Utc::now();
    let real_deadline = now + Duration::days(7);
    let store = Arc::new(EditDuringClaimStore::new(
        EventSettings {
            deadline_enable: true,
            deadline: Some(real_deadline),
            ..EventSettings::default()
        },
        vec![Trigger::Deadline],
    ));
    let finalizer = finalizer_over(store.clone());
    let event = seed_event(&*store, past_deadline()).await;

    let report = finalizer.finalize_due_deadlines(now).await.unwrap();
    assert!(report.finalized.is_empty());
    assert_eq!(report.contended, 1);
    assert!(store.list_decision_records(&event.id).await.unwrap().is_empty());
    assert!(!store.load_event(&event.id).await.unwrap().deadline_reached);

    // The moved deadline still fires once it has really passed.
    let later = finalizer.finalize_due_deadlines(real_deadline + Duration::days(1)).await.unwrap();
    assert_eq!(later.finalized, vec![event.id.clone()]);
}

#[tokio::test]
async fn threshold_raised_during_check_is_not_fired_early() {
    let store = Arc::new(EditDuringClaimStore::new(auto_decision(3), vec![Trigger::AutoDecision]));
    let finalizer = finalizer_over(store.clone());
    let event = seed_event(&*store, auto_decision(1)).await;

    let first = vote(&finalizer, &event, 1, &[0]).await;
    assert!(first.decision.is_none());
    assert!(!store.load_event(&event.id).await.unwrap().auto_decision_reached);

    vote(&finalizer, &event, 2, &[0]).await;
    let third = vote(&finalizer, &event, 3, &[1]).await;
    let decision = third.decision.expect("raised threshold is reached by the third registration");
    assert!(decision.description.starts_with("[Game night] 3 or more participants have responded."));
}
