use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::latch::{Latch, Trigger};
use crate::models::participant::{Participant, Response};

/// Per-event configuration block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSettings {
    pub allow_setting_changes: bool,
    pub deadline_enable: bool,
    /// Only meaningful while `deadline_enable` is set.
    pub deadline: Option<DateTime<Utc>>,
    pub auto_decision_enable: bool,
    pub auto_decision_threshold: i64,
    pub rss_enabled: bool,
}

impl Default for EventSettings {
    fn default() -> Self {
        EventSettings {
            allow_setting_changes: true,
            deadline_enable: false,
            deadline: None,
            auto_decision_enable: false,
            auto_decision_threshold: 0,
            rss_enabled: false,
        }
    }
}

/// A poll with its candidate dates and participants loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub creator_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deadline_reached: bool,
    pub auto_decision_reached: bool,
    #[serde(flatten)]
    pub settings: EventSettings,
    pub candidate_dates: Vec<CandidateDate>,
    pub participants: Vec<Participant>,
}

impl Event {
    pub fn latch(&self, trigger: Trigger) -> Latch {
        match trigger {
            Trigger::Deadline => Latch::from_reached(self.deadline_reached),
            Trigger::AutoDecision => Latch::from_reached(self.auto_decision_reached),
        }
    }

    pub fn set_latch(&mut self, trigger: Trigger, latch: Latch) {
        match trigger {
            Trigger::Deadline => self.deadline_reached = latch.is_fired(),
            Trigger::AutoDecision => self.auto_decision_reached = latch.is_fired(),
        }
    }

    pub fn candidate_date(&self, id: i64) -> Option<&CandidateDate> {
        self.candidate_dates.iter().find(|d| d.id == id)
    }
}

/// One proposed date, annotated with every answer given for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDate {
    pub id: i64,
    pub event_id: String,
    pub date_time: DateTime<Utc>,
    pub responses: Vec<Response>,
}

/// Input for creating an event together with its candidate dates.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub creator_name: String,
    pub candidate_dates: Vec<DateTime<Utc>>,
    pub settings: EventSettings,
}
