use chrono::{DateTime, FixedOffset, Utc};

use super::latch::Trigger;
use crate::config::FinalizeConfig;
use crate::models::event::{CandidateDate, Event};
use crate::models::feed_item::NewFeedItem;

/// Calendar format used for dates inside outcome messages.
pub const DISPLAY_DATE_FORMAT: &str = "%Y/%m/%d";

/// Classification of a tally result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<'a> {
    NoVotes,
    Decided(&'a CandidateDate),
    Tied(Vec<&'a CandidateDate>),
}

impl<'a> Outcome<'a> {
    pub fn from_winners(mut winners: Vec<&'a CandidateDate>) -> Self {
        match winners.len() {
            0 => Outcome::NoVotes,
            1 => Outcome::Decided(winners.remove(0)),
            _ => Outcome::Tied(winners),
        }
    }

    pub fn winner_count(&self) -> usize {
        match self {
            Outcome::NoVotes => 0,
            Outcome::Decided(_) => 1,
            Outcome::Tied(dates) => dates.len(),
        }
    }
}

/// The deadline trigger fires once the deadline is enabled, set, in the past,
/// and its latch is still armed.
pub fn deadline_due(event: &Event, now: DateTime<Utc>) -> bool {
    let settings = &event.settings;
    settings.deadline_enable
        && settings.deadline.is_some_and(|deadline| deadline < now)
        && !event.latch(Trigger::Deadline).is_fired()
}

/// The auto-decision trigger fires once enough participants have registered
/// and its latch is still armed.
pub fn threshold_met(event: &Event, participant_count: i64) -> bool {
    let settings = &event.settings;
    settings.auto_decision_enable
        && !event.latch(Trigger::AutoDecision).is_fired()
        && participant_count >= settings.auto_decision_threshold
}

pub fn format_date(date: &CandidateDate, offset: &FixedOffset) -> String {
    date.date_time.with_timezone(offset).format(DISPLAY_DATE_FORMAT).to_string()
}

/// Human-readable outcome for one firing of `trigger`.
pub fn compose_message(event: &Event, trigger: Trigger, outcome: &Outcome<'_>, offset: &FixedOffset) -> String {
    let title = &event.title;
    let lead = match trigger {
        Trigger::Deadline => "The deadline has passed".to_string(),
        Trigger::AutoDecision => format!(
            "{} or more participants have responded",
            event.settings.auto_decision_threshold
        ),
    };

    match outcome {
        Outcome::NoVotes => {
            format!("[{title}] {lead}, but no candidate date received any votes.")
        }
        Outcome::Decided(date) => {
            format!(
                "[{title}] {lead}. The most popular date is:\nDate: {}",
                format_date(date, offset)
            )
        }
        Outcome::Tied(dates) => {
            let listed: Vec<String> = dates.iter().map(|d| format_date(d, offset)).collect();
            format!(
                "[{title}] {lead}, but several dates share the most votes.\nDates: {}",
                listed.join(", ")
            )
        }
    }
}

/// The record published when `trigger` fires for `event`.
pub fn decision_record(event: &Event, trigger: Trigger, outcome: &Outcome<'_>, config: &FinalizeConfig) -> NewFeedItem {
    NewFeedItem {
        event_id: event.id.clone(),
        title: event.title.clone(),
        link: config.vote_link(&event.id),
        description: compose_message(event, trigger, outcome, &config.display_offset),
    }
}
