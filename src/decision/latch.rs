//! One-shot latches guarding each decision trigger.
//!
//! Every event carries one latch per [`Trigger`]. A latch starts `Armed`,
//! becomes `Fired` when the trigger records a decision, and only returns to
//! `Armed` when a settings change touches the value the trigger watches.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::event::EventSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Time-based: the configured deadline has passed.
    Deadline,
    /// Threshold-based: enough participants have registered.
    AutoDecision,
}

impl Trigger {
    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Deadline => "deadline",
            Trigger::AutoDecision => "auto_decision",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Latch {
    Armed,
    Fired,
}

impl Latch {
    /// Map the persisted `*_reached` flag onto the latch.
    pub fn from_reached(reached: bool) -> Self {
        if reached { Latch::Fired } else { Latch::Armed }
    }

    pub fn is_fired(self) -> bool {
        self == Latch::Fired
    }
}

/// Triggers whose latch must be re-armed when settings move from `current` to `next`.
///
/// The deadline latch re-arms when the deadline stays enabled and its instant
/// changes; the auto-decision latch re-arms when auto-decision stays enabled and
/// the threshold changes. Nothing else clears a latch.
pub fn rearmed_by(current: &EventSettings, next: &EventSettings) -> Vec<Trigger> {
    let mut rearm = Vec::new();
    if next.deadline_enable && current.deadline != next.deadline {
        rearm.push(Trigger::Deadline);
    }
    if next.auto_decision_enable && current.auto_decision_threshold != next.auto_decision_threshold {
        rearm.push(Trigger::AutoDecision);
    }
    rearm
}
