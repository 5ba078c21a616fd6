use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability a participant gives for one candidate date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Available,
    Maybe,
    Unavailable,
}

impl ResponseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseStatus::Available => "available",
            ResponseStatus::Maybe => "maybe",
            ResponseStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ResponseStatus::Available),
            "maybe" => Ok(ResponseStatus::Maybe),
            "unavailable" => Ok(ResponseStatus::Unavailable),
            other => Err(format!("unknown response status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub participant_id: i64,
    pub candidate_date_id: i64,
    pub status: ResponseStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub event_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub responses: Vec<Response>,
}

/// Registration input: the participant and all of their answers.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub id: i64,
    pub name: String,
    pub responses: Vec<NewResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewResponse {
    pub candidate_date_id: i64,
    pub status: ResponseStatus,
}
