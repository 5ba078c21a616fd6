//! Request and response bodies of the JSON API.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::event::EventSettings;
use crate::models::participant::{NewParticipant, NewResponse, ResponseStatus};
use super::validate;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub creator_name: String,
    /// RFC 3339 timestamps.
    #[serde(default)]
    pub candidate_dates: Vec<String>,
    #[serde(default)]
    pub settings: SettingsRequest,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettingsRequest {
    pub allow_setting_changes: bool,
    pub deadline_enable: bool,
    pub deadline: Option<String>,
    pub auto_decision_enable: bool,
    pub auto_decision_threshold: i64,
    pub rss_enabled: bool,
}

impl Default for SettingsRequest {
    fn default() -> Self {
        SettingsRequest {
            allow_setting_changes: true,
            deadline_enable: false,
            deadline: None,
            auto_decision_enable: false,
            auto_decision_threshold: 0,
            rss_enabled: false,
        }
    }
}

impl SettingsRequest {
    /// Validate and convert. The deadline is only read while it is enabled.
    pub fn into_settings(self) -> Result<EventSettings, Vec<String>> {
        let mut errors = Vec::new();

        let deadline = if self.deadline_enable {
            match self.deadline.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                Some(raw) => match validate::parse_timestamp(raw, "Deadline") {
                    Ok(dt) => Some(dt),
                    Err(e) => {
                        errors.push(e);
                        None
                    }
                },
                None => {
                    errors.push("Deadline is required when the deadline is enabled".to_string());
                    None
                }
            }
        } else {
            None
        };
        if let Some(e) = validate::validate_threshold(self.auto_decision_threshold) {
            errors.push(e);
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(EventSettings {
            allow_setting_changes: self.allow_setting_changes,
            deadline_enable: self.deadline_enable,
            deadline,
            auto_decision_enable: self.auto_decision_enable,
            auto_decision_threshold: self.auto_decision_threshold,
            rss_enabled: self.rss_enabled,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateDateRef {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterParticipantRequest {
    pub participant_id: i64,
    pub name: String,
    #[serde(default)]
    pub available_candidate_dates: Vec<CandidateDateRef>,
    #[serde(default)]
    pub unavailable_candidate_dates: Vec<CandidateDateRef>,
    #[serde(default)]
    pub maybe_candidate_dates: Vec<CandidateDateRef>,
}

impl RegisterParticipantRequest {
    pub fn into_new_participant(self) -> Result<NewParticipant, AppError> {
        let mut errors = Vec::new();
        if let Some(e) = validate::validate_participant_id(self.participant_id) {
            errors.push(e);
        }
        if let Some(e) = validate::validate_required(&self.name, "Name", validate::NAME_MAX_LEN) {
            errors.push(e);
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }

        let answers = [
            (ResponseStatus::Available, self.available_candidate_dates),
            (ResponseStatus::Unavailable, self.unavailable_candidate_dates),
            (ResponseStatus::Maybe, self.maybe_candidate_dates),
        ];
        let responses = answers
            .into_iter()
            .flat_map(|(status, dates)| {
                dates
                    .into_iter()
                    .map(move |d| NewResponse { candidate_date_id: d.id, status })
            })
            .collect();

        Ok(NewParticipant {
            id: self.participant_id,
            name: self.name.trim().to_string(),
            responses,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
