use chrono::{DateTime, Utc};

pub const TITLE_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 2000;
pub const NAME_MAX_LEN: usize = 100;

/// Validate a required text field with a max length.
pub fn validate_required(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(format!("{field_name} is required"));
    }
    if trimmed.chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Validate an optional text field with a max length (empty is OK).
pub fn validate_optional(value: &str, field_name: &str, max_len: usize) -> Option<String> {
    if value.trim().chars().count() > max_len {
        return Some(format!("{field_name} must be at most {max_len} characters"));
    }
    None
}

/// Parse an RFC 3339 timestamp (date, time and UTC offset) into UTC.
pub fn parse_timestamp(value: &str, field_name: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| format!("{field_name} must be an RFC 3339 timestamp, got '{value}'"))
}

pub fn validate_threshold(threshold: i64) -> Option<String> {
    if threshold < 0 {
        return Some("Auto-decision threshold must not be negative".to_string());
    }
    None
}

pub fn validate_participant_id(id: i64) -> Option<String> {
    if id <= 0 {
        return Some("Participant id must be a positive integer".to_string());
    }
    None
}
