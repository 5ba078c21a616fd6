//! Process configuration read from the environment.
//!
//! `main` loads a `.env` file through `dotenvy` first, so every value here can
//! come from either source. Only `DATABASE_URL` is required.

use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use crate::errors::AppError;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_FRONTEND_URL: &str = "https://localhost:3000";
const DEFAULT_DISPLAY_OFFSET: &str = "+09:00";
const DEFAULT_CORS_ORIGINS: &str = "*";

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_attempts: u32,
    pub connect_retry: Duration,
}

/// Settings the decision engine needs to build its outcome records.
#[derive(Debug, Clone)]
pub struct FinalizeConfig {
    pub frontend_url: String,
    pub display_offset: FixedOffset,
}

impl FinalizeConfig {
    /// Link to the voting page of an event.
    pub fn vote_link(&self, event_id: &str) -> String {
        format!("{}/{}/vote", self.frontend_url.trim_end_matches('/'), event_id)
    }
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        FinalizeConfig {
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            display_offset: FixedOffset::east_opt(9 * 3600).unwrap_or_else(utc_offset),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub bind_addr: String,
    pub finalize: FinalizeConfig,
    pub sweep_interval: Duration,
    /// Origins allowed by CORS; `*` admits any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let url = get("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL environment variable is not set".to_string()))?;

        let bind_addr = match (get("BIND_ADDR"), get("PORT")) {
            (Some(addr), _) => addr,
            (None, Some(port)) => format!("0.0.0.0:{}", port.trim()),
            (None, None) => DEFAULT_BIND_ADDR.to_string(),
        };

        let offset_raw = get("DISPLAY_UTC_OFFSET").unwrap_or_else(|| DEFAULT_DISPLAY_OFFSET.to_string());
        let display_offset = parse_utc_offset(&offset_raw)
            .ok_or_else(|| AppError::Config(format!("DISPLAY_UTC_OFFSET is not a valid offset: '{offset_raw}'")))?;

        Ok(AppConfig {
            database: DatabaseConfig {
                url,
                max_connections: parse_number(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", 8)?,
                connect_attempts: parse_number(get("DB_CONNECT_ATTEMPTS"), "DB_CONNECT_ATTEMPTS", 4)?.max(1),
                connect_retry: Duration::from_secs(parse_number(get("DB_CONNECT_RETRY_SECS"), "DB_CONNECT_RETRY_SECS", 20)?),
            },
            bind_addr,
            finalize: FinalizeConfig {
                frontend_url: get("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string()),
                display_offset,
            },
            sweep_interval: Duration::from_secs(parse_number(get("SWEEP_INTERVAL_SECS"), "SWEEP_INTERVAL_SECS", 60)?.max(1)),
            cors_allowed_origins: parse_origins(&get("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())),
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T, AppError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} must be a non-negative integer, got '{v}'"))),
    }
}

/// Split a comma separated origin list, dropping blanks and trailing slashes.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.iter().any(|o| o == "*") {
        vec!["*".to_string()]
    } else {
        origins
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`.
pub fn parse_utc_offset(input: &str) -> Option<FixedOffset> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("z") || input.eq_ignore_ascii_case("utc") {
        return Some(utc_offset());
    }
    let (sign, rest) = match input.as_bytes().first()? {
        b'+' => (1, &input[1..]),
        b'-' => (-1, &input[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
