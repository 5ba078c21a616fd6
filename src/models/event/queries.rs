use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::decision::latch::Trigger;
use crate::errors::AppError;
use crate::models::participant::Participant;
use crate::models::participant::queries::{ParticipantRow, ResponseRow};
use super::types::*;

const EVENT_COLUMNS: &str = "id, title, description, creator_name, created_at, updated_at, \
     deadline_reached, auto_decision_reached, allow_setting_changes, deadline_enable, deadline, \
     auto_decision_enable, auto_decision_threshold, rss_enabled";

#[derive(sqlx::FromRow)]
struct EventRow {
    id: String,
    title: String,
    description: String,
    creator_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deadline_reached: bool,
    auto_decision_reached: bool,
    allow_setting_changes: bool,
    deadline_enable: bool,
    deadline: Option<DateTime<Utc>>,
    auto_decision_enable: bool,
    auto_decision_threshold: i64,
    rss_enabled: bool,
}

impl EventRow {
    fn into_event(self) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            creator_name: self.creator_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deadline_reached: self.deadline_reached,
            auto_decision_reached: self.auto_decision_reached,
            settings: EventSettings {
                allow_setting_changes: self.allow_setting_changes,
                deadline_enable: self.deadline_enable,
                deadline: self.deadline,
                auto_decision_enable: self.auto_decision_enable,
                auto_decision_threshold: self.auto_decision_threshold,
                rss_enabled: self.rss_enabled,
            },
            candidate_dates: Vec::new(),
            participants: Vec::new(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CandidateDateRow {
    id: i64,
    event_id: String,
    date_time: DateTime<Utc>,
}

/// Insert an event and its candidate dates in one transaction.
pub async fn insert(pool: &PgPool, new: &NewEvent) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO events (id, title, description, creator_name, allow_setting_changes, \
         deadline_enable, deadline, auto_decision_enable, auto_decision_threshold, rss_enabled) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&new.id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&new.creator_name)
    .bind(new.settings.allow_setting_changes)
    .bind(new.settings.deadline_enable)
    .bind(new.settings.deadline)
    .bind(new.settings.auto_decision_enable)
    .bind(new.settings.auto_decision_threshold)
    .bind(new.settings.rss_enabled)
    .execute(&mut *tx)
    .await?;

    for date_time in &new.candidate_dates {
        sqlx::query("INSERT INTO candidate_dates (event_id, date_time) VALUES ($1, $2)")
            .bind(&new.id)
            .bind(date_time)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load one event with candidate dates, participants and responses.
pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Event>, AppError> {
    let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let dates = sqlx::query_as::<_, CandidateDateRow>(
        "SELECT id, event_id, date_time FROM candidate_dates WHERE event_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let participants = sqlx::query_as::<_, ParticipantRow>(
        "SELECT id, event_id, name, created_at FROM participants WHERE event_id = $1 ORDER BY created_at, id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let responses = sqlx::query_as::<_, ResponseRow>(
        "SELECT id, event_id, participant_id, candidate_date_id, status \
         FROM responses WHERE event_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let mut events = assemble(vec![row], dates, participants, responses)?;
    Ok(events.pop())
}

/// Load every event with nested collections, for the deadline sweep.
pub async fn find_all(pool: &PgPool) -> Result<Vec<Event>, AppError> {
    let rows = sqlx::query_as::<_, EventRow>(&format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at, id"))
        .fetch_all(pool)
        .await?;

    let dates = sqlx::query_as::<_, CandidateDateRow>(
        "SELECT id, event_id, date_time FROM candidate_dates ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    let participants = sqlx::query_as::<_, ParticipantRow>(
        "SELECT id, event_id, name, created_at FROM participants ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    let responses = sqlx::query_as::<_, ResponseRow>(
        "SELECT id, event_id, participant_id, candidate_date_id, status FROM responses ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    assemble(rows, dates, participants, responses)
}

/// Stitch flat rows into events. Row order is preserved within each event.
fn assemble(
    rows: Vec<EventRow>,
    dates: Vec<CandidateDateRow>,
    participants: Vec<ParticipantRow>,
    responses: Vec<ResponseRow>,
) -> Result<Vec<Event>, AppError> {
    let mut events: Vec<Event> = rows.into_iter().map(EventRow::into_event).collect();
    let index: HashMap<String, usize> = events
        .iter()
        .enumerate()
        .map(|(i, e)| (e.id.clone(), i))
        .collect();

    // Responses grouped by (event, candidate date) and (event, participant).
    let mut by_date: HashMap<(String, i64), Vec<_>> = HashMap::new();
    let mut by_participant: HashMap<(String, i64), Vec<_>> = HashMap::new();
    for row in responses {
        let event_id = row.event_id.clone();
        let response = row.into_response()?;
        by_date
            .entry((event_id.clone(), response.candidate_date_id))
            .or_default()
            .push(response.clone());
        by_participant
            .entry((event_id, response.participant_id))
            .or_default()
            .push(response);
    }

    for row in dates {
        if let Some(&i) = index.get(&row.event_id) {
            let responses = by_date.remove(&(row.event_id.clone(), row.id)).unwrap_or_default();
            events[i].candidate_dates.push(CandidateDate {
                id: row.id,
                event_id: row.event_id,
                date_time: row.date_time,
                responses,
            });
        }
    }

    for row in participants {
        if let Some(&i) = index.get(&row.event_id) {
            let responses = by_participant.remove(&(row.event_id.clone(), row.id)).unwrap_or_default();
            events[i].participants.push(Participant {
                id: row.id,
                event_id: row.event_id,
                name: row.name,
                created_at: row.created_at,
                responses,
            });
        }
    }

    Ok(events)
}

/// Persist a settings change and clear the latches listed in `rearm`.
///
/// Latches not listed are left as stored so a concurrent firing is never undone.
pub async fn update_settings(
    pool: &PgPool,
    id: &str,
    settings: &EventSettings,
    rearm: &[Trigger],
) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE events SET \
            allow_setting_changes = $2, \
            deadline_enable = $3, \
            deadline = $4, \
            auto_decision_enable = $5, \
            auto_decision_threshold = $6, \
            rss_enabled = $7, \
            deadline_reached = CASE WHEN $8 THEN FALSE ELSE deadline_reached END, \
            auto_decision_reached = CASE WHEN $9 THEN FALSE ELSE auto_decision_reached END, \
            updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(settings.allow_setting_changes)
    .bind(settings.deadline_enable)
    .bind(settings.deadline)
    .bind(settings.auto_decision_enable)
    .bind(settings.auto_decision_threshold)
    .bind(settings.rss_enabled)
    .bind(rearm.contains(&Trigger::Deadline))
    .bind(rearm.contains(&Trigger::AutoDecision))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Event not found".to_string()));
    }
    Ok(())
}

/// Flip a trigger's latch from armed to fired, if its guard holds in the stored row.
///
/// Returns `false` when the latch was already fired, or when the deadline or
/// threshold no longer qualifies at `now`.
pub async fn claim_latch<'e>(
    exec: impl PgExecutor<'e>,
    id: &str,
    trigger: Trigger,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let query = match trigger {
        Trigger::Deadline => sqlx::query(
            "UPDATE events SET deadline_reached = TRUE, updated_at = NOW() \
             WHERE id = $1 AND deadline_reached = FALSE \
               AND deadline_enable AND deadline IS NOT NULL AND deadline < $2",
        )
        .bind(id)
        .bind(now),
        Trigger::AutoDecision => sqlx::query(
            "UPDATE events SET auto_decision_reached = TRUE, updated_at = NOW() \
             WHERE id = $1 AND auto_decision_reached = FALSE AND auto_decision_enable \
               AND auto_decision_threshold <= \
                   (SELECT COUNT(*) FROM participants WHERE event_id = $1)",
        )
        .bind(id),
    };
    let result = query.execute(exec).await?;
    Ok(result.rows_affected() == 1)
}
