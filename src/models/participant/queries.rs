use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

#[derive(sqlx::FromRow)]
pub(crate) struct ResponseRow {
    pub id: i64,
    pub event_id: String,
    pub participant_id: i64,
    pub candidate_date_id: i64,
    pub status: String,
}

impl ResponseRow {
    pub(crate) fn into_response(self) -> Result<Response, AppError> {
        let status = self
            .status
            .parse::<ResponseStatus>()
            .map_err(|e| AppError::Storage(format!("response {}: {e}", self.id)))?;
        Ok(Response {
            id: self.id,
            participant_id: self.participant_id,
            candidate_date_id: self.candidate_date_id,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ParticipantRow {
    pub id: i64,
    pub event_id: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Insert a participant and all of their responses in one transaction.
///
/// A participant id already used within the event yields `AppError::Conflict`.
pub async fn insert_with_responses(
    pool: &PgPool,
    event_id: &str,
    new: &NewParticipant,
) -> Result<Participant, AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query_as::<_, ParticipantRow>(
        "INSERT INTO participants (event_id, id, name) VALUES ($1, $2, $3) \
         RETURNING id, event_id, name, created_at",
    )
    .bind(event_id)
    .bind(new.id)
    .bind(&new.name)
    .fetch_one(&mut *tx)
    .await;

    let row = match inserted {
        Ok(row) => row,
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::Conflict(format!(
                "Participant {} is already registered for this event",
                new.id
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let mut responses = Vec::with_capacity(new.responses.len());
    for answer in &new.responses {
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO responses (event_id, participant_id, candidate_date_id, status) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(event_id)
        .bind(new.id)
        .bind(answer.candidate_date_id)
        .bind(answer.status.as_str())
        .fetch_one(&mut *tx)
        .await?;

        responses.push(Response {
            id,
            participant_id: new.id,
            candidate_date_id: answer.candidate_date_id,
            status: answer.status,
        });
    }

    tx.commit().await?;

    Ok(Participant {
        id: row.id,
        event_id: row.event_id,
        name: row.name,
        created_at: row.created_at,
        responses,
    })
}

/// Number of participants registered for an event.
pub async fn count_for_event(pool: &PgPool, event_id: &str) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM participants WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
