use actix_web::{HttpResponse, web};

use crate::decision::Finalizer;
use crate::errors::AppError;
use super::api_types::RegisterParticipantRequest;

/// POST /api/v1/events/{id}/participant - Register a participant and their answers
///
/// The auto-decision check runs before the response is sent, so a decision
/// reached by this registration is already in the feed when the client sees 201.
pub async fn register(
    finalizer: web::Data<Finalizer>,
    path: web::Path<String>,
    body: web::Json<RegisterParticipantRequest>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let new = body.into_inner().into_new_participant()?;

    let registration = finalizer.register_participant(&event_id, new).await?;
    if registration.decision.is_some() {
        log::info!("Registration of participant {} decided event {}", registration.participant.id, event_id);
    }

    Ok(HttpResponse::Created().json(registration.participant))
}
