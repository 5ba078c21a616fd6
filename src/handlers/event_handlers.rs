use actix_web::{HttpResponse, web};

use crate::decision::Finalizer;
use crate::errors::AppError;
use crate::models::event::{self, NewEvent};
use super::api_types::{CreateEventRequest, CreateEventResponse, MessageResponse, SettingsRequest};
use super::validate;

/// POST /api/v1/events - Create an event with its candidate dates
pub async fn create(
    finalizer: web::Data<Finalizer>,
    body: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();

    let mut errors = Vec::new();
    if let Some(e) = validate::validate_required(&req.title, "Title", validate::TITLE_MAX_LEN) {
        errors.push(e);
    }
    if let Some(e) = validate::validate_optional(&req.description, "Description", validate::DESCRIPTION_MAX_LEN) {
        errors.push(e);
    }
    if let Some(e) = validate::validate_optional(&req.creator_name, "Creator name", validate::NAME_MAX_LEN) {
        errors.push(e);
    }
    if req.candidate_dates.is_empty() {
        errors.push("At least one candidate date is required".to_string());
    }
    let mut candidate_dates = Vec::with_capacity(req.candidate_dates.len());
    for raw in &req.candidate_dates {
        match validate::parse_timestamp(raw, "Candidate date") {
            Ok(dt) => candidate_dates.push(dt),
            Err(e) => errors.push(e),
        }
    }
    let settings = match req.settings.into_settings() {
        Ok(s) => Some(s),
        Err(mut e) => {
            errors.append(&mut e);
            None
        }
    };

    let settings = match settings {
        Some(s) if errors.is_empty() => s,
        _ => return Err(AppError::Validation(errors.join("; "))),
    };

    let new = NewEvent {
        id: event::generate_id(),
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        creator_name: req.creator_name.trim().to_string(),
        candidate_dates,
        settings,
    };
    let created = finalizer.store().create_event(new).await?;
    log::info!(
        "Created event {} with {} candidate dates",
        created.id,
        created.candidate_dates.len()
    );

    Ok(HttpResponse::Created().json(CreateEventResponse { id: created.id }))
}

/// GET /api/v1/events/{id} - Event with candidate dates, responses and participants
pub async fn read(
    finalizer: web::Data<Finalizer>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event = finalizer.store().load_event(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(event))
}

/// PUT /api/v1/events/{id}/settings - Replace the settings block
pub async fn update_settings(
    finalizer: web::Data<Finalizer>,
    path: web::Path<String>,
    body: web::Json<SettingsRequest>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let settings = body
        .into_inner()
        .into_settings()
        .map_err(|errors| AppError::Validation(errors.join("; ")))?;

    finalizer.update_settings(&event_id, settings).await?;

    Ok(HttpResponse::Ok().json(MessageResponse { message: "Settings updated".to_string() }))
}
