use actix_web::{HttpResponse, web};

use crate::decision::Finalizer;
use crate::errors::AppError;
use crate::feed;

/// GET /api/v1/rss/{id}/feed - RSS document of an event's decisions
pub async fn rss(
    finalizer: web::Data<Finalizer>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let event_id = path.into_inner();
    let event = finalizer.store().load_event(&event_id).await?;
    if !event.settings.rss_enabled {
        return Err(AppError::NotFound("RSS is not enabled for this event".to_string()));
    }

    let items = finalizer.store().list_decision_records(&event_id).await?;
    let body = feed::render_rss(&event, &items, finalizer.config())?;

    Ok(HttpResponse::Ok().content_type(feed::CONTENT_TYPE).body(body))
}
