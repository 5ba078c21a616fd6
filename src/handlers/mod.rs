pub mod api_types;
pub mod event_handlers;
pub mod feed_handlers;
pub mod participant_handlers;
pub mod validate;

use actix_cors::Cors;
use actix_web::{
    Error, HttpRequest, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    error::JsonPayloadError,
    http::{Method, header},
    middleware::Next,
    web,
};

use crate::errors::AppError;

/// Rejects POST/PUT requests whose body is not declared as JSON.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == Method::POST || method == Method::PUT {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = serde_json::json!({
                "error": "Content-Type must be application/json"
            });
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Malformed JSON bodies are reported like any other validation failure.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    AppError::Validation(format!("Invalid request body: {err}")).into()
}

/// GET /
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "rendezvous scheduling service",
        "status": "ok",
    }))
}

/// GET /health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "healthy" }))
}

/// Configure all routes.
/// CORS policy for browser frontends. `*` in `origins` admits any origin.
pub fn cors(origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT]);

    if origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin().send_wildcard();
    }
    origins.iter().fold(cors, |cors, origin| cors.allowed_origin(origin))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health));
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .service(
                web::scope("/events")
                    .wrap(actix_web::middleware::from_fn(require_json_content_type))
                    .route("", web::post().to(event_handlers::create))
                    .route("/{id}", web::get().to(event_handlers::read))
                    .route("/{id}/participant", web::post().to(participant_handlers::register))
                    .route("/{id}/settings", web::put().to(event_handlers::update_settings)),
            )
            .route("/rss/{id}/feed", web::get().to(feed_handlers::rss)),
    );
}
