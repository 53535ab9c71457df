pub mod auth_handlers;
pub mod calendar_handlers;
pub mod case_handlers;

use actix_web::{HttpResponse, middleware::from_fn, web};
use serde_json::json;

use crate::auth::middleware::{require_auth, require_json_content_type};

/// GET /api/health
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// JSON 404 for anything no route matched.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Not found" }))
}

/// Register the `/api` routes. Everything except health and login needs a session.
///
/// Unmatched `/api` paths fall through to the app's default service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(json!({ "message": err.to_string() }));
        actix_web::error::InternalError::from_response(err, response).into()
    }));
    cfg.app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::NotFound().json(json!({ "message": "Not found" }));
        actix_web::error::InternalError::from_response(err, response).into()
    }));
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            .route("/health", web::get().to(health))
            .route("/auth/login", web::post().to(auth_handlers::login))
            .service(
                web::resource("/auth/logout")
                    .wrap(from_fn(require_auth))
                    .route(web::post().to(auth_handlers::logout)),
            )
            .service(
                web::resource("/auth/me")
                    .wrap(from_fn(require_auth))
                    .route(web::get().to(auth_handlers::me)),
            )
            .service(
                web::scope("/calendar")
                    .wrap(from_fn(require_auth))
                    .route("/today", web::get().to(calendar_handlers::today))
                    .route("/date/{date}", web::get().to(calendar_handlers::on_date))
                    .route("/week/{date}", web::get().to(calendar_handlers::week)),
            )
            .service(
                web::scope("/cases")
                    .wrap(from_fn(require_auth))
                    .route("", web::get().to(case_handlers::list))
                    .route("", web::post().to(case_handlers::create))
                    .route("/{id}", web::get().to(case_handlers::read))
                    .route("/{id}", web::put().to(case_handlers::update))
                    .route("/{id}/dates", web::post().to(case_handlers::add_date))
                    .route("/{id}/notes", web::post().to(case_handlers::add_note)),
            ),
    );
}
