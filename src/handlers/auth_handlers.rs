use std::net::{IpAddr, Ipv4Addr};

use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::auth::{password, rate_limit::LoginLimiter, session, validate};
use crate::errors::AppError;
use crate::models::user;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login
pub async fn login(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    limiter: web::Data<LoginLimiter>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let errors: Vec<String> = validate::validate_email(&body.email)
        .into_iter()
        .chain(validate::validate_password(&body.password))
        .collect();
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    // Checked before touching the database.
    if limiter.is_blocked(ip) {
        log::warn!("Login blocked for {ip}: too many failures");
        return Err(AppError::TooManyRequests);
    }

    let found = user::find_by_email(&pool, &body.email)
        .await?
        .filter(|u| u.is_active);

    match found {
        Some(u) if password::verify_password(&body.password, &u.password) => {
            limiter.clear(ip);
            session::start(&session, &u)?;
            log::info!("User {} logged in", u.id);

            let display = user::find_display_by_id(&pool, u.id)
                .await?
                .ok_or(AppError::NotFound("User"))?;
            Ok(HttpResponse::Ok().json(json!({ "user": display })))
        }
        _ => {
            limiter.record_failure(ip);
            Err(AppError::BadRequest("Invalid credentials".to_string()))
        }
    }
}

/// POST /api/auth/logout
pub async fn logout(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::Ok().json(json!({ "message": "Logged out" }))
}

/// GET /api/auth/me
pub async fn me(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user_id = session::require_user_id(&session)?;
    let display = user::find_display_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(HttpResponse::Ok().json(json!({ "user": display })))
}
