use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::session::require_user_id;
use crate::calendar;
use crate::errors::AppError;

/// GET /api/calendar/today
pub async fn today(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let agenda = calendar::today(pool.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(agenda))
}

/// GET /api/calendar/date/{date}
pub async fn on_date(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let day = calendar::parse_day(&path)?;
    let agenda = calendar::on_date(pool.get_ref(), user_id, day).await?;
    Ok(HttpResponse::Ok().json(agenda))
}

/// GET /api/calendar/week/{date}
pub async fn week(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let week_start = calendar::parse_day(&path)?;
    let agenda = calendar::week(pool.get_ref(), user_id, week_start).await?;
    Ok(HttpResponse::Ok().json(agenda))
}
