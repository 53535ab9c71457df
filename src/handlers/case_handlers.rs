use actix_session::Session;
use actix_web::{HttpResponse, web};
use sqlx::PgPool;

use crate::auth::session::{require_role, require_user_id};
use crate::auth::validate;
use crate::errors::AppError;
use crate::models::case::{
    self, CaseFilter, CaseListQuery, CaseRequest, CaseStatus, CaseType, CaseUpdate,
    CaseUpdateRequest, DateType, ImportantDateRequest, NewCase, NewImportantDate, NoteRequest,
};
use crate::models::user::Role;

const DEFAULT_PAGE_SIZE: i64 = 10;

fn parse_filter(query: &CaseListQuery) -> Result<CaseFilter, AppError> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let status = non_empty(&query.status)
        .map(|s| s.parse::<CaseStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let case_type = non_empty(&query.case_type)
        .map(|s| s.parse::<CaseType>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    Ok(CaseFilter { status, case_type })
}

fn validate_case(body: &CaseRequest) -> Result<NewCase, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.client_name, "Client name", 200));
    errors.extend(validate::validate_email(&body.client_email));
    errors.extend(validate::validate_required(&body.client_phone, "Client phone", 50));
    errors.extend(validate::validate_required(&body.description, "Description", 10_000));

    let case_type: Result<CaseType, String> = body.case_type.trim().parse();
    if let Err(e) = &case_type {
        errors.push(format!("Case type is invalid: {e}"));
    }
    let status: Result<CaseStatus, String> = match body.status.as_deref().map(str::trim) {
        None | Some("") => Ok(CaseStatus::default()),
        Some(s) => s.parse(),
    };
    if let Err(e) = &status {
        errors.push(format!("Status is invalid: {e}"));
    }
    let billing_rate = body.billing_rate.unwrap_or(0.0);
    if !billing_rate.is_finite() || billing_rate < 0.0 {
        errors.push("Billing rate must be a non-negative number".to_string());
    }

    match (case_type, status) {
        (Ok(case_type), Ok(status)) if errors.is_empty() => Ok(NewCase {
            client_name: body.client_name.trim().to_string(),
            client_email: body.client_email.trim().to_lowercase(),
            client_phone: body.client_phone.trim().to_string(),
            case_type,
            description: body.description.trim().to_string(),
            status,
            case_manager_id: body.case_manager,
            billing_rate,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// Fields that are present get the same checks as on create.
fn validate_case_update(body: &CaseUpdateRequest) -> Result<CaseUpdate, AppError> {
    let mut errors = Vec::new();
    let mut text = |value: &Option<String>, field: &str, max_len: usize| {
        let value = value.as_deref()?;
        match validate::validate_required(value, field, max_len) {
            Some(e) => {
                errors.push(e);
                None
            }
            None => Some(value.trim().to_string()),
        }
    };
    let client_name = text(&body.client_name, "Client name", 200);
    let client_phone = text(&body.client_phone, "Client phone", 50);
    let description = text(&body.description, "Description", 10_000);

    let client_email = body.client_email.as_deref().and_then(|email| {
        match validate::validate_email(email) {
            Some(e) => {
                errors.push(e);
                None
            }
            None => Some(email.trim().to_lowercase()),
        }
    });
    let case_type = match body.case_type.as_deref().map(str::trim) {
        None => None,
        Some(t) => match t.parse::<CaseType>() {
            Ok(t) => Some(t),
            Err(e) => {
                errors.push(format!("Case type is invalid: {e}"));
                None
            }
        },
    };
    let status = match body.status.as_deref().map(str::trim) {
        None => None,
        Some(s) => match s.parse::<CaseStatus>() {
            Ok(s) => Some(s),
            Err(e) => {
                errors.push(format!("Status is invalid: {e}"));
                None
            }
        },
    };
    if body.billing_rate.is_some_and(|rate| !rate.is_finite() || rate < 0.0) {
        errors.push("Billing rate must be a non-negative number".to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    Ok(CaseUpdate {
        client_name,
        client_email,
        client_phone,
        case_type,
        description,
        status,
        case_manager_id: body.case_manager,
        billing_rate: body.billing_rate,
    })
}

fn validate_important_date(body: &ImportantDateRequest) -> Result<NewImportantDate, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.title, "Title", 200));
    errors.extend(validate::validate_optional(body.description.as_deref(), "Description", 2_000));

    let date = validate::parse_timestamp(&body.date);
    if date.is_none() {
        errors.push("Date must be a valid ISO 8601 timestamp".to_string());
    }
    let date_type: Result<DateType, String> = match body.date_type.as_deref().map(str::trim) {
        None | Some("") => Ok(DateType::default()),
        Some(t) => t.parse(),
    };
    if let Err(e) = &date_type {
        errors.push(format!("Type is invalid: {e}"));
    }

    match (date, date_type) {
        (Some(date), Ok(date_type)) if errors.is_empty() => Ok(NewImportantDate {
            title: body.title.trim().to_string(),
            date,
            description: body
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            date_type,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}

/// GET /api/cases
pub async fn list(
    pool: web::Data<PgPool>,
    query: web::Query<CaseListQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = parse_filter(&query)?;
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);

    let result = case::find_paginated(&pool, &filter, page, limit).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// POST /api/cases. The creator becomes the attorney.
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<CaseRequest>,
) -> Result<HttpResponse, AppError> {
    require_role(&session, &[Role::Admin, Role::Attorney])?;
    let attorney_id = require_user_id(&session)?;
    let new_case = validate_case(&body)?;

    let id = case::create(&pool, &new_case, attorney_id).await?;
    log::info!("Case {id} created by user {attorney_id}");

    let created = case::find_by_id(&pool, id)
        .await?
        .ok_or(AppError::NotFound("Case"))?;
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/cases/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let found = case::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or(AppError::NotFound("Case"))?;
    Ok(HttpResponse::Ok().json(found))
}

/// PUT /api/cases/{id}
pub async fn update(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<CaseUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let case_id = path.into_inner();
    let changes = validate_case_update(&body)?;

    if !case::update(&pool, case_id, &changes).await? {
        return Err(AppError::NotFound("Case"));
    }
    log::info!("Case {case_id} updated");

    let updated = case::find_by_id(&pool, case_id)
        .await?
        .ok_or(AppError::NotFound("Case"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/cases/{id}/dates
pub async fn add_date(
    pool: web::Data<PgPool>,
    path: web::Path<i64>,
    body: web::Json<ImportantDateRequest>,
) -> Result<HttpResponse, AppError> {
    let case_id = path.into_inner();
    let entry = validate_important_date(&body)?;

    if !case::add_important_date(&pool, case_id, &entry).await? {
        return Err(AppError::NotFound("Case"));
    }

    let updated = case::find_by_id(&pool, case_id)
        .await?
        .ok_or(AppError::NotFound("Case"))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/cases/{id}/notes
pub async fn add_note(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<NoteRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let case_id = path.into_inner();
    if let Some(error) = validate::validate_required(&body.content, "Content", 10_000) {
        return Err(AppError::Validation(vec![error]));
    }

    if !case::add_note(&pool, case_id, body.content.trim(), user_id).await? {
        return Err(AppError::NotFound("Case"));
    }

    let updated = case::find_by_id(&pool, case_id)
        .await?
        .ok_or(AppError::NotFound("Case"))?;
    Ok(HttpResponse::Ok().json(updated))
}
