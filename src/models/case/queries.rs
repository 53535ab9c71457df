use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::user;
use super::types::*;

const SELECT_CASE: &str = "\
    SELECT c.id, c.case_number, c.client_name, c.client_email, c.client_phone, \
           c.case_type, c.description, c.status, c.attorney_id, c.case_manager_id, \
           c.billing_rate, c.total_billed, c.total_paid, c.created_at, c.updated_at \
    FROM cases c";

#[derive(sqlx::FromRow)]
struct CaseRow {
    id: i64,
    case_number: String,
    client_name: String,
    client_email: String,
    client_phone: String,
    case_type: String,
    description: String,
    status: String,
    attorney_id: i64,
    case_manager_id: Option<i64>,
    billing_rate: f64,
    total_billed: f64,
    total_paid: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CaseRow {
    fn user_ids(&self) -> impl Iterator<Item = i64> {
        std::iter::once(self.attorney_id).chain(self.case_manager_id)
    }

    /// `names` comes from the user directory; unknown ids leave the name blank.
    fn into_case(
        self,
        names: &HashMap<i64, String>,
        important_dates: Vec<ImportantDate>,
        notes: Vec<CaseNote>,
    ) -> Case {
        // The table CHECK constraints keep these columns within the enums.
        let case_type = self.case_type.parse().unwrap_or(CaseType::Other);
        let status = self.status.parse().unwrap_or_default();
        Case {
            id: self.id,
            case_number: self.case_number,
            client_name: self.client_name,
            client_email: self.client_email,
            client_phone: self.client_phone,
            case_type,
            description: self.description,
            status,
            attorney_id: self.attorney_id,
            attorney_name: names.get(&self.attorney_id).cloned().unwrap_or_default(),
            case_manager_id: self.case_manager_id,
            case_manager_name: self.case_manager_id.and_then(|id| names.get(&id).cloned()),
            billing_rate: self.billing_rate,
            total_billed: self.total_billed,
            total_paid: self.total_paid,
            important_dates,
            notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DateRow {
    id: i64,
    case_id: i64,
    title: String,
    date: DateTime<Utc>,
    description: Option<String>,
    date_type: String,
}

/// Dated entries for each of `case_ids`, in insertion order.
async fn load_dates(
    pool: &PgPool,
    case_ids: &[i64],
) -> Result<HashMap<i64, Vec<ImportantDate>>, AppError> {
    let mut by_case: HashMap<i64, Vec<ImportantDate>> = HashMap::new();
    if case_ids.is_empty() {
        return Ok(by_case);
    }

    let rows = sqlx::query_as::<_, DateRow>(
        "SELECT id, case_id, title, date, description, date_type \
         FROM important_dates WHERE case_id = ANY($1) ORDER BY case_id, id",
    )
    .bind(case_ids)
    .fetch_all(pool)
    .await?;

    for row in rows {
        by_case.entry(row.case_id).or_default().push(ImportantDate {
            id: row.id,
            title: row.title,
            date: row.date,
            description: row.description,
            date_type: row.date_type.parse().unwrap_or_default(),
        });
    }
    Ok(by_case)
}

/// Notes of one case, oldest first. Author names are filled in by the caller.
async fn load_notes(pool: &PgPool, case_id: i64) -> Result<Vec<CaseNote>, AppError> {
    let rows: Vec<(i64, String, Option<i64>, DateTime<Utc>)> = sqlx::query_as(
        "SELECT id, content, created_by, created_at \
         FROM case_notes WHERE case_id = $1 ORDER BY id",
    )
    .bind(case_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, content, created_by, created_at)| CaseNote {
            id,
            content,
            created_by,
            created_by_name: None,
            created_at,
        })
        .collect())
}

/// Attach dated entries to a batch of case rows, preserving row order.
async fn with_dates(pool: &PgPool, rows: Vec<CaseRow>) -> Result<Vec<Case>, AppError> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut dates = load_dates(pool, &ids).await?;

    let mut user_ids: Vec<i64> = rows.iter().flat_map(|r| r.user_ids()).collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let names = user::find_display_names(pool, &user_ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let entries = dates.remove(&row.id).unwrap_or_default();
            row.into_case(&names, entries, Vec::new())
        })
        .collect())
}

/// Cases where `user_id` is attorney or case manager and at least one dated entry
/// falls in `[range_start, range_end)`.
///
/// Each returned case carries all of its dated entries, not only the ones in range;
/// narrowing to the window is the calendar aggregator's job. Cases are ordered by
/// their earliest in-range entry.
pub async fn find_with_dated_entries_in_range(
    pool: &PgPool,
    user_id: i64,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Result<Vec<Case>, AppError> {
    let sql = format!(
        "{SELECT_CASE} \
         WHERE (c.attorney_id = $1 OR c.case_manager_id = $1) \
           AND EXISTS (SELECT 1 FROM important_dates d \
                       WHERE d.case_id = c.id AND d.date >= $2 AND d.date < $3) \
         ORDER BY (SELECT MIN(d.date) FROM important_dates d \
                   WHERE d.case_id = c.id AND d.date >= $2 AND d.date < $3), c.id"
    );
    let rows = sqlx::query_as::<_, CaseRow>(&sql)
        .bind(user_id)
        .bind(range_start)
        .bind(range_end)
        .fetch_all(pool)
        .await?;

    with_dates(pool, rows).await
}

/// Full case detail including dated entries and notes.
pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Case>, AppError> {
    let sql = format!("{SELECT_CASE} WHERE c.id = $1");
    let row = sqlx::query_as::<_, CaseRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let dates = load_dates(pool, &[id]).await?.remove(&id).unwrap_or_default();
    let mut notes = load_notes(pool, id).await?;

    let mut user_ids: Vec<i64> = row
        .user_ids()
        .chain(notes.iter().filter_map(|n| n.created_by))
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();
    let names = user::find_display_names(pool, &user_ids).await?;

    for note in &mut notes {
        note.created_by_name = note.created_by.and_then(|id| names.get(&id).cloned());
    }
    Ok(Some(row.into_case(&names, dates, notes)))
}

/// Newest-first page of cases matching `filter`.
pub async fn find_paginated(
    pool: &PgPool,
    filter: &CaseFilter,
    page: i64,
    per_page: i64,
) -> Result<CasePage, AppError> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, 100);
    let offset = (page - 1) * per_page;
    let status = filter.status.map(|s| s.as_str());
    let case_type = filter.case_type.map(|t| t.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cases c \
         WHERE ($1::TEXT IS NULL OR c.status = $1) \
           AND ($2::TEXT IS NULL OR c.case_type = $2)",
    )
    .bind(status)
    .bind(case_type)
    .fetch_one(pool)
    .await?;

    let sql = format!(
        "{SELECT_CASE} \
         WHERE ($1::TEXT IS NULL OR c.status = $1) \
           AND ($2::TEXT IS NULL OR c.case_type = $2) \
         ORDER BY c.created_at DESC, c.id DESC \
         LIMIT $3 OFFSET $4"
    );
    let rows = sqlx::query_as::<_, CaseRow>(&sql)
        .bind(status)
        .bind(case_type)
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let cases = with_dates(pool, rows).await?;
    let total_pages = (total + per_page - 1) / per_page;

    Ok(CasePage { cases, total_pages, current_page: page, total })
}

/// Insert a case with the next sequential case number. Returns the new id.
pub async fn create(pool: &PgPool, new: &NewCase, attorney_id: i64) -> Result<i64, AppError> {
    ensure_case_manager_exists(pool, new.case_manager_id).await?;
    let mut tx = pool.begin().await?;

    // Serialise numbering so concurrent creates cannot pick the same number.
    sqlx::query("LOCK TABLE cases IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cases")
        .fetch_one(&mut *tx)
        .await?;

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO cases (case_number, client_name, client_email, client_phone, case_type, \
                            description, status, attorney_id, case_manager_id, billing_rate) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING id",
    )
    .bind(format_case_number(count + 1))
    .bind(&new.client_name)
    .bind(&new.client_email)
    .bind(&new.client_phone)
    .bind(new.case_type.as_str())
    .bind(&new.description)
    .bind(new.status.as_str())
    .bind(attorney_id)
    .bind(new.case_manager_id)
    .bind(new.billing_rate)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(id)
}

/// Apply the fields set in `changes`. Returns false if the case does not exist.
pub async fn update(pool: &PgPool, id: i64, changes: &CaseUpdate) -> Result<bool, AppError> {
    ensure_case_manager_exists(pool, changes.case_manager_id).await?;

    let updated = sqlx::query(
        "UPDATE cases SET \
             client_name = COALESCE($2, client_name), \
             client_email = COALESCE($3, client_email), \
             client_phone = COALESCE($4, client_phone), \
             case_type = COALESCE($5, case_type), \
             description = COALESCE($6, description), \
             status = COALESCE($7, status), \
             case_manager_id = COALESCE($8, case_manager_id), \
             billing_rate = COALESCE($9, billing_rate), \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(changes.client_name.as_deref())
    .bind(changes.client_email.as_deref())
    .bind(changes.client_phone.as_deref())
    .bind(changes.case_type.map(|t| t.as_str()))
    .bind(changes.description.as_deref())
    .bind(changes.status.map(|s| s.as_str()))
    .bind(changes.case_manager_id)
    .bind(changes.billing_rate)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(updated > 0)
}

/// A case manager must be an existing user; reported as a validation error, not a 500.
async fn ensure_case_manager_exists(
    pool: &PgPool,
    case_manager_id: Option<i64>,
) -> Result<(), AppError> {
    let Some(id) = case_manager_id else {
        return Ok(());
    };
    if user::find_display_by_id(pool, id).await?.is_none() {
        return Err(AppError::Validation(vec!["Case manager does not exist".to_string()]));
    }
    Ok(())
}

/// Append a dated entry. Returns false if the case does not exist.
pub async fn add_important_date(
    pool: &PgPool,
    case_id: i64,
    entry: &NewImportantDate,
) -> Result<bool, AppError> {
    let inserted = sqlx::query(
        "INSERT INTO important_dates (case_id, title, date, description, date_type) \
         SELECT id, $2, $3, $4, $5 FROM cases WHERE id = $1",
    )
    .bind(case_id)
    .bind(&entry.title)
    .bind(entry.date)
    .bind(&entry.description)
    .bind(entry.date_type.as_str())
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        touch(pool, case_id).await?;
    }
    Ok(inserted > 0)
}

/// Append a note authored by `user_id`. Returns false if the case does not exist.
pub async fn add_note(
    pool: &PgPool,
    case_id: i64,
    content: &str,
    user_id: i64,
) -> Result<bool, AppError> {
    let inserted = sqlx::query(
        "INSERT INTO case_notes (case_id, content, created_by) \
         SELECT id, $2, $3 FROM cases WHERE id = $1",
    )
    .bind(case_id)
    .bind(content)
    .bind(user_id)
    .execute(pool)
    .await?
    .rows_affected();

    if inserted > 0 {
        touch(pool, case_id).await?;
    }
    Ok(inserted > 0)
}

async fn touch(pool: &PgPool, case_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE cases SET updated_at = NOW() WHERE id = $1")
        .bind(case_id)
        .execute(pool)
        .await?;
    Ok(())
}
