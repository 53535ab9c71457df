use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::case::{self, Case};
use super::aggregate::{DayAgenda, WeekAgenda, day_range, items_for_day, items_for_week, week_range};

/// Source of the cases a calendar view is built from.
#[allow(async_fn_in_trait)]
pub trait CaseStore {
    /// Cases where `user_id` is attorney or case manager with at least one dated
    /// entry in `[range_start, range_end)`.
    async fn find_cases_with_dated_entries_in_range(
        &self,
        user_id: i64,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<Case>, AppError>;
}

impl CaseStore for PgPool {
    async fn find_cases_with_dated_entries_in_range(
        &self,
        user_id: i64,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<Case>, AppError> {
        case::find_with_dated_entries_in_range(self, user_id, range_start, range_end).await
    }
}

/// Action items for the current local day.
pub async fn today<S: CaseStore>(store: &S, user_id: i64) -> Result<DayAgenda, AppError> {
    on_date(store, user_id, Local::now().date_naive()).await
}

/// Action items for `day`, with day boundaries in server-local time.
pub async fn on_date<S: CaseStore>(
    store: &S,
    user_id: i64,
    day: NaiveDate,
) -> Result<DayAgenda, AppError> {
    let (start, end) = day_range(day, &Local);
    let cases = store
        .find_cases_with_dated_entries_in_range(user_id, start, end)
        .await?;
    log::debug!("calendar day {day} for user {user_id}: {} matching cases", cases.len());
    Ok(DayAgenda::new(day, items_for_day(&cases, day)))
}

/// Seven day buckets starting at `week_start`.
pub async fn week<S: CaseStore>(
    store: &S,
    user_id: i64,
    week_start: NaiveDate,
) -> Result<WeekAgenda, AppError> {
    let (start, end) = week_range(week_start, &Local);
    let cases = store
        .find_cases_with_dated_entries_in_range(user_id, start, end)
        .await?;
    log::debug!("calendar week {week_start} for user {user_id}: {} matching cases", cases.len());
    Ok(WeekAgenda::new(week_start, items_for_week(&cases, week_start)))
}

/// Parse a day from a path segment: `YYYY-MM-DD`, or an RFC 3339 timestamp whose
/// server-local date is used.
pub fn parse_day(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    let day = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Local).date_naive())
        })
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{raw}', expected YYYY-MM-DD")))?;

    // Keeps the week arithmetic far away from chrono's representable range.
    if !(1..=9999).contains(&day.year()) {
        return Err(AppError::BadRequest(format!("Date '{raw}' is out of range")));
    }
    Ok(day)
}
