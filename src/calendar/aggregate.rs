use std::fmt::Display;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::models::case::{Case, CaseType, DateType, ImportantDate};

pub const DAYS_PER_WEEK: usize = 7;

/// One dated entry of a case, flattened for calendar display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    /// `{case_id}-{entry_id}`
    pub id: String,
    pub case_id: i64,
    pub case_number: String,
    pub client_name: String,
    pub case_type: CaseType,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub item_type: DateType,
    pub date: DateTime<Utc>,
    /// Time of day in the calendar's zone, e.g. `09:00 AM`.
    pub time: String,
}

/// Single-day view: `{date, dayOfWeek, actionItems, total}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAgenda {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub action_items: Vec<ActionItem>,
    pub total: usize,
}

/// One of the seven buckets of a week view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDay {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub action_items: Vec<ActionItem>,
}

/// Week view: `{weekStart, weekEnd, days}`. `week_end` is exclusive (start + 7 days).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekAgenda {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days: Vec<WeekDay>,
}

impl DayAgenda {
    pub fn new(date: NaiveDate, action_items: Vec<ActionItem>) -> Self {
        DayAgenda {
            date,
            day_of_week: day_label(date),
            total: action_items.len(),
            action_items,
        }
    }
}

impl WeekAgenda {
    pub fn new(week_start: NaiveDate, days: Vec<WeekDay>) -> Self {
        WeekAgenda {
            week_start,
            week_end: week_start + Duration::days(DAYS_PER_WEEK as i64),
            days,
        }
    }
}

/// `local` in `tz` as UTC. A wall time skipped by a DST jump moves forward to the first
/// half hour that exists; a repeated one takes the earlier instant.
pub fn resolve_local<Tz: TimeZone>(local: NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    (0..=4)
        .map(|half_hours| local + Duration::minutes(30 * half_hours))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// First instant of `day` in `tz`, as UTC.
///
/// When a DST jump skips local midnight the day starts at the first local time that
/// exists; for a repeated midnight the earlier instant wins.
pub fn start_of_day<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    resolve_local(midnight, tz).unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// `[start_of_day(day), start_of_day(day + 1))`
pub fn day_range<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (start_of_day(day, tz), start_of_day(day + Duration::days(1), tz))
}

/// `[start_of_day(week_start), start_of_day(week_start + 7))`
pub fn week_range<Tz: TimeZone>(week_start: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        start_of_day(week_start, tz),
        start_of_day(week_start + Duration::days(DAYS_PER_WEEK as i64), tz),
    )
}

fn to_action_item<Tz>(case: &Case, entry: &ImportantDate, tz: &Tz) -> ActionItem
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ActionItem {
        id: format!("{}-{}", case.id, entry.id),
        case_id: case.id,
        case_number: case.case_number.clone(),
        client_name: case.client_name.clone(),
        case_type: case.case_type,
        title: entry.title.clone(),
        description: entry.description.clone(),
        item_type: entry.date_type,
        date: entry.date,
        time: entry.date.with_timezone(tz).format("%I:%M %p").to_string(),
    }
}

fn day_label(day: NaiveDate) -> String {
    day.format("%A").to_string()
}

/// Action items of all `cases` falling on `day` in `tz`, earliest first.
///
/// Items with equal timestamps keep case order, then entry order.
pub fn items_for_day_in<Tz>(cases: &[Case], day: NaiveDate, tz: &Tz) -> Vec<ActionItem>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let (start, end) = day_range(day, tz);
    let mut items: Vec<ActionItem> = cases
        .iter()
        .flat_map(|case| case.important_dates.iter().map(move |entry| (case, entry)))
        .filter(|(_, entry)| entry.date >= start && entry.date < end)
        .map(|(case, entry)| to_action_item(case, entry, tz))
        .collect();
    items.sort_by_key(|item| item.date);
    items
}

/// Seven day buckets starting at `week_start`, each holding its own sorted items.
/// Buckets with nothing scheduled are still present.
pub fn items_for_week_in<Tz>(cases: &[Case], week_start: NaiveDate, tz: &Tz) -> Vec<WeekDay>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let days: Vec<NaiveDate> = (0..=DAYS_PER_WEEK as i64)
        .map(|offset| week_start + Duration::days(offset))
        .collect();
    let bounds: Vec<DateTime<Utc>> = days.iter().map(|d| start_of_day(*d, tz)).collect();

    let mut buckets: Vec<WeekDay> = days[..DAYS_PER_WEEK]
        .iter()
        .map(|day| WeekDay {
            date: *day,
            day_of_week: day_label(*day),
            action_items: Vec::new(),
        })
        .collect();

    for case in cases {
        for entry in &case.important_dates {
            // bounds is ascending; the bucket is the last boundary not after the entry.
            let idx = bounds.partition_point(|b| *b <= entry.date);
            if (1..=DAYS_PER_WEEK).contains(&idx) {
                buckets[idx - 1].action_items.push(to_action_item(case, entry, tz));
            }
        }
    }

    for bucket in &mut buckets {
        bucket.action_items.sort_by_key(|item| item.date);
    }
    buckets
}

/// [`items_for_day_in`] using the server's local time zone.
pub fn items_for_day(cases: &[Case], day: NaiveDate) -> Vec<ActionItem> {
    items_for_day_in(cases, day, &chrono::Local)
}

/// [`items_for_week_in`] using the server's local time zone.
pub fn items_for_week(cases: &[Case], week_start: NaiveDate) -> Vec<WeekDay> {
    items_for_week_in(cases, week_start, &chrono::Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    use crate::models::case::CaseStatus;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(id: i64, title: &str, ts: &str) -> ImportantDate {
        ImportantDate {
            id,
            title: title.to_string(),
            date: at(ts),
            description: None,
            date_type: DateType::Other,
        }
    }

    fn case_with(id: i64, entries: Vec<ImportantDate>) -> Case {
        Case {
            id,
            case_number: format!("CASE-{id:06}"),
            client_name: format!("Client {id}"),
            client_email: format!("client{id}@example.com"),
            client_phone: "555-0100".into(),
            case_type: CaseType::FamilyLaw,
            description: String::new(),
            status: CaseStatus::Active,
            attorney_id: 1,
            attorney_name: "Jane Smith".into(),
            case_manager_id: None,
            case_manager_name: None,
            billing_rate: 0.0,
            total_billed: 0.0,
            total_paid: 0.0,
            important_dates: entries,
            notes: Vec::new(),
            created_at: at("2024-01-01T00:00:00Z"),
            updated_at: at("2024-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn start_of_day_respects_offset() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(start_of_day(ymd(2024, 3, 1), &est), at("2024-03-01T05:00:00Z"));
        assert_eq!(start_of_day(ymd(2024, 3, 1), &Utc), at("2024-03-01T00:00:00Z"));
    }

    #[test]
    fn day_boundaries_are_half_open() {
        let cases = vec![case_with(
            1,
            vec![
                entry(1, "start", "2024-03-01T00:00:00Z"),
                entry(2, "end", "2024-03-02T00:00:00Z"),
                entry(3, "last second", "2024-03-01T23:59:59Z"),
            ],
        )];
        let items = items_for_day_in(&cases, ymd(2024, 3, 1), &Utc);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["start", "last second"]);
    }

    #[test]
    fn ties_keep_case_then_entry_order() {
        let cases = vec![
            case_with(1, vec![
                entry(10, "b", "2024-03-01T09:00:00Z"),
                entry(11, "c", "2024-03-01T09:00:00Z"),
            ]),
            case_with(2, vec![
                entry(20, "a", "2024-03-01T08:00:00Z"),
                entry(21, "d", "2024-03-01T09:00:00Z"),
            ]),
        ];
        let items = items_for_day_in(&cases, ymd(2024, 3, 1), &Utc);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2-20", "1-10", "1-11", "2-21"]);
    }

    #[test]
    fn duplicate_entries_are_not_merged() {
        let dup = entry(5, "hearing", "2024-03-01T10:00:00Z");
        let cases = vec![case_with(1, vec![dup.clone(), dup])];
        assert_eq!(items_for_day_in(&cases, ymd(2024, 3, 1), &Utc).len(), 2);
    }

    #[test]
    fn time_label_uses_calendar_zone() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let cases = vec![case_with(1, vec![entry(1, "call", "2024-03-01T19:30:00Z")])];
        let items = items_for_day_in(&cases, ymd(2024, 3, 1), &est);
        assert_eq!(items[0].time, "02:30 PM");
    }

    #[test]
    fn week_buckets_cover_contiguous_days() {
        let est = FixedOffset::west_opt(5 * 3600).unwrap();
        let days = items_for_week_in(&[], ymd(2024, 3, 4), &est);
        assert_eq!(days.len(), DAYS_PER_WEEK);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.date, ymd(2024, 3, 4) + Duration::days(i as i64));
            assert!(day.action_items.is_empty());
        }
        assert_eq!(days[0].day_of_week, "Monday");
        assert_eq!(days[6].day_of_week, "Sunday");
    }

    #[test]
    fn week_boundary_entry_goes_to_later_day() {
        let cases = vec![case_with(
            1,
            vec![
                entry(1, "midnight", "2024-03-05T00:00:00Z"),
                entry(2, "before window", "2024-03-03T23:59:59Z"),
                entry(3, "window end", "2024-03-11T00:00:00Z"),
            ],
        )];
        let days = items_for_week_in(&cases, ymd(2024, 3, 4), &Utc);
        assert!(days[0].action_items.is_empty());
        assert_eq!(days[1].action_items.len(), 1);
        assert_eq!(days[1].action_items[0].title, "midnight");
        let total: usize = days.iter().map(|d| d.action_items.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn week_agenda_end_is_exclusive_start_plus_seven() {
        let agenda = WeekAgenda::new(ymd(2024, 3, 4), items_for_week_in(&[], ymd(2024, 3, 4), &Utc));
        assert_eq!(agenda.week_end, ymd(2024, 3, 11));
        let json = serde_json::to_value(&agenda).unwrap();
        assert_eq!(json["weekStart"], "2024-03-04");
        assert_eq!(json["weekEnd"], "2024-03-11");
        assert_eq!(json["days"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn day_agenda_serializes_expected_shape() {
        let cases = vec![case_with(3, vec![entry(9, "filing", "2024-03-01T14:30:00Z")])];
        let agenda = DayAgenda::new(ymd(2024, 3, 1), items_for_day_in(&cases, ymd(2024, 3, 1), &Utc));
        let json = serde_json::to_value(&agenda).unwrap();
        assert_eq!(json["date"], "2024-03-01");
        assert_eq!(json["dayOfWeek"], "Friday");
        assert_eq!(json["total"], 1);
        let item = &json["actionItems"][0];
        assert_eq!(item["id"], "3-9");
        assert_eq!(item["caseNumber"], "CASE-000003");
        assert_eq!(item["caseType"], "family_law");
        assert_eq!(item["type"], "other");
        assert_eq!(item["time"], "02:30 PM");
    }
}
