use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Practice area of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    PersonalInjury,
    CriminalDefense,
    FamilyLaw,
    BusinessLaw,
    EstatePlanning,
    Immigration,
    Other,
}

impl CaseType {
    pub const ALL: [CaseType; 7] = [
        CaseType::PersonalInjury,
        CaseType::CriminalDefense,
        CaseType::FamilyLaw,
        CaseType::BusinessLaw,
        CaseType::EstatePlanning,
        CaseType::Immigration,
        CaseType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseType::PersonalInjury => "personal_injury",
            CaseType::CriminalDefense => "criminal_defense",
            CaseType::FamilyLaw => "family_law",
            CaseType::BusinessLaw => "business_law",
            CaseType::EstatePlanning => "estate_planning",
            CaseType::Immigration => "immigration",
            CaseType::Other => "other",
        }
    }
}

impl FromStr for CaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CaseType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown case type '{s}'"))
    }
}

impl fmt::Display for CaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Active,
    Closed,
    OnHold,
    Pending,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Active => "active",
            CaseStatus::Closed => "closed",
            CaseStatus::OnHold => "on_hold",
            CaseStatus::Pending => "pending",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CaseStatus::Active),
            "closed" => Ok(CaseStatus::Closed),
            "on_hold" => Ok(CaseStatus::OnHold),
            "pending" => Ok(CaseStatus::Pending),
            other => Err(format!("unknown case status '{other}'")),
        }
    }
}

/// Kind of dated entry on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    CourtDate,
    Deadline,
    Meeting,
    #[default]
    Other,
}

impl DateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateType::CourtDate => "court_date",
            DateType::Deadline => "deadline",
            DateType::Meeting => "meeting",
            DateType::Other => "other",
        }
    }
}

impl FromStr for DateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "court_date" => Ok(DateType::CourtDate),
            "deadline" => Ok(DateType::Deadline),
            "meeting" => Ok(DateType::Meeting),
            "other" => Ok(DateType::Other),
            other => Err(format!("unknown date type '{other}'")),
        }
    }
}

/// A court date, deadline or meeting attached to a case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportantDate {
    pub id: i64,
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub date_type: DateType,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseNote {
    pub id: i64,
    pub content: String,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A client matter. `important_dates` keeps insertion order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: i64,
    pub case_number: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub case_type: CaseType,
    pub description: String,
    pub status: CaseStatus,
    pub attorney_id: i64,
    pub attorney_name: String,
    pub case_manager_id: Option<i64>,
    pub case_manager_name: Option<String>,
    pub billing_rate: f64,
    pub total_billed: f64,
    pub total_paid: f64,
    pub important_dates: Vec<ImportantDate>,
    pub notes: Vec<CaseNote>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for a new case.
#[derive(Debug, Clone)]
pub struct NewCase {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub case_type: CaseType,
    pub description: String,
    pub status: CaseStatus,
    pub case_manager_id: Option<i64>,
    pub billing_rate: f64,
}

/// Validated partial update of a case. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct CaseUpdate {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub case_type: Option<CaseType>,
    pub description: Option<String>,
    pub status: Option<CaseStatus>,
    pub case_manager_id: Option<i64>,
    pub billing_rate: Option<f64>,
}

/// Validated input for a new dated entry.
#[derive(Debug, Clone)]
pub struct NewImportantDate {
    pub title: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub date_type: DateType,
}

/// JSON body of `POST /api/cases`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseRequest {
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub case_type: String,
    #[serde(default)]
    pub description: String,
    pub status: Option<String>,
    pub case_manager: Option<i64>,
    pub billing_rate: Option<f64>,
}

/// JSON body of `PUT /api/cases/{id}`. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseUpdateRequest {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub case_type: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub case_manager: Option<i64>,
    pub billing_rate: Option<f64>,
}

/// JSON body of `POST /api/cases/{id}/dates`.
#[derive(Debug, Deserialize)]
pub struct ImportantDateRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub date_type: Option<String>,
}

/// JSON body of `POST /api/cases/{id}/notes`.
#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub content: String,
}

/// Query string of `GET /api/cases`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseListQuery {
    pub status: Option<String>,
    pub case_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Validated list filter.
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    pub status: Option<CaseStatus>,
    pub case_type: Option<CaseType>,
}

/// One page of cases, shaped for the list endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CasePage {
    pub cases: Vec<Case>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total: i64,
}

/// `CASE-000042` style number for the n-th case.
pub fn format_case_number(n: i64) -> String {
    format!("CASE-{n:06}")
}
