use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl TryFrom<String> for AttendanceStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One employee-day of attendance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 42,
    "employee_id": 7,
    "employee_name": "John Doe",
    "date": "2026-01-05",
    "in_time": "09:12:00",
    "out_time": "16:45:00",
    "status": "Present",
    "late": "12m0s",
    "late_minutes": 12,
    "early_leaving": "15m0s",
    "early_leaving_minutes": 15,
    "total_work": "7h33m0s",
    "created_at": "2026-01-05T03:12:00Z"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,

    /// Copy of the employee's full name, refreshed when the record is listed.
    pub employee_name: String,

    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(value_type = Option<String>, example = "09:12:00")]
    pub in_time: Option<NaiveTime>,

    /// Empty until checkout.
    #[schema(value_type = Option<String>, example = "16:45:00")]
    pub out_time: Option<NaiveTime>,

    #[sqlx(try_from = "String")]
    pub status: AttendanceStatus,

    pub late: String,
    pub late_minutes: i64,

    pub early_leaving: Option<String>,
    pub early_leaving_minutes: i64,

    pub total_work: Option<String>,

    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn is_checked_out(&self) -> bool {
        self.out_time.is_some()
    }

    /// Case-insensitive substring match on the searchable columns, mirroring
    /// the SQL filter. `needle` must already be lowercase.
    #[cfg(test)]
    pub fn matches(&self, needle: &str) -> bool {
        let fmt_time = |t: Option<NaiveTime>| {
            t.map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_default()
        };

        self.employee_name.to_lowercase().contains(needle)
            || self.date.format("%Y-%m-%d").to_string().contains(needle)
            || fmt_time(self.in_time).contains(needle)
            || fmt_time(self.out_time).contains(needle)
            || self.status.to_string().to_lowercase().contains(needle)
    }
}

/// Row written by check-in or by marking a day absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub employee_name: String,
    pub date: NaiveDate,
    pub in_time: Option<NaiveTime>,
    pub status: AttendanceStatus,
    pub late: String,
    pub late_minutes: i64,
    pub created_at: DateTime<Utc>,
}

impl NewAttendance {
    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            date: self.date,
            in_time: self.in_time,
            out_time: None,
            status: self.status,
            late: self.late,
            late_minutes: self.late_minutes,
            early_leaving: None,
            early_leaving_minutes: 0,
            total_work: None,
            created_at: self.created_at,
        }
    }
}

/// Fields set exactly once by checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOut {
    pub out_time: NaiveTime,
    pub total_work: String,
    pub early_leaving: String,
    pub early_leaving_minutes: i64,
}

/// Denormalized name correction for one record.
#[derive(Debug, Clone, PartialEq)]
pub struct NameUpdate {
    pub record_id: u64,
    pub employee_name: String,
}

/// Selection for attendance listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub employee_id: Option<u64>,
    /// Lowercased search term.
    pub search: Option<String>,
}

impl AttendanceFilter {
    pub fn new(employee_id: Option<u64>, searching: Option<&str>) -> Self {
        let search = searching
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        Self { employee_id, search }
    }
}

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Pagination window; non-positive input falls back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
            per_page: per_page.filter(|p| *p > 0).unwrap_or(DEFAULT_PER_PAGE),
        }
    }

    /// Rows to skip; saturates for pages past any realistic table size.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}
