use crate::attendance::{AttendanceEngine, AttendancePage, AttendanceQuery, ShiftResolver};
use crate::auth::auth::AuthUser;
use crate::error::{ApiError, ErrorBody};
use crate::model::attendance::{AttendanceFilter, AttendanceRecord, PageRequest};
use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

fn clock_time(time: Option<NaiveTime>) -> String {
    time.map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "code": 200,
    "error": false,
    "message": "Checked in successfully",
    "time": "09:12:00",
    "late": "12m0s"
}))]
pub struct CheckInResponse {
    pub code: u16,
    pub error: bool,
    pub message: String,
    /// Local wall-clock check-in time
    pub time: String,
    /// How late against the shift, e.g. `12m0s`
    pub late: String,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "code": 200,
    "error": false,
    "message": "Checked out successfully",
    "time": "16:45:00",
    "total_work": "7h33m0s",
    "early_leaving": "15m0s"
}))]
pub struct CheckOutResponse {
    pub code: u16,
    pub error: bool,
    pub message: String,
    pub time: String,
    pub total_work: String,
    pub early_leaving: String,
}

#[derive(Serialize, ToSchema)]
pub struct Pagination {
    #[schema(example = 1)]
    pub total_count: i64,
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 10)]
    pub per_page: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub code: u16,
    pub error: bool,
    pub message: String,
    pub attendance: Vec<AttendanceRecord>,
    pub pagination: Pagination,
}

impl From<AttendancePage> for AttendanceListResponse {
    fn from(page: AttendancePage) -> Self {
        Self {
            code: 200,
            error: false,
            message: "Attendance fetched successfully".to_string(),
            attendance: page.records,
            pagination: Pagination {
                total_count: page.total_count,
                page: page.page.page,
                per_page: page.page.per_page,
            },
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub code: u16,
    pub error: bool,
    pub message: String,
    pub attendance: AttendanceRecord,
}

impl AttendanceResponse {
    fn ok(message: &str, attendance: AttendanceRecord) -> Self {
        Self {
            code: 200,
            error: false,
            message: message.to_string(),
            attendance,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub code: u16,
    pub error: bool,
    pub message: String,
}

#[derive(Deserialize, IntoParams)]
pub struct AttendanceListQuery {
    /// Page number, starting at 1
    pub page: Option<i64>,
    /// Items per page
    pub per_page: Option<i64>,
    /// Case-insensitive match on name, date, in/out time or status
    pub searching: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct AllAttendanceQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub searching: Option<String>,
    /// Only this employee's records
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkAbsent {
    #[schema(example = 7)]
    pub employee_id: u64,
    /// Defaults to today in the attendance timezone
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
}

/* =========================
Check in
========================= */
#[utoipa::path(
    post,
    path = "/api/employee/attendance/checkin",
    responses(
        (status = 200, description = "Checked in successfully", body = CheckInResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Employee or shift not found", body = ErrorBody),
        (status = 409, description = "Already checked in today", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> Result<HttpResponse, ApiError> {
    let record = engine.check_in(&auth.username).await?;

    Ok(HttpResponse::Ok().json(CheckInResponse {
        code: 200,
        error: false,
        message: "Checked in successfully".to_string(),
        time: clock_time(record.in_time),
        late: record.late,
    }))
}

/* =========================
Check out
========================= */
#[utoipa::path(
    post,
    path = "/api/employee/attendance/checkout",
    responses(
        (status = 200, description = "Checked out successfully", body = CheckOutResponse),
        (status = 400, description = "Not checked in, absent, or already checked out", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Employee or shift not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> Result<HttpResponse, ApiError> {
    let checked_out = engine.check_out(&auth.username).await?;

    Ok(HttpResponse::Ok().json(CheckOutResponse {
        code: 200,
        error: false,
        message: "Checked out successfully".to_string(),
        time: clock_time(checked_out.record.out_time),
        total_work: checked_out.total_work,
        early_leaving: checked_out.early_leaving,
    }))
}

/* =========================
Own attendance history
========================= */
#[utoipa::path(
    get,
    path = "/api/employee/attendance",
    params(AttendanceListQuery),
    responses(
        (status = 200, description = "Paginated attendance of the caller", body = AttendanceListResponse),
        (status = 400, description = "Invalid query", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 404, description = "Employee not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    query: web::Query<AttendanceListQuery>,
    attendance: web::Data<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    let page = PageRequest::new(query.page, query.per_page);

    let page = attendance
        .list_for_employee(&auth.username, query.searching.as_deref(), page)
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse::from(page)))
}

/* =========================
Single attendance record
========================= */
#[utoipa::path(
    get,
    path = "/api/employee/attendance/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record id")
    ),
    responses(
        (status = 200, description = "Attendance record", body = AttendanceResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "Record belongs to another employee", body = ErrorBody),
        (status = 404, description = "Attendance not found", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    path: web::Path<u64>,
    attendance: web::Data<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    let record = attendance
        .get_for_employee(&auth.username, path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::ok(
        "Attendance fetched successfully",
        record,
    )))
}

/* =========================
All attendance (HR/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AllAttendanceQuery),
    responses(
        (status = 200, description = "Paginated attendance of all employees", body = AttendanceListResponse),
        (status = 400, description = "Invalid query", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "HR/Admin only", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_all_attendance(
    auth: AuthUser,
    query: web::Query<AllAttendanceQuery>,
    attendance: web::Data<AttendanceQuery>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let query = query.into_inner();
    let filter = AttendanceFilter::new(query.employee_id, query.searching.as_deref());
    let page = attendance
        .list(filter, PageRequest::new(query.page, query.per_page))
        .await?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse::from(page)))
}

/* =========================
Mark absent (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/absent",
    request_body(
        content = MarkAbsent,
        description = "Employee and day to mark absent",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Absence recorded", body = AttendanceResponse),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "HR/Admin only", body = ErrorBody),
        (status = 404, description = "Employee not found", body = ErrorBody),
        (status = 409, description = "Attendance already recorded for that day", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_absent(
    auth: AuthUser,
    body: web::Json<MarkAbsent>,
    engine: web::Data<AttendanceEngine>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let body = body.into_inner();
    let record = engine.mark_absent(body.employee_id, body.date).await?;

    Ok(HttpResponse::Ok().json(AttendanceResponse::ok("Marked absent", record)))
}

/* =========================
Evict a cached shift (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/attendance/shifts/{id}/refresh",
    params(
        ("id" = u64, Path, description = "Shift id")
    ),
    responses(
        (status = 200, description = "Shift evicted from the cache", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorBody),
        (status = 403, description = "HR/Admin only", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn refresh_shift(
    auth: AuthUser,
    path: web::Path<u64>,
    shifts: web::Data<ShiftResolver>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let shift_id = path.into_inner();
    shifts.invalidate(shift_id).await;
    tracing::info!(shift_id, user_id = auth.user_id, "Shift cache entry evicted");

    Ok(HttpResponse::Ok().json(MessageResponse {
        code: 200,
        error: false,
        message: format!("Shift {} will be reloaded on next use", shift_id),
    }))
}
