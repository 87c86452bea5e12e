use crate::api::attendance::{
    AttendanceListResponse, AttendanceResponse, CheckInResponse, CheckOutResponse, MarkAbsent,
    MessageResponse, Pagination,
};
use crate::error::ErrorBody;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance & Shift Computation

Daily check-in and check-out for employees, measured against each
employee's weekly shift.

### Key Features
- **Check-in** records lateness against the scheduled shift start
- **Check-out** records total work and early leaving
- **History** with search and pagination
- **HR tools**: mark absence, list everyone, refresh cached shifts

### Security
All endpoints require a **JWT Bearer** access token. HR tools are limited
to the **Admin** and **HR** roles.

### Formats
Dates are `YYYY-MM-DD`, times `HH:MM:SS`, and durations are short
strings such as `1h15m0s` or `0s`.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::list_all_attendance,
        crate::api::attendance::mark_absent,
        crate::api::attendance::refresh_shift,
    ),
    components(
        schemas(
            AttendanceRecord,
            AttendanceStatus,
            CheckInResponse,
            CheckOutResponse,
            AttendanceListResponse,
            AttendanceResponse,
            Pagination,
            MarkAbsent,
            MessageResponse,
            ErrorBody
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
