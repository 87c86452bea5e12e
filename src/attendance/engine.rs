use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{info, instrument};

use super::clock::Clock;
use super::duration::{duration_to_minutes, early_leaving, lateness, worked_time};
use super::notifier::{Notice, NoticeDispatcher};
use super::schedule::ShiftResolver;
use crate::error::{ApiError, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, CheckOut, NewAttendance};
use crate::model::employee::Employee;
use crate::repository::{AttendanceStore, EmployeeDirectory};

/// Drives the per-day lifecycle NoRecord -> CheckedIn -> CheckedOut.
pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
    employees: Arc<dyn EmployeeDirectory>,
    shifts: ShiftResolver,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    notices: NoticeDispatcher,
}

/// Result of a successful check-out.
#[derive(Debug)]
pub struct CheckedOut {
    pub record: AttendanceRecord,
    pub total_work: String,
    pub early_leaving: String,
}

/// Wall-clock "now" in the attendance timezone.
struct LocalNow {
    instant: DateTime<Utc>,
    date: NaiveDate,
    time: NaiveTime,
}

fn minutes_of(duration: &str) -> Result<i64, ApiError> {
    duration_to_minutes(duration)
        .map_err(|e| ApiError::internal("Failed to convert duration to minutes", e))
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        employees: Arc<dyn EmployeeDirectory>,
        shifts: ShiftResolver,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        notices: NoticeDispatcher,
    ) -> Self {
        Self {
            store,
            employees,
            shifts,
            clock,
            timezone,
            notices,
        }
    }

    fn local_now(&self) -> LocalNow {
        let instant = self.clock.now();
        let local = instant.with_timezone(&self.timezone);
        let time = local.time();
        LocalNow {
            instant,
            date: local.date_naive(),
            time: time.with_nanosecond(0).unwrap_or(time),
        }
    }

    async fn employee_by_username(&self, username: &str) -> Result<Employee, ApiError> {
        self.employees
            .find_by_username(username)
            .await?
            .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))
    }

    async fn scheduled_times(
        &self,
        employee: &Employee,
        date: NaiveDate,
    ) -> Result<(Option<NaiveTime>, Option<NaiveTime>), ApiError> {
        let shift_id = employee
            .shift_id
            .ok_or_else(|| ApiError::NotFound("No shift assigned to employee".to_string()))?;
        let day = date.format("%A").to_string();
        self.shifts.resolve(shift_id, &day).await
    }

    #[instrument(skip(self))]
    pub async fn check_in(&self, username: &str) -> Result<AttendanceRecord, ApiError> {
        let employee = self.employee_by_username(username).await?;
        let now = self.local_now();

        if let Some(existing) = self.store.find_for_day(employee.id, now.date).await? {
            let message = match existing.status {
                AttendanceStatus::Absent => "Employee is marked absent today",
                AttendanceStatus::Present => "Employee has already checked in today",
            };
            return Err(ApiError::Conflict(message.to_string()));
        }

        let (scheduled_in, _) = self.scheduled_times(&employee, now.date).await?;
        let late = match scheduled_in {
            Some(scheduled_in) => lateness(scheduled_in, now.time),
            None => "0s".to_string(),
        };
        let late_minutes = minutes_of(&late)?;

        let record = self
            .store
            .insert(NewAttendance {
                employee_id: employee.id,
                employee_name: employee.full_name(),
                date: now.date,
                in_time: Some(now.time),
                status: AttendanceStatus::Present,
                late,
                late_minutes,
                created_at: now.instant,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => {
                    ApiError::Conflict("Attendance already recorded for today".to_string())
                }
                other => other.into(),
            })?;

        info!(employee_id = employee.id, late = %record.late, "Checked in");

        self.notices.dispatch(Notice::CheckIn {
            email: employee.email.clone(),
            full_name: employee.full_name(),
            time: now.time,
        });

        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn check_out(&self, username: &str) -> Result<CheckedOut, ApiError> {
        let employee = self.employee_by_username(username).await?;
        let now = self.local_now();

        let mut record = self
            .store
            .find_for_day(employee.id, now.date)
            .await?
            .ok_or_else(|| ApiError::BadRequest("Employee has not checked in today".to_string()))?;

        if record.status == AttendanceStatus::Absent {
            return Err(ApiError::BadRequest(
                "Employee is marked absent today".to_string(),
            ));
        }
        if record.is_checked_out() {
            return Err(ApiError::BadRequest(
                "Employee has already checked out today".to_string(),
            ));
        }
        let in_time = record
            .in_time
            .ok_or_else(|| ApiError::BadRequest("Employee has not checked in today".to_string()))?;

        let total_work = worked_time(in_time, now.time);

        let (_, scheduled_out) = self.scheduled_times(&employee, now.date).await?;
        let early = match scheduled_out {
            Some(scheduled_out) => early_leaving(scheduled_out, now.time),
            None => "0s".to_string(),
        };

        let checkout = CheckOut {
            out_time: now.time,
            total_work: total_work.clone(),
            early_leaving_minutes: minutes_of(&early)?,
            early_leaving: early.clone(),
        };

        if !self.store.record_check_out(record.id, &checkout).await? {
            return Err(ApiError::BadRequest(
                "Employee has already checked out today".to_string(),
            ));
        }

        record.out_time = Some(checkout.out_time);
        record.total_work = Some(checkout.total_work);
        record.early_leaving = Some(checkout.early_leaving);
        record.early_leaving_minutes = checkout.early_leaving_minutes;

        info!(employee_id = employee.id, %total_work, early_leaving = %early, "Checked out");

        self.notices.dispatch(Notice::CheckOut {
            email: employee.email.clone(),
            full_name: employee.full_name(),
            time: now.time,
            total_work: total_work.clone(),
        });

        Ok(CheckedOut {
            record,
            total_work,
            early_leaving: early,
        })
    }

    /// Records an absence for `employee_id`; `date` defaults to today.
    #[instrument(skip(self))]
    pub async fn mark_absent(
        &self,
        employee_id: u64,
        date: Option<NaiveDate>,
    ) -> Result<AttendanceRecord, ApiError> {
        let employee = self
            .employees
            .find_by_id(employee_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;
        let now = self.local_now();
        let date = date.unwrap_or(now.date);

        let record = self
            .store
            .insert(NewAttendance {
                employee_id: employee.id,
                employee_name: employee.full_name(),
                date,
                in_time: None,
                status: AttendanceStatus::Absent,
                late: "0s".to_string(),
                late_minutes: 0,
                created_at: now.instant,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => ApiError::Conflict(format!(
                    "Attendance for {} already recorded",
                    date
                )),
                other => other.into(),
            })?;

        info!(employee_id, %date, "Marked absent");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::clock::FixedClock;
    use crate::attendance::notifier::testing::RecordingNotifier;
    use crate::attendance::schedule::ShiftCache;
    use crate::model::shift::fixtures::{hm, office_shift};
    use crate::repository::memory::InMemoryStore;
    use crate::repository::{MockAttendanceStore, MockEmployeeDirectory};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const TZ: Tz = chrono_tz::Asia::Dhaka;

    /// 2026-01-05 is a Monday.
    fn dhaka(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        TZ.with_ymd_and_hms(2026, 1, 5, h, m, s)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn employee(id: u64, shift_id: Option<u64>) -> Employee {
        Employee {
            id,
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john.doe@company.com".into(),
            shift_id,
        }
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        clock: Arc<FixedClock>,
        notifier: Arc<RecordingNotifier>,
        engine: AttendanceEngine,
    }

    fn harness_with(notifier: RecordingNotifier) -> Harness {
        let store = Arc::new(InMemoryStore::new());
        store.add_employee("john", employee(7, Some(1)));
        store.add_employee("drifter", employee(8, None));
        store.add_shift(office_shift(1));

        let clock = Arc::new(FixedClock::at(dhaka(9, 12, 0)));
        let notifier = Arc::new(notifier);
        let shifts = ShiftResolver::new(store.clone(), ShiftCache::new(Duration::from_secs(60), 10));
        let engine = AttendanceEngine::new(
            store.clone(),
            store.clone(),
            shifts,
            clock.clone(),
            TZ,
            NoticeDispatcher::new(notifier.clone(), Duration::from_secs(1)),
        );

        Harness {
            store,
            clock,
            notifier,
            engine,
        }
    }

    fn harness() -> Harness {
        harness_with(RecordingNotifier::default())
    }

    #[actix_web::test]
    async fn late_check_in_on_a_monday() {
        let h = harness();

        let record = h.engine.check_in("john").await.unwrap();

        assert_eq!(record.late, "12m0s");
        assert_eq!(record.late_minutes, 12);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.in_time, Some(hm(9, 12)));
        assert_eq!(record.out_time, None);
        assert_eq!(record.employee_name, "John Doe");
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    }

    #[actix_web::test]
    async fn early_arrival_is_not_late() {
        let h = harness();
        h.clock.set(dhaka(8, 40, 0));

        let record = h.engine.check_in("john").await.unwrap();
        assert_eq!(record.late, "0s");
        assert_eq!(record.late_minutes, 0);
    }

    #[actix_web::test]
    async fn second_check_in_the_same_day_conflicts() {
        let h = harness();
        h.engine.check_in("john").await.unwrap();

        h.clock.set(dhaka(10, 0, 0));
        assert!(matches!(
            h.engine.check_in("john").await,
            Err(ApiError::Conflict(_))
        ));
        assert_eq!(h.store.records().len(), 1);
    }

    #[actix_web::test]
    async fn today_follows_the_configured_timezone() {
        let h = harness();
        // 2026-01-04 20:30 UTC is already Monday 02:30 in Dhaka.
        h.clock.set(Utc.with_ymd_and_hms(2026, 1, 4, 20, 30, 0).unwrap());

        let record = h.engine.check_in("john").await.unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(record.in_time, Some(hm(2, 30)));
    }

    #[actix_web::test]
    async fn full_day_check_in_then_check_out() {
        let h = harness();
        h.engine.check_in("john").await.unwrap();

        h.clock.set(dhaka(16, 45, 0));
        let out = h.engine.check_out("john").await.unwrap();

        assert_eq!(out.early_leaving, "15m0s");
        assert_eq!(out.total_work, "7h33m0s");
        assert_eq!(out.record.out_time, Some(hm(16, 45)));
        assert_eq!(out.record.early_leaving_minutes, 15);

        let stored = &h.store.records()[0];
        assert_eq!(stored, &out.record);
    }

    #[actix_web::test]
    async fn check_out_without_check_in_is_rejected() {
        let h = harness();
        match h.engine.check_out("john").await {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("has not checked in")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn second_check_out_is_rejected_and_keeps_the_first() {
        let h = harness();
        h.engine.check_in("john").await.unwrap();
        h.clock.set(dhaka(17, 5, 0));
        h.engine.check_out("john").await.unwrap();

        h.clock.set(dhaka(18, 0, 0));
        assert!(matches!(
            h.engine.check_out("john").await,
            Err(ApiError::BadRequest(_))
        ));
        assert_eq!(h.store.records()[0].out_time, Some(hm(17, 5)));
        assert_eq!(h.store.records()[0].early_leaving.as_deref(), Some("0s"));
    }

    #[actix_web::test]
    async fn absent_day_cannot_be_checked_out() {
        let h = harness();
        h.engine.mark_absent(7, None).await.unwrap();

        match h.engine.check_out("john").await {
            Err(ApiError::BadRequest(msg)) => assert!(msg.contains("absent")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
        match h.engine.check_in("john").await {
            Err(ApiError::Conflict(msg)) => assert_eq!(msg, "Employee is marked absent today"),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn shift_is_loaded_once_for_check_in_and_check_out() {
        let h = harness();
        h.engine.check_in("john").await.unwrap();
        h.clock.set(dhaka(16, 45, 0));
        h.engine.check_out("john").await.unwrap();

        assert_eq!(h.store.shift_lookups(), 1);
    }

    #[actix_web::test]
    async fn mark_absent_twice_conflicts() {
        let h = harness();
        let date = NaiveDate::from_ymd_opt(2026, 1, 2);
        let record = h.engine.mark_absent(7, date).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.in_time, None);

        assert!(matches!(
            h.engine.mark_absent(7, date).await,
            Err(ApiError::Conflict(_))
        ));
        assert!(matches!(
            h.engine.mark_absent(99, date).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn day_without_expectation_is_never_late_or_early() {
        let h = harness();
        // 2026-01-11 is a Sunday, which the office shift leaves empty.
        h.clock.set(TZ.with_ymd_and_hms(2026, 1, 11, 11, 0, 0).unwrap().with_timezone(&Utc));
        let record = h.engine.check_in("john").await.unwrap();
        assert_eq!(record.late, "0s");

        h.clock.set(TZ.with_ymd_and_hms(2026, 1, 11, 12, 30, 0).unwrap().with_timezone(&Utc));
        let out = h.engine.check_out("john").await.unwrap();
        assert_eq!(out.early_leaving, "0s");
        assert_eq!(out.total_work, "1h30m0s");
    }

    #[actix_web::test]
    async fn unknown_employee_and_missing_shift_are_not_found() {
        let h = harness();
        assert!(matches!(
            h.engine.check_in("ghost").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            h.engine.check_in("drifter").await,
            Err(ApiError::NotFound(_))
        ));
        assert!(h.store.records().is_empty());
    }

    #[actix_web::test]
    async fn notification_failure_does_not_fail_check_in() {
        let h = harness_with(RecordingNotifier::failing());
        assert!(h.engine.check_in("john").await.is_ok());
        assert_eq!(h.store.records().len(), 1);
    }

    #[actix_web::test]
    async fn check_in_sends_a_notice_after_the_write() {
        let h = harness();
        h.engine.check_in("john").await.unwrap();

        for _ in 0..10 {
            actix_web::rt::task::yield_now().await;
        }
        assert_eq!(
            *h.notifier.sent.lock().unwrap(),
            vec![Notice::CheckIn {
                email: "john.doe@company.com".into(),
                full_name: "John Doe".into(),
                time: hm(9, 12),
            }]
        );
    }

    #[actix_web::test]
    async fn racing_insert_reports_conflict() {
        let mut store = MockAttendanceStore::new();
        store.expect_find_for_day().returning(|_, _| Ok(None));
        store.expect_insert().returning(|_| Err(StoreError::Duplicate));

        let mut directory = MockEmployeeDirectory::new();
        directory
            .expect_find_by_username()
            .returning(|_| Ok(Some(employee(7, Some(1)))));

        let shifts_store = Arc::new(InMemoryStore::new());
        shifts_store.add_shift(office_shift(1));

        let engine = AttendanceEngine::new(
            Arc::new(store),
            Arc::new(directory),
            ShiftResolver::new(shifts_store, ShiftCache::new(Duration::from_secs(60), 10)),
            Arc::new(FixedClock::at(dhaka(9, 0, 0))),
            TZ,
            NoticeDispatcher::new(Arc::new(RecordingNotifier::default()), Duration::from_secs(1)),
        );

        assert!(matches!(
            engine.check_in("john").await,
            Err(ApiError::Conflict(_))
        ));
    }

    #[actix_web::test]
    async fn lost_checkout_race_is_rejected() {
        let in_record = NewAttendance {
            employee_id: 7,
            employee_name: "John Doe".into(),
            date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            in_time: Some(hm(9, 0)),
            status: AttendanceStatus::Present,
            late: "0s".into(),
            late_minutes: 0,
            created_at: dhaka(9, 0, 0),
        }
        .into_record(1);

        let mut store = MockAttendanceStore::new();
        store
            .expect_find_for_day()
            .returning(move |_, _| Ok(Some(in_record.clone())));
        store.expect_record_check_out().returning(|_, _| Ok(false));

        let mut directory = MockEmployeeDirectory::new();
        directory
            .expect_find_by_username()
            .returning(|_| Ok(Some(employee(7, Some(1)))));

        let shifts_store = Arc::new(InMemoryStore::new());
        shifts_store.add_shift(office_shift(1));

        let engine = AttendanceEngine::new(
            Arc::new(store),
            Arc::new(directory),
            ShiftResolver::new(shifts_store, ShiftCache::new(Duration::from_secs(60), 10)),
            Arc::new(FixedClock::at(dhaka(17, 0, 0))),
            TZ,
            NoticeDispatcher::new(Arc::new(RecordingNotifier::default()), Duration::from_secs(1)),
        );

        assert!(matches!(
            engine.check_out("john").await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
