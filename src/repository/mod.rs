//! Storage seams of the attendance engine.
//!
//! Employees and shifts are owned by other modules of the HR system; the
//! engine only reads them. Attendance rows are owned here.

pub mod attendance;
pub mod directory;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, CheckOut, NameUpdate, NewAttendance, PageRequest,
};
use crate::model::employee::Employee;
use crate::model::shift::ShiftSchedule;

pub use attendance::MySqlAttendanceStore;
pub use directory::MySqlDirectory;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Fails with `StoreError::Duplicate` when (employee, date) is taken.
    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Returns false when the row is gone or already checked out.
    async fn record_check_out(&self, id: u64, checkout: &CheckOut) -> Result<bool, StoreError>;

    /// One page of matching rows, newest id first, plus the total match count.
    async fn list(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttendanceRecord>, i64), StoreError>;

    /// Applies every update or none of them.
    async fn refresh_names(&self, updates: &[NameUpdate]) -> Result<(), StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError>;

    async fn find_many(&self, ids: &[u64]) -> Result<Vec<Employee>, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShiftStore: Send + Sync {
    async fn find_shift(&self, id: u64) -> Result<Option<ShiftSchedule>, StoreError>;
}
