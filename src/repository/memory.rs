//! In-process store used by the engine, query and handler tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{AttendanceStore, EmployeeDirectory, ShiftStore};
use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, CheckOut, NameUpdate, NewAttendance, PageRequest,
};
use crate::model::employee::Employee;
use crate::model::shift::ShiftSchedule;

#[derive(Default)]
struct State {
    records: Vec<AttendanceRecord>,
    next_id: u64,
    employees: HashMap<u64, Employee>,
    usernames: HashMap<String, u64>,
    shifts: HashMap<u64, ShiftSchedule>,
    shift_lookups: usize,
    name_writes: usize,
    fail_refresh: bool,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_employee(&self, username: &str, employee: Employee) {
        let mut state = self.state.lock().unwrap();
        state.usernames.insert(username.to_string(), employee.id);
        state.employees.insert(employee.id, employee);
    }

    pub fn rename_employee(&self, id: u64, first_name: &str, last_name: &str) {
        let mut state = self.state.lock().unwrap();
        let employee = state.employees.get_mut(&id).expect("unknown employee");
        employee.first_name = first_name.to_string();
        employee.last_name = last_name.to_string();
    }

    pub fn add_shift(&self, shift: ShiftSchedule) {
        self.state.lock().unwrap().shifts.insert(shift.id, shift);
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.state.lock().unwrap().records.clone()
    }

    pub fn shift_lookups(&self) -> usize {
        self.state.lock().unwrap().shift_lookups
    }

    /// Number of rows rewritten by `refresh_names` so far.
    pub fn name_writes(&self) -> usize {
        self.state.lock().unwrap().name_writes
    }

    pub fn fail_refresh(&self, fail: bool) {
        self.state.lock().unwrap().fail_refresh = fail;
    }
}

#[async_trait]
impl AttendanceStore for InMemoryStore {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .records
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.records.iter().find(|r| r.id == id).cloned())
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state
            .records
            .iter()
            .any(|r| r.employee_id == record.employee_id && r.date == record.date)
        {
            return Err(StoreError::Duplicate);
        }

        state.next_id += 1;
        let record = record.into_record(state.next_id);
        state.records.push(record.clone());
        Ok(record)
    }

    async fn record_check_out(&self, id: u64, checkout: &CheckOut) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap();
        match state
            .records
            .iter_mut()
            .find(|r| r.id == id && r.out_time.is_none())
        {
            Some(record) => {
                record.out_time = Some(checkout.out_time);
                record.total_work = Some(checkout.total_work.clone());
                record.early_leaving = Some(checkout.early_leaving.clone());
                record.early_leaving_minutes = checkout.early_leaving_minutes;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttendanceRecord>, i64), StoreError> {
        let state = self.state.lock().unwrap();
        let mut matching: Vec<AttendanceRecord> = state
            .records
            .iter()
            .filter(|r| filter.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| filter.search.as_deref().is_none_or(|s| r.matches(s)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matching.len() as i64;
        let records = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.per_page as usize)
            .collect();
        Ok((records, total))
    }

    async fn refresh_names(&self, updates: &[NameUpdate]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_refresh {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        for update in updates {
            if let Some(record) = state.records.iter_mut().find(|r| r.id == update.record_id) {
                record.employee_name = update.employee_name.clone();
            }
        }
        state.name_writes += updates.len();
        Ok(())
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.employees.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        Ok(self.state.lock().unwrap().employees.get(&id).cloned())
    }

    async fn find_many(&self, ids: &[u64]) -> Result<Vec<Employee>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.employees.get(id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ShiftStore for InMemoryStore {
    async fn find_shift(&self, id: u64) -> Result<Option<ShiftSchedule>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.shift_lookups += 1;
        Ok(state.shifts.get(&id).cloned())
    }
}
