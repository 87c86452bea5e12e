use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::model::attendance::{AttendanceFilter, AttendanceRecord, NameUpdate, PageRequest};
use crate::model::employee::Employee;
use crate::repository::{AttendanceStore, EmployeeDirectory};

/// One page of attendance plus the total number of matches.
#[derive(Debug)]
pub struct AttendancePage {
    pub records: Vec<AttendanceRecord>,
    pub total_count: i64,
    pub page: PageRequest,
}

/// Read side of attendance: listings, single records and name backfill.
pub struct AttendanceQuery {
    store: Arc<dyn AttendanceStore>,
    employees: Arc<dyn EmployeeDirectory>,
}

impl AttendanceQuery {
    pub fn new(store: Arc<dyn AttendanceStore>, employees: Arc<dyn EmployeeDirectory>) -> Self {
        Self { store, employees }
    }

    async fn employee_by_username(&self, username: &str) -> Result<Employee, ApiError> {
        self.employees
            .find_by_username(username)
            .await?
            .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))
    }

    /// The caller's own history.
    #[instrument(skip(self))]
    pub async fn list_for_employee(
        &self,
        username: &str,
        searching: Option<&str>,
        page: PageRequest,
    ) -> Result<AttendancePage, ApiError> {
        let employee = self.employee_by_username(username).await?;
        self.list(AttendanceFilter::new(Some(employee.id), searching), page)
            .await
    }

    /// Listing across employees, optionally narrowed to one of them.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: AttendanceFilter,
        page: PageRequest,
    ) -> Result<AttendancePage, ApiError> {
        let (mut records, total_count) = self.store.list(&filter, page).await?;
        self.backfill_names(&mut records).await?;

        Ok(AttendancePage {
            records,
            total_count,
            page,
        })
    }

    /// Single record, visible only to the employee it belongs to.
    #[instrument(skip(self))]
    pub async fn get_for_employee(
        &self,
        username: &str,
        id: u64,
    ) -> Result<AttendanceRecord, ApiError> {
        let employee = self.employee_by_username(username).await?;
        let record = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Attendance not found".to_string()))?;

        if record.employee_id != employee.id {
            return Err(ApiError::Forbidden(
                "Attendance belongs to another employee".to_string(),
            ));
        }
        Ok(record)
    }

    /// Rewrites stale `employee_name` copies on `records` to the directory's
    /// current names, persisting all corrections in one transaction.
    async fn backfill_names(&self, records: &mut [AttendanceRecord]) -> Result<(), ApiError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut ids: Vec<u64> = records.iter().map(|r| r.employee_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let names: HashMap<u64, String> = self
            .employees
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e.full_name()))
            .collect();

        let updates: Vec<NameUpdate> = records
            .iter()
            .filter_map(|r| {
                let current = names.get(&r.employee_id)?;
                (*current != r.employee_name).then(|| NameUpdate {
                    record_id: r.id,
                    employee_name: current.clone(),
                })
            })
            .collect();

        if updates.is_empty() {
            return Ok(());
        }

        debug!(count = updates.len(), "Refreshing stale attendance names");
        self.store
            .refresh_names(&updates)
            .await
            .map_err(|e| ApiError::internal("Failed to refresh attendance names", e))?;

        for record in records.iter_mut() {
            if let Some(name) = names.get(&record.employee_id) {
                record.employee_name.clone_from(name);
            }
        }
        Ok(())
    }
}
