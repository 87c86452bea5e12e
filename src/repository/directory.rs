use async_trait::async_trait;
use sqlx::MySqlPool;

use super::{EmployeeDirectory, ShiftStore};
use crate::error::StoreError;
use crate::model::employee::Employee;
use crate::model::shift::ShiftSchedule;

/// Read-only view over the `employees`, `users` and `shifts` tables.
#[derive(Clone)]
pub struct MySqlDirectory {
    pool: MySqlPool,
}

impl MySqlDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeDirectory for MySqlDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT e.id, e.first_name, e.last_name, e.email, e.shift_id
            FROM employees e
            JOIN users u ON u.employee_id = e.id
            WHERE u.username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT id, first_name, last_name, email, shift_id FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn find_many(&self, ids: &[u64]) -> Result<Vec<Employee>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, first_name, last_name, email, shift_id FROM employees WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query_as::<_, Employee>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl ShiftStore for MySqlDirectory {
    async fn find_shift(&self, id: u64) -> Result<Option<ShiftSchedule>, StoreError> {
        let shift = sqlx::query_as::<_, ShiftSchedule>(
            r#"
            SELECT id, name,
                   monday_in, monday_out, tuesday_in, tuesday_out,
                   wednesday_in, wednesday_out, thursday_in, thursday_out,
                   friday_in, friday_out, saturday_in, saturday_out,
                   sunday_in, sunday_out
            FROM shifts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(shift)
    }
}
