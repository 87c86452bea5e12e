use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::AttendanceStore;
use crate::error::StoreError;
use crate::model::attendance::{
    AttendanceFilter, AttendanceRecord, CheckOut, NameUpdate, NewAttendance, PageRequest,
};

const SELECT_COLUMNS: &str = r#"
    SELECT id, employee_id, employee_name, date, in_time, out_time, status,
           late, late_minutes, early_leaving, early_leaving_minutes,
           total_work, created_at
    FROM attendance
"#;

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
}

#[derive(Clone)]
pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE wildcards so the term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn where_clause(filter: &AttendanceFilter) -> (String, Vec<FilterValue>) {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(FilterValue::U64(employee_id));
    }

    if let Some(search) = filter.search.as_deref() {
        where_sql.push_str(
            r#" AND (
                LOWER(employee_name) LIKE ?
                OR DATE_FORMAT(date, '%Y-%m-%d') LIKE ?
                OR COALESCE(TIME_FORMAT(in_time, '%H:%i:%s'), '') LIKE ?
                OR COALESCE(TIME_FORMAT(out_time, '%H:%i:%s'), '') LIKE ?
                OR LOWER(status) LIKE ?
            )"#,
        );
        let like = like_pattern(search);
        for _ in 0..5 {
            args.push(FilterValue::Str(like.clone()));
        }
    }

    (where_sql, args)
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn find_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("{} WHERE employee_id = ? AND date = ?", SELECT_COLUMNS);
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn insert(&self, record: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, employee_name, date, in_time, status, late, late_minutes,
                 early_leaving_minutes, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(record.employee_id)
        .bind(&record.employee_name)
        .bind(record.date)
        .bind(record.in_time)
        .bind(record.status.to_string())
        .bind(&record.late)
        .bind(record.late_minutes)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record.into_record(result.last_insert_id()))
    }

    async fn record_check_out(&self, id: u64, checkout: &CheckOut) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET out_time = ?, total_work = ?, early_leaving = ?, early_leaving_minutes = ?
            WHERE id = ?
            AND out_time IS NULL
            "#,
        )
        .bind(checkout.out_time)
        .bind(&checkout.total_work)
        .bind(&checkout.early_leaving)
        .bind(checkout.early_leaving_minutes)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list(
        &self,
        filter: &AttendanceFilter,
        page: PageRequest,
    ) -> Result<(Vec<AttendanceRecord>, i64), StoreError> {
        let (where_sql, args) = where_clause(filter);

        // ---------- total count ----------
        let count_sql = format!("SELECT COUNT(*) FROM attendance{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // ---------- data query ----------
        let data_sql = format!("{}{} ORDER BY id DESC LIMIT ? OFFSET ?", SELECT_COLUMNS, where_sql);
        debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching attendance");

        let mut data_q = sqlx::query_as::<_, AttendanceRecord>(&data_sql);
        for arg in &args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(*v),
                FilterValue::Str(s) => data_q.bind(s.as_str()),
            };
        }
        let records = data_q
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((records, total))
    }

    async fn refresh_names(&self, updates: &[NameUpdate]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for update in updates {
            sqlx::query("UPDATE attendance SET employee_name = ? WHERE id = ?")
                .bind(&update.employee_name)
                .bind(update.record_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
