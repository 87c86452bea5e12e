use chrono::NaiveTime;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ApiError;
use crate::model::shift::ShiftSchedule;
use crate::repository::ShiftStore;

/// Shift schedules keyed by shift id, expiring after a fixed TTL.
#[derive(Clone)]
pub struct ShiftCache {
    inner: Cache<u64, ShiftSchedule>,
}

impl ShiftCache {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, shift_id: u64) -> Option<ShiftSchedule> {
        self.inner.get(&shift_id).await
    }

    pub async fn insert(&self, shift: ShiftSchedule) {
        self.inner.insert(shift.id, shift).await;
    }

    /// Drops one shift so the next lookup reloads it from the store.
    pub async fn invalidate(&self, shift_id: u64) {
        self.inner.invalidate(&shift_id).await;
    }
}

/// Answers "when is this shift expected in and out on this weekday".
#[derive(Clone)]
pub struct ShiftResolver {
    store: Arc<dyn ShiftStore>,
    cache: ShiftCache,
}

impl ShiftResolver {
    pub fn new(store: Arc<dyn ShiftStore>, cache: ShiftCache) -> Self {
        Self { store, cache }
    }

    async fn load(&self, shift_id: u64) -> Result<ShiftSchedule, ApiError> {
        if let Some(shift) = self.cache.get(shift_id).await {
            return Ok(shift);
        }

        debug!(shift_id, "Shift cache miss");
        let shift = self
            .store
            .find_shift(shift_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Shift {} not found", shift_id)))?;

        self.cache.insert(shift.clone()).await;
        Ok(shift)
    }

    /// Scheduled (in, out) times of `shift_id` for the English weekday `day`.
    pub async fn resolve(
        &self,
        shift_id: u64,
        day: &str,
    ) -> Result<(Option<NaiveTime>, Option<NaiveTime>), ApiError> {
        self.load(shift_id).await?.times_for(day)
    }

    pub async fn invalidate(&self, shift_id: u64) {
        self.cache.invalidate(shift_id).await;
    }
}
