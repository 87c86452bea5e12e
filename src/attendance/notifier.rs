use actix_web::rt::{self, task::JoinHandle};
use async_trait::async_trait;
use chrono::NaiveTime;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outbound channel for attendance notices (mail, chat, push).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_check_in_notice(
        &self,
        email: &str,
        full_name: &str,
        time: NaiveTime,
    ) -> anyhow::Result<()>;

    async fn send_check_out_notice(
        &self,
        email: &str,
        full_name: &str,
        time: NaiveTime,
        total_work: &str,
    ) -> anyhow::Result<()>;
}

/// Writes notices to the application log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_check_in_notice(
        &self,
        email: &str,
        full_name: &str,
        time: NaiveTime,
    ) -> anyhow::Result<()> {
        info!(email, full_name, %time, "Check-in notice");
        Ok(())
    }

    async fn send_check_out_notice(
        &self,
        email: &str,
        full_name: &str,
        time: NaiveTime,
        total_work: &str,
    ) -> anyhow::Result<()> {
        info!(email, full_name, %time, total_work, "Check-out notice");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    CheckIn {
        email: String,
        full_name: String,
        time: NaiveTime,
    },
    CheckOut {
        email: String,
        full_name: String,
        time: NaiveTime,
        total_work: String,
    },
}

/// Fire-and-forget delivery: one attempt, bounded by `timeout`, failures logged.
#[derive(Clone)]
pub struct NoticeDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NoticeDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    async fn deliver(notifier: &dyn Notifier, notice: &Notice) -> anyhow::Result<()> {
        match notice {
            Notice::CheckIn {
                email,
                full_name,
                time,
            } => notifier.send_check_in_notice(email, full_name, *time).await,
            Notice::CheckOut {
                email,
                full_name,
                time,
                total_work,
            } => {
                notifier
                    .send_check_out_notice(email, full_name, *time, total_work)
                    .await
            }
        }
    }

    /// Spawns delivery on the current runtime; callers do not await it.
    pub fn dispatch(&self, notice: Notice) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        let timeout = self.timeout;

        rt::spawn(async move {
            match rt::time::timeout(timeout, Self::deliver(notifier.as_ref(), &notice)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, ?notice, "Failed to send attendance notice"),
                Err(_) => warn!(?notice, ?timeout, "Attendance notice timed out"),
            }
        })
    }
}
