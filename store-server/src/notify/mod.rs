//! Best-effort notification collaborator.
//!
//! Delivery failure must never fail or roll back the state transition that
//! triggered it; callers log and move on. The default implementation just
//! traces, which is also what keeps tests hermetic.

use async_trait::async_trait;
use serde::Serialize;

use shared::{OrderStatus, ReturnStatus};

/// Message sent to a customer.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    OrderStatusChanged {
        order_id: String,
        status: OrderStatus,
    },
    ReturnStatusChanged {
        order_id: String,
        status: ReturnStatus,
    },
    BackInStock {
        product_id: String,
        product_name: String,
    },
}

/// Outbound notification channel (mailer, push, ...). Implementations are
/// free to fail; the engine treats every send as fire-and-forget.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, user_id: &str, notification: Notification) -> anyhow::Result<()>;
}

/// Default notifier: structured log lines only.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, user_id: &str, notification: Notification) -> anyhow::Result<()> {
        tracing::info!(user_id = %user_id, notification = ?notification, "Notify");
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Captures notifications for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, Notification)>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, user_id: &str, notification: Notification) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((user_id.to_string(), notification));
            Ok(())
        }
    }

    /// Always fails; used to prove transitions survive delivery failure.
    #[derive(Debug, Default)]
    pub struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _user_id: &str, _notification: Notification) -> anyhow::Result<()> {
            anyhow::bail!("mailer unavailable")
        }
    }
}
