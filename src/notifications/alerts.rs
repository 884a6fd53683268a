use super::models::NotificationType;
use serde::Serialize;
use std::sync::Mutex;
use tracing::info;

/// Screen the host opens when an alert banner is tapped.
pub const NOTIFICATIONS_TARGET: &str = "notifications";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub target: String,
}

/// Platform banner channel. Delivery is best-effort: the store logs and drops
/// any error returned here.
pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: &Alert) -> anyhow::Result<()>;
}

/// Alerts waiting for the host to pick them up with `alerts.drain`.
#[derive(Default)]
pub struct QueuedAlerts {
    pending: Mutex<Vec<Alert>>,
}

impl QueuedAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Alert> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl AlertSink for QueuedAlerts {
    fn emit(&self, alert: &Alert) -> anyhow::Result<()> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| anyhow::anyhow!("alert queue poisoned"))?;
        info!(title = %alert.title, kind = alert.notification_type.as_str(), "queued alert");
        pending.push(alert.clone());
        Ok(())
    }
}
