//! Local notification center

mod alerts;
mod format;
mod models;
mod store;

pub use alerts::{Alert, AlertSink, QueuedAlerts, NOTIFICATIONS_TARGET};
pub use format::{date_label, format_age, now_millis};
pub use models::{Notification, NotificationGroup, NotificationType};
pub use store::{NotificationStore, DEFAULT_NAMESPACE, MAX_NOTIFICATIONS};
