//! Notification data models

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewGrade,
    GradeUpdated,
    /// A student was linked to a guardian account.
    StudentAdded,
    Reminder,
    System,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::NewGrade => "NEW_GRADE",
            NotificationType::GradeUpdated => "GRADE_UPDATED",
            NotificationType::StudentAdded => "STUDENT_ADDED",
            NotificationType::Reminder => "REMINDER",
            NotificationType::System => "SYSTEM",
        }
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW_GRADE" => Ok(NotificationType::NewGrade),
            "GRADE_UPDATED" => Ok(NotificationType::GradeUpdated),
            "STUDENT_ADDED" => Ok(NotificationType::StudentAdded),
            "REMINDER" => Ok(NotificationType::Reminder),
            "SYSTEM" => Ok(NotificationType::System),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// A locally stored notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub is_read: bool,
    /// Opaque JSON text attached by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
}

/// Notifications sharing one date label, in list order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationGroup {
    pub date: String,
    pub notifications: Vec<Notification>,
}
