use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::kv::{self, KvStore, StoreError};
use crate::notifications::{NotificationStore, NotificationType};

const USER_PREFS: &str = "user_prefs";
const APP_PREFS: &str = "app_prefs";
const KEY_SESSION: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Guardian,
    Teacher,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "guardian" => Ok(Role::Guardian),
            "teacher" => Ok(Role::Teacher),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub user_id: i64,
    pub full_name: String,
    pub role: Role,
}

impl UserSession {
    pub fn is_logged_in(&self) -> bool {
        self.user_id > 0
    }
}

pub fn session(kv: &dyn KvStore) -> Option<UserSession> {
    kv::load_value(kv, USER_PREFS, KEY_SESSION)
}

pub fn set_session(kv: &dyn KvStore, session: &UserSession) -> Result<(), StoreError> {
    kv::save_value(kv, USER_PREFS, KEY_SESSION, session)
}

pub fn clear_session(kv: &dyn KvStore) -> Result<(), StoreError> {
    kv.remove(USER_PREFS, KEY_SESSION)
}

fn first_time_key(role: Role) -> Option<&'static str> {
    match role {
        Role::Student => Some("first_time_student"),
        Role::Guardian => Some("first_time_guardian"),
        Role::Teacher => None,
    }
}

fn welcome_messages(role: Role) -> &'static [(&'static str, &'static str, NotificationType)] {
    match role {
        Role::Student => &[
            (
                "Welcome!",
                "Here you can see all your grades and follow your academic progress.",
                NotificationType::System,
            ),
            (
                "New grade registered",
                "Your teacher registered a grade in Mathematics. Check it out!",
                NotificationType::NewGrade,
            ),
            (
                "Reminder",
                "Remember to review your grades for the current bimester.",
                NotificationType::Reminder,
            ),
        ],
        Role::Guardian => &[
            (
                "Welcome!",
                "From here you can follow the academic progress of your students.",
                NotificationType::System,
            ),
            (
                "Tip: adding students",
                "Use the + button to add students to your list by their DNI.",
                NotificationType::System,
            ),
        ],
        Role::Teacher => &[],
    }
}

/// Seeds the role's welcome notifications the first time it signs in on
/// this device. Returns how many were added.
pub fn welcome(kv: &dyn KvStore, notifications: &NotificationStore, role: Role) -> Result<usize, StoreError> {
    let Some(key) = first_time_key(role) else {
        return Ok(0);
    };
    let first_time = kv::try_load_value::<bool>(kv, APP_PREFS, key)?.unwrap_or(true);
    if !first_time {
        return Ok(0);
    }

    let messages = welcome_messages(role);
    for (title, message, kind) in messages {
        notifications.add(title, message, *kind, None, true)?;
    }
    kv::save_value(kv, APP_PREFS, key, &false)?;
    Ok(messages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::notifications::{QueuedAlerts, DEFAULT_NAMESPACE};
    use std::sync::Arc;

    #[test]
    fn session_roundtrip_and_clear() {
        let kv = MemoryKv::new();
        assert_eq!(session(&kv), None);
        let s = UserSession {
            user_id: 42,
            full_name: "Rosa Quispe".to_string(),
            role: Role::Guardian,
        };
        set_session(&kv, &s).unwrap();
        let loaded = session(&kv).expect("session");
        assert!(loaded.is_logged_in());
        assert_eq!(loaded.role, Role::Guardian);
        clear_session(&kv).unwrap();
        assert_eq!(session(&kv), None);
    }

    #[test]
    fn welcome_runs_once_per_role() {
        let kv = Arc::new(MemoryKv::new());
        let store = NotificationStore::new(kv.clone(), DEFAULT_NAMESPACE, Arc::new(QueuedAlerts::new()));

        assert_eq!(welcome(kv.as_ref(), &store, Role::Student).unwrap(), 3);
        assert_eq!(welcome(kv.as_ref(), &store, Role::Student).unwrap(), 0);
        assert_eq!(welcome(kv.as_ref(), &store, Role::Guardian).unwrap(), 2);
        assert_eq!(welcome(kv.as_ref(), &store, Role::Teacher).unwrap(), 0);

        let list = store.list();
        assert_eq!(list.len(), 5);
        // Guardian tip was added last, so it is first.
        assert_eq!(list[0].title, "Tip: adding students");
        assert_eq!(list[4].title, "Welcome!");
    }

    #[test]
    fn welcome_is_not_repeated_after_a_failed_flag_read() {
        let kv = Arc::new(MemoryKv::new());
        let store = NotificationStore::new(kv.clone(), DEFAULT_NAMESPACE, Arc::new(QueuedAlerts::new()));
        assert_eq!(welcome(kv.as_ref(), &store, Role::Student).unwrap(), 3);

        kv.fail_next_get();
        assert!(welcome(kv.as_ref(), &store, Role::Student).is_err());
        assert_eq!(store.list().len(), 3);
    }
}
