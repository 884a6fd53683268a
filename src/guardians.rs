use serde::{Deserialize, Serialize};

use crate::kv::{self, KvStore, StoreError};
use crate::notifications::{NotificationStore, NotificationType};

const KEY_STUDENTS: &str = "students_list";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedStudent {
    pub user_id: i64,
    pub dni: String,
    pub full_name: String,
}

pub fn namespace(guardian_user_id: i64) -> String {
    format!("guardian_students_{}", guardian_user_id)
}

pub fn list(kv: &dyn KvStore, guardian_user_id: i64) -> Vec<LinkedStudent> {
    kv::load_list(kv, &namespace(guardian_user_id), KEY_STUDENTS)
}

/// Links `student` to the guardian. Relinking the same user id refreshes the
/// stored entry in place. Returns true for a new link.
pub fn link(
    kv: &dyn KvStore,
    notifications: &NotificationStore,
    guardian_user_id: i64,
    student: LinkedStudent,
) -> Result<bool, StoreError> {
    let mut students: Vec<LinkedStudent> =
        kv::try_load_list(kv, &namespace(guardian_user_id), KEY_STUDENTS)?;
    let added = match students.iter_mut().find(|s| s.user_id == student.user_id) {
        Some(existing) => {
            *existing = student.clone();
            false
        }
        None => {
            students.push(student.clone());
            true
        }
    };
    kv::save_list(kv, &namespace(guardian_user_id), KEY_STUDENTS, &students)?;

    if added {
        notifications.add(
            "Student linked",
            &format!("{} was added to your students", student.full_name),
            NotificationType::StudentAdded,
            Some(serde_json::json!({ "studentId": student.user_id }).to_string()),
            true,
        )?;
    }
    Ok(added)
}

pub fn unlink(kv: &dyn KvStore, guardian_user_id: i64, student_user_id: i64) -> Result<bool, StoreError> {
    let mut students: Vec<LinkedStudent> =
        kv::try_load_list(kv, &namespace(guardian_user_id), KEY_STUDENTS)?;
    let before = students.len();
    students.retain(|s| s.user_id != student_user_id);
    if students.len() == before {
        return Ok(false);
    }
    kv::save_list(kv, &namespace(guardian_user_id), KEY_STUDENTS, &students)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::notifications::{QueuedAlerts, DEFAULT_NAMESPACE};
    use std::sync::Arc;

    fn student(id: i64, name: &str) -> LinkedStudent {
        LinkedStudent {
            user_id: id,
            dni: format!("7000000{}", id),
            full_name: name.to_string(),
        }
    }

    #[test]
    fn link_dedupes_by_user_id_and_notifies_once() {
        let kv = Arc::new(MemoryKv::new());
        let store = NotificationStore::new(kv.clone(), DEFAULT_NAMESPACE, Arc::new(QueuedAlerts::new()));

        assert!(link(kv.as_ref(), &store, 1, student(10, "Ana")).unwrap());
        assert!(link(kv.as_ref(), &store, 1, student(11, "Luis")).unwrap());
        assert!(!link(kv.as_ref(), &store, 1, student(10, "Ana Maria")).unwrap());

        let students = list(kv.as_ref(), 1);
        assert_eq!(students.len(), 2);
        assert_eq!(students[0].full_name, "Ana Maria");

        let notes = store.list();
        assert_eq!(notes.len(), 2);
        assert!(notes
            .iter()
            .all(|n| n.notification_type == NotificationType::StudentAdded));
        assert!(list(kv.as_ref(), 2).is_empty());
    }

    #[test]
    fn failed_read_keeps_existing_links() {
        let kv = Arc::new(MemoryKv::new());
        let store = NotificationStore::new(kv.clone(), DEFAULT_NAMESPACE, Arc::new(QueuedAlerts::new()));
        link(kv.as_ref(), &store, 1, student(10, "Ana")).unwrap();
        link(kv.as_ref(), &store, 1, student(11, "Luis")).unwrap();

        kv.fail_next_get();
        assert!(link(kv.as_ref(), &store, 1, student(12, "Rosa")).is_err());
        kv.fail_next_get();
        assert!(unlink(kv.as_ref(), 1, 10).is_err());

        assert_eq!(list(kv.as_ref(), 1).len(), 2);
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn unlink_missing_is_a_no_op() {
        let kv = Arc::new(MemoryKv::new());
        let store = NotificationStore::new(kv.clone(), DEFAULT_NAMESPACE, Arc::new(QueuedAlerts::new()));
        link(kv.as_ref(), &store, 1, student(10, "Ana")).unwrap();
        assert!(!unlink(kv.as_ref(), 1, 99).unwrap());
        assert!(unlink(kv.as_ref(), 1, 10).unwrap());
        assert!(list(kv.as_ref(), 1).is_empty());
    }
}
