//! Notification persistence over the key-value port

use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use super::alerts::{Alert, AlertSink, NOTIFICATIONS_TARGET};
use super::format::{date_label, now_millis};
use super::models::{Notification, NotificationGroup, NotificationType};
use crate::kv::{self, KvStore, StoreError};

pub const DEFAULT_NAMESPACE: &str = "notifications";
/// Retention cap; older records are evicted from the tail.
pub const MAX_NOTIFICATIONS: usize = 50;
const KEY_NOTIFICATIONS: &str = "notifications_list";

/// Newest-first notification list stored as one JSON value.
///
/// Every mutation reloads the list, edits it and writes it back whole. The
/// write lock is held for that entire sequence so two callers can never
/// overwrite each other's changes.
pub struct NotificationStore {
    kv: Arc<dyn KvStore>,
    namespace: String,
    alerts: Arc<dyn AlertSink>,
    write_lock: Mutex<()>,
}

impl NotificationStore {
    pub fn new(kv: Arc<dyn KvStore>, namespace: impl Into<String>, alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            kv,
            namespace: namespace.into(),
            alerts,
            write_lock: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn add(
        &self,
        title: &str,
        message: &str,
        notification_type: NotificationType,
        extra_data: Option<String>,
        emit_alert: bool,
    ) -> Result<Notification, StoreError> {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            message: message.to_string(),
            notification_type,
            timestamp: now_millis(),
            is_read: false,
            extra_data,
        };

        self.mutate(|list| {
            list.insert(0, notification.clone());
            list.truncate(MAX_NOTIFICATIONS);
            true
        })?;
        debug!(id = %notification.id, kind = notification_type.as_str(), "notification stored");

        if emit_alert {
            let alert = Alert {
                title: notification.title.clone(),
                message: notification.message.clone(),
                notification_type,
                target: NOTIFICATIONS_TARGET.to_string(),
            };
            if let Err(e) = self.alerts.emit(&alert) {
                warn!(error = %e, "failed to emit notification alert");
            }
        }

        Ok(notification)
    }

    /// All records, newest first. Missing or unparseable storage reads as empty.
    pub fn list(&self) -> Vec<Notification> {
        kv::load_list(self.kv.as_ref(), &self.namespace, KEY_NOTIFICATIONS)
    }

    pub fn unread(&self) -> Vec<Notification> {
        self.list().into_iter().filter(|n| !n.is_read).collect()
    }

    pub fn unread_count(&self) -> usize {
        self.unread().len()
    }

    /// First `limit` records plus the total count.
    pub fn recent(&self, limit: usize) -> (Vec<Notification>, usize) {
        let mut all = self.list();
        let total = all.len();
        all.truncate(limit);
        (all, total)
    }

    pub fn groups(&self, now: i64) -> Vec<NotificationGroup> {
        let mut groups: Vec<NotificationGroup> = Vec::new();
        for n in self.list() {
            let label = date_label(n.timestamp, now);
            match groups.last_mut() {
                Some(g) if g.date == label => g.notifications.push(n),
                _ => groups.push(NotificationGroup {
                    date: label,
                    notifications: vec![n],
                }),
            }
        }
        groups
    }

    /// Returns whether a record with `id` exists.
    pub fn mark_read(&self, id: &str) -> Result<bool, StoreError> {
        self.mutate(|list| match list.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = true;
                true
            }
            None => false,
        })
    }

    pub fn mark_all_read(&self) -> Result<(), StoreError> {
        self.mutate(|list| {
            for n in list.iter_mut() {
                n.is_read = true;
            }
            true
        })?;
        Ok(())
    }

    /// Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.mutate(|list| {
            let before = list.len();
            list.retain(|n| n.id != id);
            list.len() != before
        })
    }

    pub fn delete_all(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        kv::save_list::<Notification>(self.kv.as_ref(), &self.namespace, KEY_NOTIFICATIONS, &[])
    }

    fn mutate<F>(&self, f: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&mut Vec<Notification>) -> bool,
    {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut list = kv::try_load_list(self.kv.as_ref(), &self.namespace, KEY_NOTIFICATIONS)?;
        let changed = f(&mut list);
        if changed {
            kv::save_list(self.kv.as_ref(), &self.namespace, KEY_NOTIFICATIONS, &list)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use crate::notifications::QueuedAlerts;
    use std::thread;

    struct FailingAlerts;

    impl AlertSink for FailingAlerts {
        fn emit(&self, _alert: &Alert) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("channel unavailable"))
        }
    }

    fn store() -> (NotificationStore, Arc<QueuedAlerts>, Arc<MemoryKv>) {
        let kv = Arc::new(MemoryKv::new());
        let alerts = Arc::new(QueuedAlerts::new());
        let store = NotificationStore::new(kv.clone(), DEFAULT_NAMESPACE, alerts.clone());
        (store, alerts, kv)
    }

    fn add(store: &NotificationStore, title: &str) -> Notification {
        store
            .add(title, "msg", NotificationType::Reminder, None, false)
            .expect("add")
    }

    #[test]
    fn newest_first_in_insertion_order() {
        let (store, _, _) = store();
        add(&store, "one");
        add(&store, "two");
        add(&store, "three");
        let titles: Vec<String> = store.list().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["three", "two", "one"]);
    }

    #[test]
    fn retention_cap_evicts_oldest() {
        let (store, _, _) = store();
        for i in 0..(MAX_NOTIFICATIONS + 5) {
            add(&store, &format!("n{}", i));
        }
        let list = store.list();
        assert_eq!(list.len(), MAX_NOTIFICATIONS);
        assert_eq!(list[0].title, format!("n{}", MAX_NOTIFICATIONS + 4));
        assert_eq!(list[MAX_NOTIFICATIONS - 1].title, "n5");
        assert!(list.iter().all(|n| n.title != "n0"));
    }

    #[test]
    fn unread_count_tracks_read_flags() {
        let (store, _, _) = store();
        let a = add(&store, "a");
        add(&store, "b");
        add(&store, "c");
        assert_eq!(store.unread_count(), 3);

        assert!(store.mark_read(&a.id).unwrap());
        assert_eq!(store.unread_count(), 2);
        assert_eq!(
            store.unread_count(),
            store.list().iter().filter(|n| !n.is_read).count()
        );

        store.mark_all_read().unwrap();
        assert_eq!(store.unread_count(), 0);
        assert!(store.unread().is_empty());
    }

    #[test]
    fn mark_read_is_idempotent() {
        let (store, _, _) = store();
        let a = add(&store, "a");
        add(&store, "b");
        store.mark_read(&a.id).unwrap();
        let once = store.list();
        store.mark_read(&a.id).unwrap();
        assert_eq!(store.list(), once);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let (store, _, _) = store();
        add(&store, "a");
        let before = store.list();
        assert!(!store.mark_read("missing").unwrap());
        assert!(!store.delete("missing").unwrap());
        assert_eq!(store.list(), before);
    }

    #[test]
    fn delete_removes_exactly_one() {
        let (store, _, _) = store();
        add(&store, "a");
        let b = add(&store, "b");
        add(&store, "c");
        assert!(store.delete(&b.id).unwrap());
        let titles: Vec<String> = store.list().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["c", "a"]);

        store.delete_all().unwrap();
        assert!(store.list().is_empty());
    }

    #[test]
    fn corrupt_storage_lists_as_empty() {
        let (store, _, kv) = store();
        kv.set(DEFAULT_NAMESPACE, KEY_NOTIFICATIONS, "[{\"id\":").unwrap();
        assert!(store.list().is_empty());
        assert_eq!(store.unread_count(), 0);

        // The next write replaces the corrupt blob.
        add(&store, "fresh");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn failed_read_does_not_overwrite_existing_records() {
        let (store, alerts, kv) = store();
        for i in 0..10 {
            add(&store, &format!("n{}", i));
        }

        kv.fail_next_get();
        assert!(store
            .add("lost", "m", NotificationType::System, None, true)
            .is_err());
        assert!(alerts.drain().is_empty());
        assert_eq!(store.list().len(), 10);

        let first = store.list()[0].id.clone();
        kv.fail_next_get();
        assert!(store.mark_read(&first).is_err());
        kv.fail_next_get();
        assert!(store.delete(&first).is_err());
        assert_eq!(store.list().len(), 10);
        assert_eq!(store.unread_count(), 10);
    }

    #[test]
    fn alerts_fire_only_when_requested() {
        let (store, alerts, _) = store();
        store
            .add("quiet", "m", NotificationType::System, None, false)
            .unwrap();
        store
            .add("loud", "m", NotificationType::NewGrade, Some("{\"value\":\"AD\"}".into()), true)
            .unwrap();
        let fired = alerts.drain();
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].title, "loud");
        assert_eq!(fired[0].target, NOTIFICATIONS_TARGET);
        assert!(alerts.drain().is_empty());
    }

    #[test]
    fn failing_alert_still_persists_record() {
        let kv = Arc::new(MemoryKv::new());
        let store = NotificationStore::new(kv, DEFAULT_NAMESPACE, Arc::new(FailingAlerts));
        let n = store
            .add("t", "m", NotificationType::GradeUpdated, None, true)
            .expect("add succeeds despite alert failure");
        assert_eq!(store.list()[0].id, n.id);
    }

    #[test]
    fn recent_reports_total() {
        let (store, _, _) = store();
        for i in 0..5 {
            add(&store, &format!("n{}", i));
        }
        let (recent, total) = store.recent(3);
        assert_eq!(total, 5);
        let titles: Vec<String> = recent.into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["n4", "n3", "n2"]);
    }

    #[test]
    fn fresh_records_group_under_today() {
        let (store, _, _) = store();
        add(&store, "a");
        add(&store, "b");
        let groups = store.groups(now_millis());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].date, "Today");
        assert_eq!(groups[0].notifications.len(), 2);
    }

    #[test]
    fn concurrent_adds_are_not_lost() {
        let (store, _, _) = store();
        let store = Arc::new(store);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..10 {
                        store
                            .add(&format!("t{}-{}", t, i), "m", NotificationType::Reminder, None, false)
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.list().len(), 40);
    }
}
