use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::db::SqliteKv;
use crate::kv::KvStore;
use crate::notifications::{NotificationStore, QueuedAlerts, DEFAULT_NAMESPACE};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// An opened workspace: its storage and the notification store living in it.
pub struct Workspace {
    pub path: PathBuf,
    pub kv: Arc<dyn KvStore>,
    pub notifications: NotificationStore,
}

pub struct AppState {
    pub workspace: Option<Workspace>,
    pub alerts: Arc<QueuedAlerts>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            alerts: Arc::new(QueuedAlerts::new()),
        }
    }

    /// Opens (creating if needed) the workspace database. `user_id` scopes the
    /// notification store to that user.
    pub fn open_workspace(&mut self, path: &Path, user_id: Option<i64>) -> anyhow::Result<()> {
        let kv: Arc<dyn KvStore> = Arc::new(SqliteKv::open(path)?);
        let namespace = match user_id {
            Some(id) => format!("{}_{}", DEFAULT_NAMESPACE, id),
            None => DEFAULT_NAMESPACE.to_string(),
        };
        let notifications = NotificationStore::new(kv.clone(), namespace, self.alerts.clone());
        info!(
            workspace = %path.to_string_lossy(),
            namespace = notifications.namespace(),
            "workspace opened"
        );
        self.workspace = Some(Workspace {
            path: path.to_path_buf(),
            kv,
            notifications,
        });
        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
