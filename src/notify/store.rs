use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_system::NotifyError;

/// One entry of the notification history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub order_id: String,
    pub order_number: u64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

/// Where the notification history lives between sessions.
pub trait NotificationStore: Send + Sync + 'static {
    fn load(&self, tenant_id: &str) -> Result<Vec<NotificationRecord>, NotifyError>;
    fn save(&self, tenant_id: &str, records: &[NotificationRecord]) -> Result<(), NotifyError>;
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<NotificationRecord>>>,
}

impl NotificationStore for MemoryStore {
    fn load(&self, tenant_id: &str) -> Result<Vec<NotificationRecord>, NotifyError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(tenant_id).cloned().unwrap_or_default())
    }

    fn save(&self, tenant_id: &str, records: &[NotificationRecord]) -> Result<(), NotifyError> {
        let mut stored = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        stored.insert(tenant_id.to_string(), records.to_vec());
        Ok(())
    }
}

/// JSON file per tenant under a directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, tenant_id: &str) -> PathBuf {
        self.dir.join(format!("notifications-{}.json", tenant_id))
    }
}

impl NotificationStore for JsonFileStore {
    fn load(&self, tenant_id: &str) -> Result<Vec<NotificationRecord>, NotifyError> {
        let path = self.path(tenant_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(NotifyError::Store(format!(
                    "reading {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| NotifyError::Store(format!("parsing {}: {}", path.display(), e)))
    }

    fn save(&self, tenant_id: &str, records: &[NotificationRecord]) -> Result<(), NotifyError> {
        fs::create_dir_all(&self.dir).map_err(|e| NotifyError::Store(e.to_string()))?;
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| NotifyError::Store(e.to_string()))?;
        fs::write(self.path(tenant_id), json).map_err(|e| NotifyError::Store(e.to_string()))
    }
}
