//! New-order notifications: an audible cue, a short-lived toast, and a
//! persisted history.
//!
//! Nothing here may hold up the realtime callback. Sound playback runs on its
//! own task and its failures (autoplay restrictions, missing device) are only
//! logged. History saves run on the blocking pool from a snapshot taken under
//! the lock.

mod store;

pub use store::{JsonFileStore, MemoryStore, NotificationRecord, NotificationStore};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::app_system::NotifyError;
use crate::domain::Order;

/// Entries kept in the notification history.
pub const HISTORY_CAP: usize = 50;

#[async_trait]
pub trait SoundPlayer: Send + Sync + 'static {
    async fn play(&self) -> Result<(), NotifyError>;
}

/// Writes the chime to the log instead of a speaker.
pub struct LogChime;

#[async_trait]
impl SoundPlayer for LogChime {
    async fn play(&self) -> Result<(), NotifyError> {
        info!("Ding! New order");
        Ok(())
    }
}

/// Dismissible banner announcing a new order.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: Uuid,
    pub order_id: String,
    pub title: String,
    pub body: String,
    pub expires_at: DateTime<Utc>,
}

impl Toast {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Default)]
struct NotifierState {
    toasts: Vec<Toast>,
    history: Vec<NotificationRecord>,
}

struct NotifierInner {
    tenant_id: String,
    player: Arc<dyn SoundPlayer>,
    store: Arc<dyn NotificationStore>,
    toast_ttl: chrono::Duration,
    state: Mutex<NotifierState>,
    /// Bumped for every history change; saves older than the last written
    /// one are skipped.
    generation: AtomicU64,
    written: Mutex<u64>,
}

#[derive(Clone)]
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

impl Notifier {
    /// Loads the tenant's history from `store`. A store that cannot be read
    /// is logged and treated as empty.
    pub fn new(
        tenant_id: impl Into<String>,
        player: Arc<dyn SoundPlayer>,
        store: Arc<dyn NotificationStore>,
        toast_ttl: Duration,
    ) -> Self {
        let tenant_id = tenant_id.into();
        let history = store.load(&tenant_id).unwrap_or_else(|e| {
            warn!(tenant_id = %tenant_id, error = %e, "Could not load notification history");
            Vec::new()
        });
        let toast_ttl =
            chrono::Duration::from_std(toast_ttl).unwrap_or_else(|_| chrono::Duration::seconds(10));

        Self {
            inner: Arc::new(NotifierInner {
                tenant_id,
                player,
                store,
                toast_ttl,
                state: Mutex::new(NotifierState {
                    toasts: Vec::new(),
                    history,
                }),
                generation: AtomicU64::new(0),
                written: Mutex::new(0),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NotifierState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Saves a snapshot of the history on the blocking pool. Must be called
    /// with the state lock held so generations follow the change order.
    fn persist(&self, history: &[NotificationRecord]) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);
        let history = history.to_vec();

        let write = move || {
            let mut written = inner.written.lock().unwrap_or_else(PoisonError::into_inner);
            if *written > generation {
                debug!(generation, "Skipping stale history save");
                return;
            }
            if let Err(e) = inner.store.save(&inner.tenant_id, &history) {
                warn!(error = %e, "Could not persist notification history");
            }
            *written = generation;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(write);
            }
            Err(_) => write(),
        }
    }

    fn play_sound(&self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime available; skipping notification sound");
            return;
        };
        let player = Arc::clone(&self.inner.player);
        runtime.spawn(async move {
            if let Err(e) = player.play().await {
                warn!(error = %e, "Notification sound failed");
            }
        });
    }

    /// Announces a freshly inserted order and returns the toast shown for it.
    #[instrument(skip(self, order), fields(order_id = %order.id, order_number = order.order_number))]
    pub fn notify_new_order(&self, order: &Order) -> Toast {
        self.play_sound();

        let now = Utc::now();
        let toast = Toast {
            id: Uuid::new_v4(),
            order_id: order.id.clone(),
            title: format!("Nuevo pedido #{}", order.order_number),
            body: order.summary(),
            expires_at: now + self.inner.toast_ttl,
        };
        let record = NotificationRecord {
            id: Uuid::new_v4(),
            order_id: order.id.clone(),
            order_number: order.order_number,
            message: toast.body.clone(),
            created_at: now,
            read: false,
        };

        let mut state = self.state();
        state.toasts.push(toast.clone());
        state.history.insert(0, record);
        state.history.truncate(HISTORY_CAP);
        self.persist(&state.history);
        debug!("Toast raised");

        toast
    }

    /// Toasts still on screen at `now`; expired ones are dropped.
    pub fn active_toasts(&self, now: DateTime<Utc>) -> Vec<Toast> {
        let mut state = self.state();
        state.toasts.retain(|toast| !toast.is_expired(now));
        state.toasts.clone()
    }

    pub fn dismiss(&self, toast_id: Uuid) -> bool {
        let mut state = self.state();
        let before = state.toasts.len();
        state.toasts.retain(|toast| toast.id != toast_id);
        state.toasts.len() != before
    }

    /// Handles a click on a toast: closes it and returns the order to open.
    pub fn open(&self, toast_id: Uuid) -> Option<String> {
        let mut state = self.state();
        let position = state.toasts.iter().position(|toast| toast.id == toast_id)?;
        let toast = state.toasts.remove(position);

        for record in state
            .history
            .iter_mut()
            .filter(|record| record.order_id == toast.order_id)
        {
            record.read = true;
        }
        self.persist(&state.history);
        Some(toast.order_id)
    }

    pub fn history(&self) -> Vec<NotificationRecord> {
        self.state().history.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.state().history.iter().filter(|record| !record.read).count()
    }

    pub fn mark_all_read(&self) {
        let mut state = self.state();
        for record in &mut state.history {
            record.read = true;
        }
        self.persist(&state.history);
    }

    pub fn clear_history(&self) {
        let mut state = self.state();
        state.history.clear();
        self.persist(&state.history);
    }
}
