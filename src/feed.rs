//! Realtime feed adapter.
//!
//! Keeps at most one live subscription per tenant on the backend's push
//! channel and turns events into two callbacks: `on_insert(order)` and
//! `on_update()`. Every insert also goes to the notifier. The adapter only
//! mirrors the transport's connection state; it never reconnects on its own.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::app_system::FeedError;
use crate::backend::{ConnectionState, OrderBackend, OrderEvent};
use crate::coordinator::MutationCoordinator;
use crate::domain::Order;
use crate::notify::Notifier;

/// Callbacks invoked from the listener task. They must return quickly.
pub trait FeedHandlers: Send + Sync + 'static {
    fn on_insert(&self, order: Order);
    fn on_update(&self);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: Uuid,
    tenant_id: String,
}

impl SubscriptionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }
}

struct Subscription {
    handle: SubscriptionHandle,
    task: JoinHandle<()>,
}

pub struct RealtimeFeed {
    backend: Arc<dyn OrderBackend>,
    notifier: Option<Notifier>,
    subscriptions: Mutex<HashMap<String, Subscription>>,
    state: Arc<watch::Sender<ConnectionState>>,
}

impl RealtimeFeed {
    pub fn new(backend: Arc<dyn OrderBackend>, notifier: Option<Notifier>) -> Self {
        let (state, _rx) = watch::channel(ConnectionState::Disconnected);
        Self {
            backend,
            notifier,
            subscriptions: Mutex::new(HashMap::new()),
            state: Arc::new(state),
        }
    }

    /// Last known connection state, for the "disconnected" badge.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub async fn is_subscribed(&self, tenant_id: &str) -> bool {
        self.subscriptions
            .lock()
            .await
            .get(tenant_id)
            .is_some_and(|subscription| !subscription.task.is_finished())
    }

    /// Subscribes `tenant_id`. Subscribing a tenant that already has a live
    /// subscription returns the existing handle.
    #[instrument(skip(self, handlers))]
    pub async fn subscribe(
        &self,
        tenant_id: &str,
        handlers: Arc<dyn FeedHandlers>,
    ) -> Result<SubscriptionHandle, FeedError> {
        let mut subscriptions = self.subscriptions.lock().await;
        if let Some(existing) = subscriptions.get(tenant_id) {
            if !existing.task.is_finished() {
                debug!("Tenant already subscribed; reusing handle");
                return Ok(existing.handle.clone());
            }
        }

        let events = match self.backend.subscribe(tenant_id).await {
            Ok(events) => events,
            Err(source) => {
                error!(error = %source, "Realtime subscription failed");
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(FeedError::Subscribe {
                    tenant_id: tenant_id.to_string(),
                    source,
                });
            }
        };

        let transport = self.backend.connection_state();
        self.state.send_replace(*transport.borrow());

        let handle = SubscriptionHandle {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
        };
        let span = info_span!("realtime_feed", tenant_id = %tenant_id);
        let task = tokio::spawn(
            listen(
                events,
                transport,
                handlers,
                self.notifier.clone(),
                Arc::clone(&self.state),
            )
            .instrument(span),
        );

        if let Some(stale) = subscriptions.insert(
            tenant_id.to_string(),
            Subscription {
                handle: handle.clone(),
                task,
            },
        ) {
            stale.task.abort();
        }
        info!(subscription_id = %handle.id, "Realtime subscription established");
        Ok(handle)
    }

    /// Stops delivery for `handle` and releases the backend channel.
    #[instrument(skip(self), fields(tenant_id = %handle.tenant_id))]
    pub async fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<(), FeedError> {
        let mut subscriptions = self.subscriptions.lock().await;
        let matches = subscriptions
            .get(&handle.tenant_id)
            .is_some_and(|subscription| subscription.handle == *handle);
        if !matches {
            warn!("Unsubscribe for an unknown handle");
            return Err(FeedError::UnknownSubscription(handle.id.to_string()));
        }

        if let Some(subscription) = subscriptions.remove(&handle.tenant_id) {
            subscription.task.abort();
        }
        if subscriptions.is_empty() {
            self.state.send_replace(ConnectionState::Disconnected);
        }
        info!("Realtime subscription released");
        Ok(())
    }
}

impl Drop for RealtimeFeed {
    fn drop(&mut self) {
        for (_, subscription) in self.subscriptions.get_mut().drain() {
            subscription.task.abort();
        }
    }
}

async fn listen(
    mut events: broadcast::Receiver<OrderEvent>,
    mut transport: watch::Receiver<ConnectionState>,
    handlers: Arc<dyn FeedHandlers>,
    notifier: Option<Notifier>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    let mut watching_transport = true;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(OrderEvent::Inserted { order }) => {
                    info!(order_id = %order.id, order_number = order.order_number, "New order pushed");
                    if let Some(notifier) = &notifier {
                        notifier.notify_new_order(&order);
                    }
                    handlers.on_insert(order);
                }
                Ok(OrderEvent::Updated { order_id, status }) => {
                    debug!(order_id = %order_id, status = %status, "Order update pushed");
                    handlers.on_update();
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Realtime feed lagged; requesting a refresh");
                    handlers.on_update();
                }
                Err(RecvError::Closed) => {
                    warn!("Realtime channel closed");
                    state.send_replace(ConnectionState::Disconnected);
                    break;
                }
            },
            changed = transport.changed(), if watching_transport => {
                if changed.is_err() {
                    debug!("Transport state source dropped");
                    watching_transport = false;
                } else {
                    let current = *transport.borrow_and_update();
                    info!(state = ?current, "Realtime connection state changed");
                    state.send_replace(current);
                }
            }
        }
    }
}

/// Keeps the board in sync with pushed events: inserts go straight onto the
/// board, updates trigger a full refresh.
pub struct BoardSync {
    coordinator: MutationCoordinator,
}

impl BoardSync {
    pub fn new(coordinator: MutationCoordinator) -> Self {
        Self { coordinator }
    }
}

impl FeedHandlers for BoardSync {
    fn on_insert(&self, order: Order) {
        let board = self.coordinator.board().clone();
        tokio::spawn(async move {
            if let Err(e) = board.upsert(order).await {
                warn!(error = %e, "Could not add pushed order to the board");
            }
        });
    }

    fn on_update(&self) {
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = coordinator.refresh().await {
                warn!(error = %e, "Refresh after pushed update failed");
            }
        });
    }
}
