use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, info, instrument, warn};

use super::{ConnectionState, OrderBackend, OrderEvent};
use crate::app_system::BackendError;
use crate::domain::{Order, OrderStatus};

const EVENT_BUFFER: usize = 256;

#[derive(Default)]
struct MemoryState {
    orders: HashMap<String, Vec<Order>>,
    channels: HashMap<String, broadcast::Sender<OrderEvent>>,
    failing_updates: HashSet<String>,
    update_delays: HashMap<String, Duration>,
    fail_fetches: bool,
    refuse_subscriptions: bool,
    update_calls: usize,
}

/// Process-local stand-in for the hosted backend.
///
/// Used by the demo binary and the tests. Faults can be injected per order
/// (failing or slow updates) and per transport (refused subscriptions,
/// disconnects, failing snapshots).
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
    connection: watch::Sender<ConnectionState>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (connection, _rx) = watch::channel(ConnectionState::Connected);
        Self {
            state: Mutex::new(MemoryState::default()),
            connection,
        }
    }

    /// Stores an order without emitting an event, as if it predated the session.
    pub async fn seed(&self, tenant_id: &str, order: Order) {
        let mut state = self.state.lock().await;
        state
            .orders
            .entry(tenant_id.to_string())
            .or_default()
            .push(order);
    }

    /// Stores an order and pushes an insert event to the tenant's subscribers.
    #[instrument(skip(self, order), fields(order_id = %order.id, order_number = order.order_number))]
    pub async fn place_order(&self, tenant_id: &str, order: Order) {
        let mut state = self.state.lock().await;
        state
            .orders
            .entry(tenant_id.to_string())
            .or_default()
            .push(order.clone());

        if let Some(channel) = state.channels.get(tenant_id) {
            let delivered = channel.send(OrderEvent::Inserted { order }).unwrap_or(0);
            debug!(subscribers = delivered, "Insert event published");
        }
        info!("Order placed");
    }

    pub async fn order(&self, order_id: &str) -> Option<Order> {
        let state = self.state.lock().await;
        state
            .orders
            .values()
            .flatten()
            .find(|order| order.id == order_id)
            .cloned()
    }

    /// Makes every status update for `order_id` fail until cleared.
    pub async fn fail_updates_for(&self, order_id: &str, failing: bool) {
        let mut state = self.state.lock().await;
        if failing {
            state.failing_updates.insert(order_id.to_string());
        } else {
            state.failing_updates.remove(order_id);
        }
    }

    /// Delays status updates for `order_id` before they are applied.
    pub async fn delay_updates_for(&self, order_id: &str, delay: Duration) {
        let mut state = self.state.lock().await;
        state.update_delays.insert(order_id.to_string(), delay);
    }

    pub async fn fail_fetches(&self, failing: bool) {
        self.state.lock().await.fail_fetches = failing;
    }

    pub async fn refuse_subscriptions(&self, refuse: bool) {
        self.state.lock().await.refuse_subscriptions = refuse;
    }

    pub fn set_connected(&self, connected: bool) {
        let state = if connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        self.connection.send_replace(state);
    }

    pub async fn update_calls(&self) -> usize {
        self.state.lock().await.update_calls
    }
}

#[async_trait]
impl OrderBackend for InMemoryBackend {
    #[instrument(skip(self))]
    async fn fetch_orders(&self, tenant_id: &str) -> Result<Vec<Order>, BackendError> {
        let state = self.state.lock().await;
        if state.fail_fetches {
            warn!("Snapshot fetch failing by configuration");
            return Err(BackendError::Network("snapshot unavailable".to_string()));
        }

        let mut orders = state.orders.get(tenant_id).cloned().unwrap_or_default();
        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.order_number.cmp(&a.order_number))
        });
        debug!(order_count = orders.len(), "Snapshot served");
        Ok(orders)
    }

    #[instrument(skip(self), fields(status = %status))]
    async fn update_order_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
    ) -> Result<(), BackendError> {
        let delay = {
            let mut state = self.state.lock().await;
            state.update_calls += 1;
            state.update_delays.get(order_id).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        if state.failing_updates.contains(order_id) {
            warn!("Status update failing by configuration");
            return Err(BackendError::Network(format!(
                "update for {} timed out",
                order_id
            )));
        }
        if !status.is_known() {
            warn!(status = %status, "Refusing to store an unrecognized status");
            return Err(BackendError::Rejected(format!(
                "{} is not a valid order status",
                status
            )));
        }

        let MemoryState {
            orders, channels, ..
        } = &mut *state;
        for (tenant_id, tenant_orders) in orders.iter_mut() {
            if let Some(order) = tenant_orders.iter_mut().find(|order| order.id == order_id) {
                order.status = status.clone();
                if let Some(channel) = channels.get(tenant_id) {
                    let _ = channel.send(OrderEvent::Updated {
                        order_id: order_id.to_string(),
                        status: status.clone(),
                    });
                }
                debug!("Status stored");
                return Ok(());
            }
        }

        Err(BackendError::NotFound(order_id.to_string()))
    }

    #[instrument(skip(self))]
    async fn subscribe(
        &self,
        tenant_id: &str,
    ) -> Result<broadcast::Receiver<OrderEvent>, BackendError> {
        let mut state = self.state.lock().await;
        if state.refuse_subscriptions {
            return Err(BackendError::Subscribe(
                "realtime channel refused".to_string(),
            ));
        }

        let channel = state
            .channels
            .entry(tenant_id.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_BUFFER).0);
        debug!("Realtime channel opened");
        Ok(channel.subscribe())
    }

    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }
}
