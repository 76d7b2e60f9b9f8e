//! Contract with the hosted data platform that owns orders.
//!
//! The board never persists anything itself. It reads full snapshots, sends
//! single-order status updates, and listens to a push feed of row changes.

mod memory;

pub use memory::InMemoryBackend;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::app_system::BackendError;
use crate::domain::{Order, OrderStatus};

/// Row-level change pushed by the realtime transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    Inserted { order: Order },
    Updated { order_id: String, status: OrderStatus },
}

/// Last known state of the realtime transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[async_trait]
pub trait OrderBackend: Send + Sync + 'static {
    /// Full snapshot of a tenant's orders, newest first.
    async fn fetch_orders(&self, tenant_id: &str) -> Result<Vec<Order>, BackendError>;

    /// Writes a single order's status.
    async fn update_order_status(
        &self,
        order_id: &str,
        status: &OrderStatus,
    ) -> Result<(), BackendError>;

    /// Opens a push subscription to insert/update events for one tenant.
    /// Dropping the receiver releases it.
    async fn subscribe(
        &self,
        tenant_id: &str,
    ) -> Result<broadcast::Receiver<OrderEvent>, BackendError>;

    /// Transport connection state. Reconnection is the transport's job.
    fn connection_state(&self) -> watch::Receiver<ConnectionState>;
}
