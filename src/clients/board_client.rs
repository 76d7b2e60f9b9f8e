use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::app_system::BoardError;
use crate::domain::{Order, OrderStatus};
use crate::kanban::{KanbanBoard, TimeFilter};
use crate::messages::BoardRequest;

/// Handle to the board actor. Cheap to clone; every clone talks to the same list.
#[derive(Clone)]
pub struct BoardClient {
    sender: mpsc::Sender<BoardRequest>,
}

impl BoardClient {
    pub(crate) fn new(sender: mpsc::Sender<BoardRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), BoardError> {
        debug!("Sending shutdown request");
        self.sender
            .send(BoardRequest::Shutdown)
            .await
            .map_err(|_| BoardError::Closed)
    }

    /// `false` once the actor has stopped and can no longer apply changes.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

client_method!(BoardClient => fn replace_all(orders: Vec<Order>) -> usize as BoardRequest::ReplaceAll);
client_method!(BoardClient => fn patch_status(order_id: String, status: OrderStatus) -> Option<OrderStatus> as BoardRequest::PatchStatus);
client_method!(BoardClient => fn upsert(order: Order) -> () as BoardRequest::Upsert);
client_method!(BoardClient => fn get_order(order_id: String) -> Option<Order> as BoardRequest::GetOrder);
client_method!(BoardClient => fn snapshot() -> Vec<Order> as BoardRequest::Snapshot);
client_method!(BoardClient => fn project(filter: TimeFilter, now: DateTime<Utc>) -> KanbanBoard as BoardRequest::Project);
