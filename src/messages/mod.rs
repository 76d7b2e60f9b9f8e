use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::app_system::BoardError;
use crate::domain::{Order, OrderStatus};
use crate::kanban::{KanbanBoard, TimeFilter};

/// Generic type aliases for board communication
pub type BoardResult<T> = std::result::Result<T, BoardError>;
pub type BoardResponse<T> = oneshot::Sender<BoardResult<T>>;

/// Typed messages for the board actor. Each variant includes parameters
/// and a oneshot channel for the response.
#[derive(Debug)]
pub enum BoardRequest {
    /// Replaces the whole list with an authoritative snapshot.
    ReplaceAll {
        orders: Vec<Order>,
        respond_to: BoardResponse<usize>,
    },
    /// Overwrites one order's status, returning the status it had before.
    PatchStatus {
        order_id: String,
        status: OrderStatus,
        respond_to: BoardResponse<Option<OrderStatus>>,
    },
    /// Inserts a pushed order at the head of the list, or replaces it.
    Upsert {
        order: Order,
        respond_to: BoardResponse<()>,
    },
    GetOrder {
        order_id: String,
        respond_to: BoardResponse<Option<Order>>,
    },
    Snapshot {
        respond_to: BoardResponse<Vec<Order>>,
    },
    Project {
        filter: TimeFilter,
        now: DateTime<Utc>,
        respond_to: BoardResponse<KanbanBoard>,
    },
    Shutdown,
}
