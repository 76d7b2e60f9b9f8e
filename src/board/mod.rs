//! The board actor: sole owner of the in-memory order list.
//!
//! Optimistic patches, realtime pushes and poll refreshes all arrive as
//! messages on one mailbox, so they are applied one at a time and the last
//! write wins. There is no version check between them.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::clients::BoardClient;
use crate::domain::{Order, OrderStatus};
use crate::kanban::{self, KanbanBoard, TimeFilter};
use crate::messages::{BoardRequest, BoardResponse};

pub struct BoardService {
    receiver: mpsc::Receiver<BoardRequest>,
    orders: Vec<Order>,
    delivered_cap: usize,
}

impl BoardService {
    pub fn new(buffer_size: usize, delivered_cap: usize) -> (Self, BoardClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            orders: Vec::new(),
            delivered_cap,
        };
        let client = BoardClient::new(sender);
        (service, client)
    }

    #[instrument(name = "board_service", skip(self))]
    pub async fn run(mut self) {
        info!("BoardService starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                BoardRequest::ReplaceAll { orders, respond_to } => {
                    self.handle_replace_all(orders, respond_to);
                }
                BoardRequest::PatchStatus {
                    order_id,
                    status,
                    respond_to,
                } => {
                    self.handle_patch_status(order_id, status, respond_to);
                }
                BoardRequest::Upsert { order, respond_to } => {
                    self.handle_upsert(order, respond_to);
                }
                BoardRequest::GetOrder {
                    order_id,
                    respond_to,
                } => {
                    let order = self.orders.iter().find(|o| o.id == order_id).cloned();
                    let _ = respond_to.send(Ok(order));
                }
                BoardRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(Ok(self.orders.clone()));
                }
                BoardRequest::Project {
                    filter,
                    now,
                    respond_to,
                } => {
                    self.handle_project(filter, now, respond_to);
                }
                BoardRequest::Shutdown => {
                    info!("BoardService shutting down");
                    break;
                }
            }
        }

        info!("BoardService stopped");
    }

    #[instrument(fields(order_count = orders.len()), skip(self, orders, respond_to))]
    fn handle_replace_all(&mut self, orders: Vec<Order>, respond_to: BoardResponse<usize>) {
        debug!("Replacing order list with snapshot");
        self.orders = orders;
        let _ = respond_to.send(Ok(self.orders.len()));
    }

    #[instrument(fields(order_id = %order_id, status = %status), skip(self, respond_to))]
    fn handle_patch_status(
        &mut self,
        order_id: String,
        status: OrderStatus,
        respond_to: BoardResponse<Option<OrderStatus>>,
    ) {
        let previous = match self.orders.iter_mut().find(|o| o.id == order_id) {
            Some(order) => {
                let previous = std::mem::replace(&mut order.status, status);
                info!(previous = %previous, "Status patched locally");
                Some(previous)
            }
            None => {
                warn!("Order not on the board; nothing patched");
                None
            }
        };
        let _ = respond_to.send(Ok(previous));
    }

    #[instrument(fields(order_id = %order.id), skip(self, order, respond_to))]
    fn handle_upsert(&mut self, order: Order, respond_to: BoardResponse<()>) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => {
                debug!("Replacing pushed order");
                *existing = order;
            }
            None => {
                debug!("Inserting pushed order");
                self.orders.insert(0, order);
            }
        }
        let _ = respond_to.send(Ok(()));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_project(
        &self,
        filter: TimeFilter,
        now: DateTime<Utc>,
        respond_to: BoardResponse<KanbanBoard>,
    ) {
        let board = kanban::project(&self.orders, filter, now, self.delivered_cap);
        debug!(
            visible = board.total_orders(),
            unplaced = board.unplaced.len(),
            "Board projected"
        );
        let _ = respond_to.send(Ok(board));
    }
}
