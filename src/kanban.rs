//! Kanban projection of the order list.
//!
//! [`project`] is a pure function of its inputs: the same list, filter and
//! clock always produce the same board. It reads the normalized status only.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Order, OrderStatus};

/// Default number of delivered orders shown on the board.
pub const DELIVERED_VISIBLE: usize = 5;

const PENDIENTE: &[OrderStatus] = &[OrderStatus::Pending];
const PREPARACION: &[OrderStatus] = &[OrderStatus::Confirmed, OrderStatus::Preparing];
const LISTO: &[OrderStatus] = &[OrderStatus::Ready];
const EN_CAMINO: &[OrderStatus] = &[OrderStatus::EnRoute];
const ENTREGADO: &[OrderStatus] = &[OrderStatus::Delivered];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnId {
    Pendiente,
    Preparacion,
    Listo,
    EnCamino,
    Entregado,
}

impl ColumnId {
    pub const ALL: [ColumnId; 5] = [
        ColumnId::Pendiente,
        ColumnId::Preparacion,
        ColumnId::Listo,
        ColumnId::EnCamino,
        ColumnId::Entregado,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::Preparacion => "preparacion",
            Self::Listo => "listo",
            Self::EnCamino => "en_camino",
            Self::Entregado => "entregado",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.as_str() == id)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Pendiente => "Pendientes",
            Self::Preparacion => "En preparación",
            Self::Listo => "Listos",
            Self::EnCamino => "En camino",
            Self::Entregado => "Entregados",
        }
    }

    /// Statuses grouped under this column.
    pub fn statuses(&self) -> &'static [OrderStatus] {
        match self {
            Self::Pendiente => PENDIENTE,
            Self::Preparacion => PREPARACION,
            Self::Listo => LISTO,
            Self::EnCamino => EN_CAMINO,
            Self::Entregado => ENTREGADO,
        }
    }

    /// Status an order takes when it is dropped on this column.
    pub fn drop_status(&self) -> OrderStatus {
        match self {
            Self::Pendiente => OrderStatus::Pending,
            Self::Preparacion => OrderStatus::Preparing,
            Self::Listo => OrderStatus::Ready,
            Self::EnCamino => OrderStatus::EnRoute,
            Self::Entregado => OrderStatus::Delivered,
        }
    }

    /// Column showing orders in `status`. Cancelled and unknown orders have none.
    pub fn for_status(status: &OrderStatus) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|column| column.statuses().contains(status))
    }
}

/// Trailing window applied before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    #[default]
    #[serde(rename = "last_24_hours")]
    Last24Hours,
    AllTime,
}

impl TimeFilter {
    /// Orders without a timestamp are always visible.
    pub fn includes(&self, order: &Order, now: DateTime<Utc>) -> bool {
        match (self, order.created_at) {
            (Self::AllTime, _) | (_, None) => true,
            (Self::Last24Hours, Some(created_at)) => {
                now.signed_duration_since(created_at) <= Duration::hours(24)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KanbanColumn {
    pub id: ColumnId,
    pub orders: Vec<Order>,
    /// Sum of item quantities across the visible orders.
    pub dish_count: u32,
    /// Members left out by the display cap.
    pub hidden: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KanbanBoard {
    pub columns: Vec<KanbanColumn>,
    /// Ids of filtered-in orders whose status matched no column.
    pub unplaced: Vec<String>,
}

impl KanbanBoard {
    pub fn column(&self, id: ColumnId) -> &KanbanColumn {
        // Columns are built from ColumnId::ALL in order.
        &self.columns[id as usize]
    }

    pub fn column_of(&self, order_id: &str) -> Option<ColumnId> {
        self.columns
            .iter()
            .find(|column| column.orders.iter().any(|order| order.id == order_id))
            .map(|column| column.id)
    }

    pub fn total_orders(&self) -> usize {
        self.columns.iter().map(|column| column.orders.len()).sum()
    }
}

/// Groups `orders` into the fixed columns.
///
/// Source order is kept within each column; the source list is expected to
/// be newest first, so the delivered cap keeps the most recent ones.
pub fn project(
    orders: &[Order],
    filter: TimeFilter,
    now: DateTime<Utc>,
    delivered_cap: usize,
) -> KanbanBoard {
    let mut columns: Vec<KanbanColumn> = ColumnId::ALL
        .into_iter()
        .map(|id| KanbanColumn {
            id,
            orders: Vec::new(),
            dish_count: 0,
            hidden: 0,
        })
        .collect();
    let mut unplaced = Vec::new();

    for order in orders.iter().filter(|order| filter.includes(order, now)) {
        match ColumnId::for_status(&order.status) {
            Some(id) => columns[id as usize].orders.push(order.clone()),
            None if order.status.is_known() => {}
            None => {
                warn!(
                    order_id = %order.id,
                    status = %order.status,
                    "Order status matches no column; left off the board"
                );
                unplaced.push(order.id.clone());
            }
        }
    }

    let delivered = &mut columns[ColumnId::Entregado as usize];
    if delivered.orders.len() > delivered_cap {
        delivered.hidden = delivered.orders.len() - delivered_cap;
        delivered.orders.truncate(delivered_cap);
    }

    for column in &mut columns {
        column.dish_count = column.orders.iter().map(Order::dish_count).sum();
    }

    KanbanBoard { columns, unplaced }
}
