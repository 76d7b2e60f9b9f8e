use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use tracing::{debug, error, info, Instrument};

use order_board::app_system::{setup_tracing, BoardSystem};
use order_board::backend::InMemoryBackend;
use order_board::config::BoardConfig;
use order_board::coordinator::AutoConfirm;
use order_board::dnd::{Gesture, PointerKind};
use order_board::domain::{Order, OrderItem, OrderStatus};
use order_board::kanban::{ColumnId, KanbanBoard};
use order_board::notify::{JsonFileStore, LogChime, MemoryStore, NotificationStore};
use order_board::transitions::{available_actions, OrderAction};

fn log_board(board: &KanbanBoard) {
    for column in &board.columns {
        let numbers: Vec<u64> = column.orders.iter().map(|o| o.order_number).collect();
        info!(
            column = column.id.title(),
            orders = ?numbers,
            dishes = column.dish_count,
            hidden = column.hidden,
            "Column"
        );
        for order in &column.orders {
            let buttons: Vec<String> = available_actions(&order.status)
                .iter()
                .map(|action| {
                    if action.requires_confirmation() {
                        format!("{}?", action.label())
                    } else {
                        action.label().to_string()
                    }
                })
                .collect();
            debug!(order_number = order.order_number, ?buttons, "Card");
        }
    }
}

async fn seed(backend: &InMemoryBackend, tenant_id: &str) {
    let now = Utc::now();
    let orders = [
        Order::new("seed-97", 97, "Luis", OrderStatus::parse("on_way"))
            .for_delivery("Av. Reforma 100", 3.0),
        Order::new("seed-98", 98, "Marta", OrderStatus::parse("ready"))
            .with_item(OrderItem::new("Pozole", 1, 9.5)),
        Order::new("seed-99", 99, "Jorge", OrderStatus::parse("preparando"))
            .with_item(OrderItem::new("Taco al pastor", 3, 7.5).with_modifier("Extra piña", 0.5)),
        Order::new("seed-old", 12, "Ayer", OrderStatus::Pending),
    ];
    for (age, order) in orders.into_iter().enumerate() {
        let created_at = if order.order_number == 12 {
            now - Duration::hours(30)
        } else {
            now - Duration::minutes(10 * (4 - age as i64))
        };
        backend.seed(tenant_id, order.created_at(created_at)).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_tracing();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = BoardConfig::load(config_path.as_deref()).context("loading configuration")?;
    info!(tenant_id = %config.tenant_id, "Starting order board");

    let backend = Arc::new(InMemoryBackend::new());
    seed(&backend, &config.tenant_id).await;

    let store: Arc<dyn NotificationStore> = match &config.notifications_dir {
        Some(dir) => Arc::new(JsonFileStore::new(dir)),
        None => Arc::new(MemoryStore::default()),
    };
    let tenant_id = config.tenant_id.clone();
    let system = BoardSystem::start(
        config,
        backend.clone(),
        Arc::new(LogChime),
        store,
        Arc::new(AutoConfirm),
    )
    .await;
    let mut alerts = system.coordinator().alerts();

    // A customer places an order; it arrives over the realtime feed.
    let incoming = Order::new("order-100", 100, "Ana", OrderStatus::Pending)
        .with_item(OrderItem::new("Enchiladas", 2, 12.0))
        .for_delivery("Calle 5 #10", 2.5)
        .created_at(Utc::now());
    backend.place_order(&tenant_id, incoming.clone()).await;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    for toast in system.notifier().active_toasts(Utc::now()) {
        info!(title = %toast.title, body = %toast.body, "Toast");
    }

    let span = tracing::info_span!("kitchen_flow", order_id = %incoming.id);
    async {
        let coordinator = system.coordinator();
        coordinator.perform(&incoming.id, OrderAction::Accept).await?;

        let mut drag = system.drag_controller();
        let mut gesture = drag.begin_gesture(PointerKind::Mouse, (40.0, 120.0));
        if gesture.moved((40.0, 180.0), std::time::Duration::from_millis(120)) == Gesture::Drag {
            drag.drag_start(incoming.clone());
            let outcome = drag.drag_end(Some(ColumnId::Listo.as_str())).await?;
            info!(?outcome, "Drag finished");
        }

        coordinator.advance_one_stage(&incoming.id).await?;
        if let Some(order) = system.client().get_order(incoming.id.clone()).await? {
            info!(
                link = %system.driver_link(&order.id),
                whatsapp = %system.courier_link(&order, None),
                "Courier handoff"
            );
        }
        coordinator.perform("seed-97", OrderAction::Advance(OrderStatus::Delivered)).await?;
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await?;

    // A failing update is rolled back to the server's value.
    backend.fail_updates_for("seed-98", true).await;
    if let Err(e) = system.coordinator().advance_one_stage("seed-98").await {
        error!(error = %e, "Update failed as expected");
    }
    if let Ok(alert) = alerts.try_recv() {
        info!(order_id = %alert.order_id, message = %alert.message, "Alert");
    }

    let board = system.board().await?;
    log_board(&board);
    info!(unread = system.notifier().unread_count(), "Notifications");

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
