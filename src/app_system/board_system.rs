use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::app_system::{BoardError, SystemError};
use crate::backend::OrderBackend;
use crate::board::BoardService;
use crate::clients::BoardClient;
use crate::config::BoardConfig;
use crate::coordinator::{Confirmer, MutationCoordinator};
use crate::dnd::DragController;
use crate::domain::Order;
use crate::feed::{BoardSync, RealtimeFeed, SubscriptionHandle};
use crate::kanban::{KanbanBoard, TimeFilter};
use crate::notify::{NotificationStore, Notifier, SoundPlayer};
use crate::poller::spawn_poller;
use crate::share;

/// The running order board for one tenant.
///
/// Starts the board actor, loads the first snapshot, subscribes to the
/// realtime feed and starts the poll fallback. A failed first load or
/// subscription is logged; the poller recovers from both.
pub struct BoardSystem {
    config: BoardConfig,
    coordinator: MutationCoordinator,
    notifier: Notifier,
    feed: RealtimeFeed,
    subscription: Option<SubscriptionHandle>,
    poller: JoinHandle<()>,
    board_handle: JoinHandle<()>,
}

impl BoardSystem {
    #[instrument(skip_all, fields(tenant_id = %config.tenant_id))]
    pub async fn start(
        config: BoardConfig,
        backend: Arc<dyn OrderBackend>,
        player: Arc<dyn SoundPlayer>,
        store: Arc<dyn NotificationStore>,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let (service, board) = BoardService::new(config.mailbox_size, config.delivered_cap);
        let board_handle = tokio::spawn(service.run());

        let coordinator =
            MutationCoordinator::new(config.tenant_id.clone(), backend.clone(), board, confirmer)
                .with_refresh_on_success(config.refresh_on_success);

        match coordinator.refresh().await {
            Ok(count) => info!(order_count = count, "Initial orders loaded"),
            Err(e) => error!(error = %e, "Initial order load failed"),
        }

        let notifier = Notifier::new(config.tenant_id.clone(), player, store, config.toast_ttl());
        let feed = RealtimeFeed::new(backend, Some(notifier.clone()));
        let subscription = match feed
            .subscribe(&config.tenant_id, Arc::new(BoardSync::new(coordinator.clone())))
            .await
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Realtime feed unavailable; relying on polling");
                None
            }
        };

        let poller = spawn_poller(coordinator.clone(), config.poll_interval());
        info!("Board system started");

        Self {
            config,
            coordinator,
            notifier,
            feed,
            subscription,
            poller,
            board_handle,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }

    pub fn client(&self) -> &BoardClient {
        self.coordinator.board()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn feed(&self) -> &RealtimeFeed {
        &self.feed
    }

    /// Current kanban board under the configured time filter.
    pub async fn board(&self) -> Result<KanbanBoard, BoardError> {
        self.board_with(self.config.time_filter).await
    }

    pub async fn board_with(&self, filter: TimeFilter) -> Result<KanbanBoard, BoardError> {
        self.client().project(filter, Utc::now()).await
    }

    pub fn drag_controller(&self) -> DragController {
        DragController::new(self.coordinator.clone(), self.config.drag)
    }

    pub fn driver_link(&self, order_id: &str) -> String {
        share::driver_link(&self.config.origin, order_id)
    }

    /// WhatsApp handoff carrying the order details and its driver link.
    pub fn courier_link(&self, order: &Order, phone: Option<&str>) -> String {
        share::whatsapp_link(order, &self.config.origin, phone)
    }

    /// Releases the subscription, stops polling and drains the board actor.
    pub async fn shutdown(mut self) -> Result<(), SystemError> {
        info!("Shutting down board system...");

        if let Some(handle) = &self.subscription {
            if let Err(e) = self.feed.unsubscribe(handle).await {
                warn!(error = %e, "Unsubscribe failed during shutdown");
            }
        }
        self.poller.abort();
        self.client().shutdown().await?;

        if let Err(e) = (&mut self.board_handle).await {
            error!("Board task failed: {:?}", e);
            return Err(SystemError::TaskFailed(e.to_string()));
        }

        info!("Board system shutdown complete.");
        Ok(())
    }
}

impl Drop for BoardSystem {
    fn drop(&mut self) {
        self.poller.abort();
    }
}
