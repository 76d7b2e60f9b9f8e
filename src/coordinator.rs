//! Optimistic status mutations.
//!
//! Every change is patched into the board first, then sent to the backend.
//! A failed remote call is reconciled by re-fetching the authoritative list,
//! never by undoing the local patch.
//!
//! Concurrent calls for the same order are not debounced. Each one patches
//! the board, and whichever remote call resolves last decides the stored
//! status. Poll refreshes and realtime pushes race with both; the board applies
//! writes in arrival order with no version check.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::app_system::CoordinatorError;
use crate::backend::OrderBackend;
use crate::clients::BoardClient;
use crate::domain::{Order, OrderStatus};
use crate::transitions::{self, OrderAction};

const ALERT_BUFFER: usize = 32;

/// Asks the user before destructive actions (cancel, reject).
#[async_trait]
pub trait Confirmer: Send + Sync + 'static {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything. Used by the unattended demo.
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        debug!(prompt, "Auto-confirming");
        true
    }
}

/// User-facing failure notice raised when a mutation does not stick.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub order_id: String,
    pub message: String,
}

type InFlight = Arc<Mutex<HashMap<String, usize>>>;

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<String, usize>> {
    in_flight.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks an order as having a mutation in flight until dropped.
struct InFlightGuard {
    in_flight: InFlight,
    order_id: String,
}

impl InFlightGuard {
    fn enter(in_flight: &InFlight, order_id: &str) -> Self {
        *lock(in_flight).entry(order_id.to_string()).or_insert(0) += 1;
        Self {
            in_flight: Arc::clone(in_flight),
            order_id: order_id.to_string(),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut map = lock(&self.in_flight);
        if let Some(count) = map.get_mut(&self.order_id) {
            *count -= 1;
            if *count == 0 {
                map.remove(&self.order_id);
            }
        }
    }
}

#[derive(Clone)]
pub struct MutationCoordinator {
    tenant_id: String,
    backend: Arc<dyn OrderBackend>,
    board: BoardClient,
    confirmer: Arc<dyn Confirmer>,
    alerts: broadcast::Sender<Alert>,
    in_flight: InFlight,
    refresh_on_success: bool,
}

impl MutationCoordinator {
    pub fn new(
        tenant_id: impl Into<String>,
        backend: Arc<dyn OrderBackend>,
        board: BoardClient,
        confirmer: Arc<dyn Confirmer>,
    ) -> Self {
        let (alerts, _rx) = broadcast::channel(ALERT_BUFFER);
        Self {
            tenant_id: tenant_id.into(),
            backend,
            board,
            confirmer,
            alerts,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            refresh_on_success: false,
        }
    }

    /// Also re-fetches the list after successful updates, for cross-field consistency.
    pub fn with_refresh_on_success(mut self, enabled: bool) -> Self {
        self.refresh_on_success = enabled;
        self
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn board(&self) -> &BoardClient {
        &self.board
    }

    pub fn alerts(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    /// Whether a mutation for `order_id` is awaiting the backend. The UI uses
    /// this to disable buttons; nothing here prevents a second call.
    pub fn is_in_flight(&self, order_id: &str) -> bool {
        lock(&self.in_flight).contains_key(order_id)
    }

    /// Moves `order_id` to `new_status`: local patch, remote call, reconcile.
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id, status = %new_status))]
    pub async fn advance(
        &self,
        order_id: &str,
        new_status: OrderStatus,
    ) -> Result<(), CoordinatorError> {
        let _guard = InFlightGuard::enter(&self.in_flight, order_id);

        match self
            .board
            .patch_status(order_id.to_string(), new_status.clone())
            .await
        {
            Ok(Some(previous)) => debug!(previous = %previous, "Optimistic patch applied"),
            Ok(None) => warn!("Order not on the local board; sending update anyway"),
            Err(e) => {
                warn!(error = %e, "Board is gone; dropping mutation");
                return Err(e.into());
            }
        }

        match self.backend.update_order_status(order_id, &new_status).await {
            Ok(()) => {
                info!("Status update confirmed by backend");
                if self.refresh_on_success {
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "Post-update refresh failed");
                    }
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Status update failed; reconciling from backend");
                if let Err(refresh_error) = self.refresh().await {
                    error!(error = %refresh_error, "Reconciliation refresh failed");
                }
                let _ = self.alerts.send(Alert {
                    order_id: order_id.to_string(),
                    message: format!("No se pudo actualizar el pedido: {}", e),
                });
                Err(e.into())
            }
        }
    }

    async fn current_order(&self, order_id: &str) -> Result<Order, CoordinatorError> {
        self.board
            .get_order(order_id.to_string())
            .await?
            .ok_or_else(|| CoordinatorError::NotFound(order_id.to_string()))
    }

    /// Advances one stage along the transition table.
    #[instrument(skip(self))]
    pub async fn advance_one_stage(&self, order_id: &str) -> Result<(), CoordinatorError> {
        let order = self.current_order(order_id).await?;

        match transitions::next_status(&order.status) {
            Some(next) => self.advance(order_id, next).await,
            None => Err(CoordinatorError::NoTransition {
                order_id: order_id.to_string(),
                status: order.status.to_string(),
            }),
        }
    }

    pub async fn accept(&self, order_id: &str) -> Result<(), CoordinatorError> {
        self.perform(order_id, OrderAction::Accept).await
    }

    pub async fn reject(&self, order_id: &str) -> Result<(), CoordinatorError> {
        self.perform(order_id, OrderAction::Reject).await
    }

    pub async fn cancel(&self, order_id: &str) -> Result<(), CoordinatorError> {
        self.perform(order_id, OrderAction::Cancel).await
    }

    /// Runs the mutation behind a board button.
    ///
    /// The action is checked against the order's status on the board first;
    /// a stale card cannot move an order backwards or reopen a finished one.
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn perform(&self, order_id: &str, action: OrderAction) -> Result<(), CoordinatorError> {
        let order = self.current_order(order_id).await?;
        if !transitions::permits(&order.status, &action) {
            warn!(
                status = %order.status,
                action = action.label(),
                "Action not allowed from the current status"
            );
            return Err(CoordinatorError::NoTransition {
                order_id: order_id.to_string(),
                status: order.status.to_string(),
            });
        }

        if action.requires_confirmation() {
            let verb = match action {
                OrderAction::Reject => "Rechazar",
                _ => "Cancelar",
            };
            let prompt = format!("¿{} el pedido #{}?", verb, order.order_number);
            if !self.confirmer.confirm(&prompt).await {
                info!("Cancellation declined by user");
                return Err(CoordinatorError::NotConfirmed(order_id.to_string()));
            }
        }

        self.advance(order_id, action.target_status()).await
    }

    /// Replaces the board with the backend's snapshot.
    #[instrument(skip(self), fields(tenant_id = %self.tenant_id))]
    pub async fn refresh(&self) -> Result<usize, CoordinatorError> {
        let orders = self.backend.fetch_orders(&self.tenant_id).await?;
        let count = self.board.replace_all(orders).await?;
        debug!(order_count = count, "Board refreshed from backend");
        Ok(count)
    }
}
