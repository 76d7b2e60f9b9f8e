//! Periodic full refresh, a safety net for events the realtime feed missed.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info_span, warn, Instrument};

use crate::coordinator::MutationCoordinator;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(45);

/// Spawns a task that refreshes the board every `interval`, starting one
/// interval from now. Failed refreshes are logged and the loop carries on.
/// The task ends once the board actor is gone; abort the handle to stop it
/// earlier.
pub fn spawn_poller(coordinator: MutationCoordinator, interval: Duration) -> JoinHandle<()> {
    let span = info_span!("poller", tenant_id = %coordinator.tenant_id());
    tokio::spawn(
        async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !coordinator.board().is_open() {
                    debug!("Board closed; poller exiting");
                    break;
                }
                match coordinator.refresh().await {
                    Ok(count) => debug!(count, "Poll refresh complete"),
                    Err(e) => warn!(error = %e, "Poll refresh failed"),
                }
            }
        }
        .instrument(span),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::backend::InMemoryBackend;
    use crate::board::BoardService;
    use crate::coordinator::AutoConfirm;
    use crate::domain::{Order, OrderStatus};
    use crate::kanban::DELIVERED_VISIBLE;
    use crate::mock_framework::wait_until;

    #[tokio::test]
    async fn test_poll_picks_up_silent_changes_and_survives_failures() {
        let backend = Arc::new(InMemoryBackend::new());
        let (service, board) = BoardService::new(16, DELIVERED_VISIBLE);
        tokio::spawn(service.run());
        let coordinator =
            MutationCoordinator::new("t1", backend.clone(), board.clone(), Arc::new(AutoConfirm));

        backend.fail_fetches(true).await;
        let poller = spawn_poller(coordinator, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!poller.is_finished());

        backend.fail_fetches(false).await;
        backend
            .seed("t1", Order::new("o1", 1, "Ana", OrderStatus::Pending))
            .await;

        let mut found = false;
        for _ in 0..100 {
            if board.get_order("o1".to_string()).await.unwrap().is_some() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(found);

        board.shutdown().await.unwrap();
        wait_until(|| poller.is_finished()).await;
    }
}
