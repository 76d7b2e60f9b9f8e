//! Drag-and-drop between kanban columns.
//!
//! Dropping a card on a column funnels through [`MutationCoordinator::advance`]
//! with the column's status. Unlike the buttons, drops are not checked
//! against the transition table: a card may be dragged backwards to correct
//! a mistake.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::app_system::CoordinatorError;
use crate::coordinator::MutationCoordinator;
use crate::domain::{Order, OrderStatus};
use crate::kanban::ColumnId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// When a press turns into a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConstraint {
    /// Pointer travel before a mouse press becomes a drag.
    pub distance_px: f64,
    /// Hold time before a touch press becomes a drag.
    #[serde(rename = "touch_delay_ms", with = "millis")]
    pub touch_delay: Duration,
    /// Movement allowed during the touch hold; more than this is a scroll.
    pub touch_tolerance_px: f64,
}

impl Default for ActivationConstraint {
    fn default() -> Self {
        Self {
            distance_px: 10.0,
            touch_delay: Duration::from_millis(250),
            touch_tolerance_px: 5.0,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Undecided,
    Click,
    Drag,
    Scroll,
}

/// Classifies one press as a click, a drag or (on touch) a scroll.
///
/// Feed it moves in time order with the time elapsed since the press.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    kind: PointerKind,
    constraint: ActivationConstraint,
    origin: (f64, f64),
    gesture: Gesture,
}

impl GestureTracker {
    pub fn press(kind: PointerKind, origin: (f64, f64), constraint: ActivationConstraint) -> Self {
        Self {
            kind,
            constraint,
            origin,
            gesture: Gesture::Undecided,
        }
    }

    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn moved(&mut self, position: (f64, f64), elapsed: Duration) -> Gesture {
        if self.gesture != Gesture::Undecided {
            return self.gesture;
        }

        let travel = (position.0 - self.origin.0).hypot(position.1 - self.origin.1);
        self.gesture = match self.kind {
            PointerKind::Mouse if travel >= self.constraint.distance_px => Gesture::Drag,
            PointerKind::Mouse => Gesture::Undecided,
            PointerKind::Touch if elapsed >= self.constraint.touch_delay => Gesture::Drag,
            PointerKind::Touch if travel > self.constraint.touch_tolerance_px => Gesture::Scroll,
            PointerKind::Touch => Gesture::Undecided,
        };
        self.gesture
    }

    pub fn release(&mut self, position: (f64, f64), elapsed: Duration) -> Gesture {
        if self.moved(position, elapsed) == Gesture::Undecided {
            self.gesture = Gesture::Click;
        }
        self.gesture
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    NoActiveDrag,
    /// Released outside any column.
    NoTarget,
    /// Released on the column the card already sits in.
    SameColumn(ColumnId),
    Moved {
        order_id: String,
        to: OrderStatus,
    },
}

pub struct DragController {
    coordinator: MutationCoordinator,
    constraint: ActivationConstraint,
    active: Option<Order>,
}

impl DragController {
    pub fn new(coordinator: MutationCoordinator, constraint: ActivationConstraint) -> Self {
        Self {
            coordinator,
            constraint,
            active: None,
        }
    }

    pub fn begin_gesture(&self, kind: PointerKind, origin: (f64, f64)) -> GestureTracker {
        GestureTracker::press(kind, origin, self.constraint)
    }

    /// Captures the dragged order; the copy backs the drag preview.
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    pub fn drag_start(&mut self, order: Order) {
        debug!("Drag started");
        self.active = Some(order);
    }

    pub fn active(&self) -> Option<&Order> {
        self.active.as_ref()
    }

    pub fn drag_cancel(&mut self) {
        self.active = None;
    }

    /// Finishes the drag over the droppable with id `over`, if any.
    #[instrument(skip(self))]
    pub async fn drag_end(&mut self, over: Option<&str>) -> Result<DropOutcome, CoordinatorError> {
        let Some(order) = self.active.take() else {
            return Ok(DropOutcome::NoActiveDrag);
        };
        let Some(target) = over.and_then(ColumnId::parse) else {
            debug!(order_id = %order.id, "Dropped outside any column");
            return Ok(DropOutcome::NoTarget);
        };
        if ColumnId::for_status(&order.status) == Some(target) {
            debug!(order_id = %order.id, column = target.as_str(), "Dropped on its own column");
            return Ok(DropOutcome::SameColumn(target));
        }

        let to = target.drop_status();
        if order.status.is_terminal() {
            info!(order_id = %order.id, from = %order.status, "Reopening a closed order by drag");
        }
        info!(
            order_id = %order.id,
            from = %order.status,
            to = %to,
            "Card dropped on a new column"
        );
        self.coordinator.advance(&order.id, to.clone()).await?;
        Ok(DropOutcome::Moved {
            order_id: order.id,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::backend::InMemoryBackend;
    use crate::board::BoardService;
    use crate::coordinator::AutoConfirm;
    use crate::kanban::DELIVERED_VISIBLE;

    async fn controller_with(order: Order) -> (DragController, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        backend.seed("t1", order).await;
        let (service, board) = BoardService::new(16, DELIVERED_VISIBLE);
        tokio::spawn(service.run());
        let coordinator =
            MutationCoordinator::new("t1", backend.clone(), board, Arc::new(AutoConfirm));
        coordinator.refresh().await.unwrap();
        (
            DragController::new(coordinator, ActivationConstraint::default()),
            backend,
        )
    }

    #[test]
    fn test_mouse_needs_ten_pixels() {
        let mut tracker =
            GestureTracker::press(PointerKind::Mouse, (0.0, 0.0), ActivationConstraint::default());
        assert_eq!(tracker.moved((6.0, 0.0), Duration::from_millis(5)), Gesture::Undecided);
        assert_eq!(tracker.moved((6.0, 8.0), Duration::from_millis(10)), Gesture::Drag);

        let mut click =
            GestureTracker::press(PointerKind::Mouse, (0.0, 0.0), ActivationConstraint::default());
        assert_eq!(click.release((3.0, 3.0), Duration::from_millis(80)), Gesture::Click);
    }

    #[test]
    fn test_touch_hold_versus_scroll() {
        let constraint = ActivationConstraint::default();

        let mut scroll = GestureTracker::press(PointerKind::Touch, (0.0, 0.0), constraint);
        assert_eq!(scroll.moved((0.0, 30.0), Duration::from_millis(100)), Gesture::Scroll);
        assert_eq!(scroll.release((0.0, 60.0), Duration::from_millis(400)), Gesture::Scroll);

        let mut hold = GestureTracker::press(PointerKind::Touch, (0.0, 0.0), constraint);
        assert_eq!(hold.moved((2.0, 2.0), Duration::from_millis(100)), Gesture::Undecided);
        assert_eq!(hold.moved((40.0, 0.0), Duration::from_millis(300)), Gesture::Drag);

        let mut tap = GestureTracker::press(PointerKind::Touch, (0.0, 0.0), constraint);
        assert_eq!(tap.release((1.0, 0.0), Duration::from_millis(90)), Gesture::Click);
    }

    #[tokio::test]
    async fn test_drop_on_preparacion_means_preparing() {
        let order = Order::new("o100", 100, "Ana", OrderStatus::Pending);
        let (mut controller, backend) = controller_with(order.clone()).await;

        controller.drag_start(order);
        let outcome = controller.drag_end(Some("preparacion")).await.unwrap();

        assert_eq!(
            outcome,
            DropOutcome::Moved {
                order_id: "o100".to_string(),
                to: OrderStatus::Preparing
            }
        );
        assert_eq!(backend.order("o100").await.unwrap().status.as_str(), "preparando");
        assert!(controller.active().is_none());
    }

    #[tokio::test]
    async fn test_same_column_and_no_target_do_nothing() {
        let order = Order::new("o1", 1, "Ana", OrderStatus::Confirmed);
        let (mut controller, backend) = controller_with(order.clone()).await;

        controller.drag_start(order.clone());
        assert_eq!(
            controller.drag_end(Some("preparacion")).await.unwrap(),
            DropOutcome::SameColumn(ColumnId::Preparacion)
        );

        controller.drag_start(order.clone());
        assert_eq!(controller.drag_end(None).await.unwrap(), DropOutcome::NoTarget);

        controller.drag_start(order);
        assert_eq!(
            controller.drag_end(Some("papelera")).await.unwrap(),
            DropOutcome::NoTarget
        );

        assert_eq!(controller.drag_end(Some("listo")).await.unwrap(), DropOutcome::NoActiveDrag);
        assert_eq!(backend.update_calls().await, 0);
    }

    #[tokio::test]
    async fn test_backward_drag_is_allowed() {
        let order = Order::new("o1", 1, "Ana", OrderStatus::Delivered);
        let (mut controller, backend) = controller_with(order.clone()).await;

        controller.drag_start(order);
        controller.drag_end(Some("pendiente")).await.unwrap();
        assert_eq!(backend.order("o1").await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_gestures_use_the_configured_constraint() {
        let order = Order::new("o1", 1, "Ana", OrderStatus::Pending);
        let (controller, _) = controller_with(order).await;
        let controller = DragController {
            constraint: ActivationConstraint {
                distance_px: 20.0,
                ..ActivationConstraint::default()
            },
            ..controller
        };

        let mut gesture = controller.begin_gesture(PointerKind::Mouse, (0.0, 0.0));
        assert_eq!(gesture.moved((12.0, 0.0), Duration::from_millis(30)), Gesture::Undecided);
        assert_eq!(gesture.moved((25.0, 0.0), Duration::from_millis(60)), Gesture::Drag);
        assert_eq!(gesture.gesture(), Gesture::Drag);
    }
}
