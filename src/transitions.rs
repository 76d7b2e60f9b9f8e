//! Order status transition table.
//!
//! ```text
//! pendiente → confirmado → preparando → listo → en_camino → entregado
//!     └──────────┴────────────┴──────────┴──────────┴──→ cancelado
//! ```
//!
//! The forward flow lives in [`NEXT_STAGE`]. Cancellation is a side
//! transition available from every non-terminal stage and never appears in
//! the forward table.

use crate::domain::OrderStatus;

/// Forward flow, one entry per non-terminal stage.
pub const NEXT_STAGE: &[(OrderStatus, OrderStatus)] = &[
    (OrderStatus::Pending, OrderStatus::Confirmed),
    (OrderStatus::Confirmed, OrderStatus::Preparing),
    (OrderStatus::Preparing, OrderStatus::Ready),
    (OrderStatus::Ready, OrderStatus::EnRoute),
    (OrderStatus::EnRoute, OrderStatus::Delivered),
];

/// Stages from which an order may still be cancelled.
pub const CANCELLABLE: &[OrderStatus] = &[
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Preparing,
    OrderStatus::Ready,
    OrderStatus::EnRoute,
];

/// The single forward stage after `status`, or `None` when there is none.
pub fn next_status(status: &OrderStatus) -> Option<OrderStatus> {
    NEXT_STAGE
        .iter()
        .find(|(from, _)| from == status)
        .map(|(_, to)| to.clone())
}

pub fn can_cancel(status: &OrderStatus) -> bool {
    CANCELLABLE.contains(status)
}

/// A button the board offers for an order card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderAction {
    /// pending → confirmed.
    Accept,
    /// pending → cancelled, asked before sending.
    Reject,
    /// One stage forward along [`NEXT_STAGE`].
    Advance(OrderStatus),
    /// Any non-terminal stage → cancelled, asked before sending.
    Cancel,
}

impl OrderAction {
    pub fn target_status(&self) -> OrderStatus {
        match self {
            Self::Accept => OrderStatus::Confirmed,
            Self::Reject | Self::Cancel => OrderStatus::Cancelled,
            Self::Advance(next) => next.clone(),
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        matches!(self, Self::Reject | Self::Cancel)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Accept => "ACEPTAR",
            Self::Reject => "RECHAZAR",
            Self::Cancel => "CANCELAR",
            Self::Advance(OrderStatus::Confirmed) => "ACEPTAR",
            Self::Advance(OrderStatus::Preparing) => "PREPARAR",
            Self::Advance(OrderStatus::Ready) => "LISTO",
            Self::Advance(OrderStatus::EnRoute) => "ENVIAR",
            Self::Advance(OrderStatus::Delivered) => "FINALIZAR",
            Self::Advance(_) => "AVANZAR",
        }
    }
}

/// Buttons to render for an order in `status`. Terminal and unknown
/// statuses get none.
pub fn available_actions(status: &OrderStatus) -> Vec<OrderAction> {
    if *status == OrderStatus::Pending {
        return vec![OrderAction::Accept, OrderAction::Reject];
    }

    let mut actions = Vec::new();
    if let Some(next) = next_status(status) {
        actions.push(OrderAction::Advance(next));
    }
    if can_cancel(status) {
        actions.push(OrderAction::Cancel);
    }
    actions
}

/// Whether a button may fire for an order currently in `status`.
///
/// Every action offered by [`available_actions`] is allowed. So is repeating
/// a forward step the order has already taken, which keeps a double click
/// from failing. Cancellation is never repeated.
pub fn permits(status: &OrderStatus, action: &OrderAction) -> bool {
    if available_actions(status).contains(action) {
        return true;
    }
    match action {
        OrderAction::Accept => *status == OrderStatus::Confirmed,
        OrderAction::Advance(next) => {
            next_status(status).as_ref() == Some(next)
                || (next == status && NEXT_STAGE.iter().any(|(_, to)| to == status))
        }
        OrderAction::Reject | OrderAction::Cancel => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_flow_reaches_delivered() {
        let mut status = OrderStatus::Pending;
        let mut visited = vec![status.clone()];
        while let Some(next) = next_status(&status) {
            visited.push(next.clone());
            status = next;
        }
        assert_eq!(
            visited,
            vec![
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Preparing,
                OrderStatus::Ready,
                OrderStatus::EnRoute,
                OrderStatus::Delivered,
            ]
        );
    }

    #[test]
    fn test_terminal_and_unknown_have_no_next() {
        assert_eq!(next_status(&OrderStatus::Delivered), None);
        assert_eq!(next_status(&OrderStatus::Cancelled), None);
        assert_eq!(next_status(&OrderStatus::Unknown("x".into())), None);
        assert!(available_actions(&OrderStatus::Unknown("x".into())).is_empty());
    }

    #[test]
    fn test_cancel_is_a_side_transition() {
        assert!(NEXT_STAGE.iter().all(|(_, to)| *to != OrderStatus::Cancelled));
        for (from, _) in NEXT_STAGE {
            assert!(can_cancel(from));
        }
        assert!(!can_cancel(&OrderStatus::Delivered));
        assert!(!can_cancel(&OrderStatus::Cancelled));
    }

    #[test]
    fn test_button_labels() {
        assert_eq!(
            available_actions(&OrderStatus::Pending)
                .iter()
                .map(OrderAction::label)
                .collect::<Vec<_>>(),
            vec!["ACEPTAR", "RECHAZAR"]
        );
        assert_eq!(
            available_actions(&OrderStatus::EnRoute),
            vec![OrderAction::Advance(OrderStatus::Delivered), OrderAction::Cancel]
        );
        assert_eq!(OrderAction::Advance(OrderStatus::Delivered).label(), "FINALIZAR");
        assert!(OrderAction::Reject.requires_confirmation());
        assert!(!OrderAction::Accept.requires_confirmation());
    }

    #[test]
    fn test_buttons_never_move_backwards_or_reopen() {
        assert!(permits(&OrderStatus::Pending, &OrderAction::Accept));
        assert!(permits(&OrderStatus::Confirmed, &OrderAction::Accept));
        assert!(!permits(&OrderStatus::Ready, &OrderAction::Accept));

        assert!(permits(&OrderStatus::Pending, &OrderAction::Reject));
        assert!(!permits(&OrderStatus::Preparing, &OrderAction::Reject));
        assert!(permits(&OrderStatus::EnRoute, &OrderAction::Cancel));
        assert!(!permits(&OrderStatus::Delivered, &OrderAction::Cancel));
        assert!(!permits(&OrderStatus::Cancelled, &OrderAction::Cancel));

        let finish = OrderAction::Advance(OrderStatus::Delivered);
        assert!(permits(&OrderStatus::EnRoute, &finish));
        assert!(permits(&OrderStatus::Delivered, &finish));
        assert!(!permits(&OrderStatus::Preparing, &finish));
        assert!(!permits(
            &OrderStatus::Ready,
            &OrderAction::Advance(OrderStatus::Pending)
        ));
        assert!(!permits(
            &OrderStatus::Cancelled,
            &OrderAction::Advance(OrderStatus::Cancelled)
        ));
    }
}
