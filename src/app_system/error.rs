use thiserror::Error;

/// Errors reported by the hosted order backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Update rejected: {0}")]
    Rejected(String),
    #[error("Subscription failed: {0}")]
    Subscribe(String),
}

/// Errors talking to the board actor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BoardError {
    #[error("Board actor closed")]
    Closed,
    #[error("Board actor dropped the response")]
    Dropped,
}

/// Errors surfaced to the UI by the mutation coordinator.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoordinatorError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("Board unavailable: {0}")]
    Board(#[from] BoardError),
    #[error("Order not found on the board: {0}")]
    NotFound(String),
    #[error("No forward transition for order {order_id} in status {status}")]
    NoTransition { order_id: String, status: String },
    #[error("Action not confirmed for order {0}")]
    NotConfirmed(String),
}

/// Errors from the realtime feed adapter.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FeedError {
    #[error("Could not subscribe tenant {tenant_id}: {source}")]
    Subscribe {
        tenant_id: String,
        #[source]
        source: BackendError,
    },
    #[error("Unknown subscription: {0}")]
    UnknownSubscription(String),
}

/// Errors from the notification side-channel. Never shown to the user.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum NotifyError {
    #[error("Sound playback failed: {0}")]
    Sound(String),
    #[error("Notification store error: {0}")]
    Store(String),
}

/// Errors from starting or stopping the board system.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SystemError {
    #[error("Task failed: {0}")]
    TaskFailed(String),
    #[error("Board unavailable: {0}")]
    Board(#[from] BoardError),
}
