//! System orchestration, startup, and shutdown logic.

pub mod board_system;
pub mod error;
pub mod telemetry;

pub use board_system::*;
pub use error::*;
pub use telemetry::*;
