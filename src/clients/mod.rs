#[macro_use]
mod macros;
mod board_client;

pub use board_client::BoardClient;
