//! Order lifecycle and kanban board synchronization for a restaurant
//! dashboard: one board actor owning the order list, optimistic status
//! changes against a hosted backend, a realtime feed with a polling
//! fallback, and new-order notifications.

pub mod app_system;
pub mod backend;
pub mod board;
pub mod clients;
pub mod config;
pub mod coordinator;
pub mod dnd;
pub mod domain;
pub mod feed;
pub mod kanban;
pub mod messages;
pub mod notify;
pub mod poller;
pub mod share;
pub mod transitions;

#[cfg(test)]
mod mock_framework;
