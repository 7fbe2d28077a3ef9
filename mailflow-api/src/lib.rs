//! # Mailflow API
//!
//! The service binary's library: env config, the send orchestrator
//! ([`SendService`]), the notification reconciler ([`EventService`]), the
//! axum routing layer, and server wiring. The routing layer is deliberately
//! thin; all invariants live in the services and the storage crate.

pub mod config;
pub mod event_service;
pub mod routes;
pub mod runner;
pub mod send_service;

pub use config::AppConfig;
pub use event_service::{EventError, EventService, ReconcileOutcome};
pub use routes::{app, AppState};
pub use runner::run_server;
pub use send_service::{SendError, SendReceipt, SendService};
