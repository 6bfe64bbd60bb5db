//! # notihub-api
//!
//! HTTP API layer for NotiHub built on Axum.
//!
//! Provides the REST endpoints under `/api/v1`, the WebSocket upgrade,
//! health probes, extractors, DTOs, and the server bootstrap.

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::run_server;
pub use state::AppState;
