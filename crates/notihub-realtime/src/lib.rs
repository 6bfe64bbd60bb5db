//! # notihub-realtime
//!
//! The live socket hub: a single event-loop actor that owns the table of
//! connected sockets keyed by user identifier and routes notifications to
//! one or many of them.

pub mod client;
pub mod hub;

pub use client::{SocketClient, SocketId};
pub use hub::SocketHub;
