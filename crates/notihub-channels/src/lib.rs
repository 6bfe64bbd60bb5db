//! # notihub-channels
//!
//! Channel adapters: each sends one notification to one recipient over one
//! external channel. The in-app channel has no adapter here; it is a direct
//! call into the socket hub.

pub mod email;
pub mod webpush;

pub use email::{EmailRelayClient, EmailRequest};
pub use webpush::WebPushSender;
