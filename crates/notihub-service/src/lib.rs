//! # notihub-service
//!
//! Business services: the dispatch coordinator that feeds the pipeline, the
//! fan-out processor that workers run per envelope, and group management.

pub mod dispatch;
pub mod group;
pub mod processor;

pub use dispatch::{BatchOutcome, BatchRecipient, DispatchService};
pub use group::GroupService;
pub use processor::NotificationProcessor;
