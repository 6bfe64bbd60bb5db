//! # notihub-entity
//!
//! Domain entity models for NotiHub. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod group;
pub mod notification;
pub mod subscription;

pub use group::{Group, Member};
pub use notification::{Notification, NotificationKind, NotificationStatus};
pub use subscription::Subscription;
