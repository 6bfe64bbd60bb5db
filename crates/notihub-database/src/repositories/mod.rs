//! Concrete repository implementations.

pub mod group;
pub mod notification;
pub mod subscription;

pub use group::GroupRepository;
pub use notification::NotificationRepository;
pub use subscription::SubscriptionRepository;
