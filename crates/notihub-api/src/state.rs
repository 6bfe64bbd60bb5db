//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use notihub_broker::BrokerGateway;
use notihub_channels::{EmailRelayClient, WebPushSender};
use notihub_core::config::AppConfig;
use notihub_core::error::AppError;
use notihub_database::repositories::{
    GroupRepository, NotificationRepository, SubscriptionRepository,
};
use notihub_realtime::SocketHub;
use notihub_service::{DispatchService, GroupService, NotificationProcessor};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// `Arc`-wrapped (or internally cheap to clone) for cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Broker gateway.
    pub broker: Arc<BrokerGateway>,
    /// Socket hub handle.
    pub hub: SocketHub,

    /// Notification repository.
    pub notification_repo: Arc<NotificationRepository>,
    /// Subscription repository.
    pub subscription_repo: Arc<SubscriptionRepository>,
    /// Group repository.
    pub group_repo: Arc<GroupRepository>,

    /// Dispatch coordinator.
    pub dispatch_service: Arc<DispatchService>,
    /// Group management service.
    pub group_service: Arc<GroupService>,
    /// Fan-out processor run by the worker pool.
    pub processor: Arc<NotificationProcessor>,
}

impl AppState {
    /// Wire repositories, adapters, and services from the infrastructure
    /// handles.
    pub fn build(
        config: Arc<AppConfig>,
        db_pool: PgPool,
        broker: Arc<BrokerGateway>,
        hub: SocketHub,
    ) -> Result<Self, AppError> {
        let notification_repo = Arc::new(NotificationRepository::new(db_pool.clone()));
        let subscription_repo = Arc::new(SubscriptionRepository::new(db_pool.clone()));
        let group_repo = Arc::new(GroupRepository::new(db_pool.clone()));

        let webpush = Arc::new(WebPushSender::new(
            config.webpush.clone(),
            Arc::clone(&subscription_repo),
        )?);
        let email = Arc::new(EmailRelayClient::new(config.email.clone())?);

        let dispatch_service = Arc::new(DispatchService::new(
            Arc::clone(&notification_repo),
            Arc::clone(&group_repo),
            Arc::clone(&broker),
        ));
        let group_service = Arc::new(GroupService::new(Arc::clone(&group_repo)));
        let processor = Arc::new(NotificationProcessor::new(
            Arc::clone(&notification_repo),
            hub.clone(),
            webpush,
            email,
        ));

        Ok(Self {
            config,
            db_pool,
            broker,
            hub,
            notification_repo,
            subscription_repo,
            group_repo,
            dispatch_service,
            group_service,
            processor,
        })
    }
}
