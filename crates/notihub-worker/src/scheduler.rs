//! Release scheduler for future-dated notifications.
//!
//! A one-minute ticker (firing immediately at startup) queries for
//! scheduled records whose release time has passed and spawns a release
//! task per record. Release and cancellation contend on the same
//! conditional update, so a record is published at most once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use notihub_database::repositories::NotificationRepository;
use notihub_entity::notification::{Notification, NotificationStatus};
use notihub_service::DispatchService;

/// Interval between release sweeps.
const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Promotes due scheduled notifications into the live pipeline.
#[derive(Debug)]
pub struct ReleaseScheduler {
    notifications: Arc<NotificationRepository>,
    dispatch: Arc<DispatchService>,
    timezone: chrono_tz::Tz,
}

impl ReleaseScheduler {
    /// Create a new release scheduler.
    pub fn new(
        notifications: Arc<NotificationRepository>,
        dispatch: Arc<DispatchService>,
        timezone: chrono_tz::Tz,
    ) -> Self {
        Self {
            notifications,
            dispatch,
            timezone,
        }
    }

    /// Run the ticker until the cancel signal flips to `true`.
    ///
    /// The first sweep happens immediately; in-flight release tasks are
    /// detached and may complete after the ticker stops.
    pub async fn run(self: Arc<Self>, mut cancel: watch::Receiver<bool>) {
        info!("Notification scheduler started");

        let mut ticker = tokio::time::interval(TICK_INTERVAL);

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep_due().await;
                }
            }
        }

        info!("Notification scheduler stopped");
    }

    /// Find all due records and spawn a release task for each.
    async fn sweep_due(&self) {
        let due = match self.notifications.find_scheduled_ready(Utc::now()).await {
            Ok(due) => due,
            Err(e) => {
                // The records stay `scheduled` and will be retried on the
                // next tick.
                error!(error = %e, "Failed to fetch due notifications");
                return;
            }
        };

        if due.is_empty() {
            return;
        }

        info!(count = due.len(), "Releasing due scheduled notifications");

        for notification in due {
            let notifications = Arc::clone(&self.notifications);
            let dispatch = Arc::clone(&self.dispatch);
            let timezone = self.timezone;
            tokio::spawn(async move {
                release(notifications, dispatch, timezone, notification).await;
            });
        }
    }
}

/// Release one scheduled notification: flip it to pending under the
/// scheduled-state guard, then publish it. Losing the guard means the
/// record was cancelled or already released; that is not an error.
async fn release(
    notifications: Arc<NotificationRepository>,
    dispatch: Arc<DispatchService>,
    timezone: chrono_tz::Tz,
    mut notification: Notification,
) {
    let released = match notifications.release_scheduled(notification.id).await {
        Ok(released) => released,
        Err(e) => {
            error!(notification_id = %notification.id, error = %e, "Failed to release notification");
            return;
        }
    };

    if !released {
        debug!(notification_id = %notification.id, "Already released or cancelled, skipping");
        return;
    }

    info!(
        notification_id = %notification.id,
        scheduled_for = ?notification.scheduled_for.map(|t| t.with_timezone(&timezone)),
        "Publishing released notification"
    );

    notification.is_scheduled = false;
    notification.status = NotificationStatus::Pending;

    // `publish` flips the record to failed when the broker rejects it.
    if let Err(e) = dispatch.publish(&notification).await {
        error!(notification_id = %notification.id, error = %e, "Failed to publish released notification");
    }
}
