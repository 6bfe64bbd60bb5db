//! Notification repository implementation.
//!
//! The notifications table is the system-of-record for dispatch state.
//! Scheduler release and cancellation contend on the same conditional
//! update keyed on `(id, is_scheduled, status = 'scheduled')`, which makes
//! double-release and cancel/release races resolve deterministically.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use notihub_core::error::{AppError, ErrorKind};
use notihub_core::result::AppResult;
use notihub_core::types::pagination::ListWindow;
use notihub_entity::notification::{Notification, NotificationStatus};

/// Repository for notification records.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new notification and return the stored row.
    pub async fn create(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications \
             (id, title, message, type, status, data, user_cpf, user_phone, user_email, \
              group_id, broadcast, is_html, is_scheduled, scheduled_for, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW(), NOW()) \
             RETURNING *",
        )
        .bind(n.id)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.kind)
        .bind(n.status)
        .bind(&n.data)
        .bind(&n.user_cpf)
        .bind(&n.user_phone)
        .bind(&n.user_email)
        .bind(n.group_id)
        .bind(n.broadcast)
        .bind(n.is_html)
        .bind(n.is_scheduled)
        .bind(n.scheduled_for)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    /// Fetch a notification by id.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to fetch notification", e)
            })
    }

    /// List notifications, newest first.
    pub async fn find_all(&self, window: ListWindow) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))
    }

    /// List notifications for a CPF, union-ed with broadcast rows.
    pub async fn find_by_cpf(&self, cpf: &str, window: ListWindow) -> AppResult<Vec<Notification>> {
        self.find_by_identifier("user_cpf", cpf, window).await
    }

    /// List notifications for a phone, union-ed with broadcast rows.
    pub async fn find_by_phone(
        &self,
        phone: &str,
        window: ListWindow,
    ) -> AppResult<Vec<Notification>> {
        self.find_by_identifier("user_phone", phone, window).await
    }

    /// List notifications for an e-mail, union-ed with broadcast rows.
    pub async fn find_by_email(
        &self,
        email: &str,
        window: ListWindow,
    ) -> AppResult<Vec<Notification>> {
        self.find_by_identifier("user_email", email, window).await
    }

    async fn find_by_identifier(
        &self,
        column: &'static str,
        value: &str,
        window: ListWindow,
    ) -> AppResult<Vec<Notification>> {
        let query = format!(
            "SELECT * FROM notifications WHERE {column} = $1 OR broadcast = TRUE \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Notification>(&query)
            .bind(value)
            .bind(window.limit)
            .bind(window.offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list notifications", e)
            })
    }

    /// List notifications materialized from a group send.
    pub async fn find_by_group(
        &self,
        group_id: Uuid,
        window: ListWindow,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE group_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(group_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list group notifications", e)
        })
    }

    /// Update the mutable fields of an existing notification.
    pub async fn update(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET \
             title = $2, message = $3, type = $4, status = $5, data = $6, \
             user_cpf = $7, user_phone = $8, user_email = $9, group_id = $10, \
             broadcast = $11, is_html = $12, is_scheduled = $13, scheduled_for = $14, \
             updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(n.id)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.kind)
        .bind(n.status)
        .bind(&n.data)
        .bind(&n.user_cpf)
        .bind(&n.user_phone)
        .bind(&n.user_email)
        .bind(n.group_id)
        .bind(n.broadcast)
        .bind(n.is_html)
        .bind(n.is_scheduled)
        .bind(n.scheduled_for)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update notification", e))
    }

    /// Delete a notification. Returns whether a row was removed.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete notification", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the status of a notification.
    ///
    /// `read` and `cancelled` are never overwritten: duplicate envelopes
    /// are possible under at-least-once delivery, and a reprocessed
    /// duplicate must not pull a record out of those states. `failed` is
    /// re-enterable because the broker retries failed processing.
    pub async fn update_status(&self, id: Uuid, status: NotificationStatus) -> AppResult<()> {
        sqlx::query(
            "UPDATE notifications SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('read', 'cancelled')",
        )
        .bind(id)
        .bind(status)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update status", e))?;
        Ok(())
    }

    /// Mark a notification as read and stamp the read time.
    ///
    /// Conditional on the record not being in a sink state, so a failed or
    /// cancelled notification is never resurrected. Returns whether a row
    /// was updated; re-reading an already-read record is a no-op.
    pub async fn mark_read(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'read', read_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status NOT IN ('read', 'failed', 'cancelled')",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Fetch scheduled notifications that are due for release, oldest first.
    pub async fn find_scheduled_ready(
        &self,
        before: DateTime<Utc>,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE is_scheduled = TRUE AND status = 'scheduled' AND scheduled_for <= $1 \
             ORDER BY scheduled_for ASC",
        )
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to fetch due notifications", e)
        })
    }

    /// List scheduled notifications awaiting release.
    pub async fn find_scheduled(&self, window: ListWindow) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE is_scheduled = TRUE AND status = 'scheduled' \
             ORDER BY scheduled_for ASC LIMIT $1 OFFSET $2",
        )
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list scheduled", e)
        })
    }

    /// Atomically flip a due scheduled notification into the live pipeline.
    ///
    /// Succeeds only while the record is still `(is_scheduled, scheduled)`;
    /// a concurrent cancel or a second scheduler tick loses the race and
    /// gets `false`.
    pub async fn release_scheduled(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_scheduled = FALSE, status = 'pending', updated_at = NOW() \
             WHERE id = $1 AND is_scheduled = TRUE AND status = 'scheduled'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to release notification", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically cancel a scheduled notification.
    ///
    /// The same conditional update as [`release_scheduled`]; when the record
    /// has already been released the update affects zero rows and the cancel
    /// is a no-op.
    ///
    /// [`release_scheduled`]: Self::release_scheduled
    pub async fn cancel_scheduled(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_scheduled = FALSE, status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND is_scheduled = TRUE AND status = 'scheduled'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to cancel notification", e)
        })?;
        Ok(result.rows_affected() > 0)
    }
}
