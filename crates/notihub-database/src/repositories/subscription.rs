//! Push subscription repository implementation.

use sqlx::PgPool;
use uuid::Uuid;

use notihub_core::error::{AppError, ErrorKind};
use notihub_core::result::AppResult;
use notihub_entity::subscription::Subscription;

/// Repository for Web Push subscriptions.
#[derive(Debug, Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    /// Create a new subscription repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a subscription. The endpoint is unique; re-registering an
    /// existing endpoint refreshes the owner and keys.
    pub async fn upsert(&self, s: &Subscription) -> AppResult<Subscription> {
        sqlx::query_as::<_, Subscription>(
            "INSERT INTO subscriptions (id, user_cpf, user_phone, endpoint, p256dh, auth, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) \
             ON CONFLICT (endpoint) DO UPDATE SET \
             user_cpf = $2, user_phone = $3, p256dh = $5, auth = $6, updated_at = NOW() \
             RETURNING *",
        )
        .bind(s.id)
        .bind(&s.user_cpf)
        .bind(&s.user_phone)
        .bind(&s.endpoint)
        .bind(&s.p256dh)
        .bind(&s.auth)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to register subscription", e))
    }

    /// Find all subscriptions registered for a CPF.
    pub async fn find_by_cpf(&self, cpf: &str) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_cpf = $1")
            .bind(cpf)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find subscriptions", e)
            })
    }

    /// Find all subscriptions registered for a phone.
    pub async fn find_by_phone(&self, phone: &str) -> AppResult<Vec<Subscription>> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_phone = $1")
            .bind(phone)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find subscriptions", e)
            })
    }

    /// Delete a subscription by id.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete subscription", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a subscription by endpoint (unregister, or permanent 4xx from
    /// the push service).
    pub async fn delete_by_endpoint(&self, endpoint: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete subscription", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
