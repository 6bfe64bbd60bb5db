//! RabbitMQ broker gateway.
//!
//! Topology: one durable primary queue with a message TTL, a length bound,
//! and a dead-letter exchange bound 1:1 to a dead-letter queue. Consumers
//! use manual acknowledgement under a prefetch limit. Delivery to handlers
//! is at-least-once; handlers must be idempotent with respect to the
//! notification store's status transitions.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions, BasicQosOptions,
    ExchangeDeclareOptions, QueueBindOptions, QueueDeclareOptions, QueuePurgeOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use notihub_core::config::BrokerConfig;
use notihub_core::error::{AppError, ErrorKind};
use notihub_core::result::AppResult;
use notihub_entity::notification::Notification;

use crate::envelope::QueueEnvelope;

/// Persistent delivery mode as defined by AMQP 0.9.1.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

/// Point-in-time queue statistics.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStats {
    /// Primary queue name.
    pub queue_name: String,
    /// Messages waiting in the primary queue.
    pub messages: u32,
    /// Consumers attached to the primary queue.
    pub consumers: u32,
    /// Messages parked in the dead-letter queue.
    pub dlq_messages: u32,
}

/// Gateway to the notification queue.
pub struct BrokerGateway {
    conn: Connection,
    channel: Channel,
    config: BrokerConfig,
}

impl std::fmt::Debug for BrokerGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerGateway")
            .field("queue", &self.config.queue)
            .finish()
    }
}

impl BrokerGateway {
    /// Connect to the broker and declare the queue topology.
    pub async fn connect(config: &BrokerConfig) -> AppResult<Self> {
        let conn = Connection::connect(&config.url, ConnectionProperties::default())
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Broker,
                    format!("Failed to connect to broker: {e}"),
                    e,
                )
            })?;

        let channel = conn.create_channel().await.map_err(|e| {
            AppError::with_source(ErrorKind::Broker, format!("Failed to open channel: {e}"), e)
        })?;

        let gateway = Self {
            conn,
            channel,
            config: config.clone(),
        };
        gateway.declare_topology().await?;

        info!(queue = %config.queue, "Broker connected");
        Ok(gateway)
    }

    /// Declare the primary queue, dead-letter exchange, and dead-letter
    /// queue, and apply the prefetch limit to the shared channel.
    async fn declare_topology(&self) -> AppResult<()> {
        let dlx = self.config.dead_letter_exchange();
        let dlq = self.config.dead_letter_queue();

        let mut args = FieldTable::default();
        args.insert(
            "x-message-ttl".into(),
            AMQPValue::LongInt(self.config.message_ttl_ms as i32),
        );
        args.insert(
            "x-max-length".into(),
            AMQPValue::LongInt(self.config.max_length as i32),
        );
        args.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString(dlx.clone().into()),
        );
        args.insert(
            "x-dead-letter-routing-key".into(),
            AMQPValue::LongString(dlq.clone().into()),
        );

        self.channel
            .queue_declare(
                &self.config.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                args,
            )
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Broker, format!("Failed to declare queue: {e}"), e)
            })?;

        self.channel
            .exchange_declare(
                &dlx,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Broker,
                    format!("Failed to declare dead-letter exchange: {e}"),
                    e,
                )
            })?;

        self.channel
            .queue_declare(
                &dlq,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Broker,
                    format!("Failed to declare dead-letter queue: {e}"),
                    e,
                )
            })?;

        self.channel
            .queue_bind(
                &dlq,
                &dlx,
                &dlq,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Broker,
                    format!("Failed to bind dead-letter queue: {e}"),
                    e,
                )
            })?;

        self.channel
            .basic_qos(self.config.prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Broker, format!("Failed to set prefetch: {e}"), e)
            })?;

        Ok(())
    }

    /// Publish a notification as a fresh envelope (retry count 0).
    pub async fn publish(&self, notification: &Notification) -> AppResult<()> {
        let envelope = QueueEnvelope::new(notification.clone());
        self.publish_envelope(&self.channel, &envelope).await?;
        debug!(notification_id = %notification.id, "Notification published to queue");
        Ok(())
    }

    async fn publish_envelope(&self, channel: &Channel, envelope: &QueueEnvelope) -> AppResult<()> {
        let body = serde_json::to_vec(envelope)?;
        let properties = BasicProperties::default()
            .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
            .with_content_type("application/json".into())
            .with_message_id(envelope.notification.id.to_string().into());

        let publish = async {
            channel
                .basic_publish(
                    "",
                    &self.config.queue,
                    BasicPublishOptions::default(),
                    &body,
                    properties,
                )
                .await?
                .await
        };

        let timeout = Duration::from_secs(self.config.publish_timeout_seconds);
        match tokio::time::timeout(timeout, publish).await {
            Ok(Ok(_confirmation)) => Ok(()),
            Ok(Err(e)) => Err(AppError::with_source(
                ErrorKind::Broker,
                format!("Failed to publish message: {e}"),
                e,
            )),
            Err(_) => Err(AppError::broker(format!(
                "Publish timed out after {}s",
                self.config.publish_timeout_seconds
            ))),
        }
    }

    /// Consume envelopes on a dedicated channel until the stream ends.
    ///
    /// Acknowledgement protocol per delivery:
    /// - handler success: ack;
    /// - handler failure below the retry ceiling: republish the envelope
    ///   with an incremented retry count, then ack the original;
    /// - handler failure at the ceiling, or an undecodable body: nack
    ///   without requeue, which routes the delivery to the dead-letter
    ///   queue.
    pub async fn consume<F, Fut>(&self, consumer_tag: &str, handler: F) -> AppResult<()>
    where
        F: Fn(QueueEnvelope) -> Fut + Send + Sync,
        Fut: Future<Output = AppResult<()>> + Send,
    {
        let channel = self.conn.create_channel().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Broker,
                format!("Failed to open consumer channel: {e}"),
                e,
            )
        })?;

        channel
            .basic_qos(self.config.prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Broker, format!("Failed to set prefetch: {e}"), e)
            })?;

        let mut consumer = channel
            .basic_consume(
                &self.config.queue,
                consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Broker,
                    format!("Failed to register consumer: {e}"),
                    e,
                )
            })?;

        info!(consumer = %consumer_tag, "Consumer started, waiting for messages");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery.map_err(|e| {
                AppError::with_source(ErrorKind::Broker, format!("Consume error: {e}"), e)
            })?;

            let envelope: QueueEnvelope = match serde_json::from_slice(&delivery.data) {
                Ok(env) => env,
                Err(e) => {
                    warn!(consumer = %consumer_tag, error = %e, "Undecodable envelope, dead-lettering");
                    self.nack_to_dlq(&delivery).await;
                    continue;
                }
            };

            let notification_id = envelope.notification.id;
            let retry_count = envelope.retry_count;
            debug!(
                consumer = %consumer_tag,
                notification_id = %notification_id,
                retry = retry_count,
                "Processing envelope"
            );

            match handler(envelope.clone()).await {
                Ok(()) => {
                    if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                        error!(notification_id = %notification_id, error = %e, "Failed to ack");
                    }
                }
                Err(e) if retry_count < self.config.max_retries => {
                    warn!(
                        notification_id = %notification_id,
                        retry = retry_count + 1,
                        max = self.config.max_retries,
                        error = %e,
                        "Handler failed, requeueing"
                    );
                    let retried = envelope.next_retry();
                    match self.publish_envelope(&channel, &retried).await {
                        Ok(()) => {
                            if let Err(e) = delivery.ack(BasicAckOptions::default()).await {
                                error!(notification_id = %notification_id, error = %e, "Failed to ack");
                            }
                        }
                        Err(publish_err) => {
                            // Could not republish; let the broker redeliver
                            // the original instead of losing it.
                            error!(
                                notification_id = %notification_id,
                                error = %publish_err,
                                "Failed to republish retry, returning delivery to queue"
                            );
                            if let Err(e) = delivery
                                .nack(BasicNackOptions {
                                    requeue: true,
                                    ..Default::default()
                                })
                                .await
                            {
                                error!(notification_id = %notification_id, error = %e, "Failed to nack");
                            }
                        }
                    }
                }
                Err(e) => {
                    error!(
                        notification_id = %notification_id,
                        retries = retry_count,
                        error = %e,
                        "Retries exhausted, dead-lettering"
                    );
                    self.nack_to_dlq(&delivery).await;
                }
            }
        }

        Err(AppError::broker(format!(
            "Consumer '{consumer_tag}' stream ended"
        )))
    }

    async fn nack_to_dlq(&self, delivery: &lapin::message::Delivery) {
        if let Err(e) = delivery
            .nack(BasicNackOptions {
                requeue: false,
                ..Default::default()
            })
            .await
        {
            error!(error = %e, "Failed to nack delivery");
        }
    }

    /// Return current queue depth, consumer count, and dead-letter depth.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        let passive = QueueDeclareOptions {
            passive: true,
            durable: true,
            ..Default::default()
        };

        let queue = self
            .channel
            .queue_declare(&self.config.queue, passive, FieldTable::default())
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Broker,
                    format!("Failed to get queue stats: {e}"),
                    e,
                )
            })?;

        let dlq_messages = match self
            .channel
            .queue_declare(
                &self.config.dead_letter_queue(),
                passive,
                FieldTable::default(),
            )
            .await
        {
            Ok(dlq) => dlq.message_count(),
            Err(_) => 0,
        };

        Ok(QueueStats {
            queue_name: self.config.queue.clone(),
            messages: queue.message_count(),
            consumers: queue.consumer_count(),
            dlq_messages,
        })
    }

    /// Remove all messages from the primary queue.
    pub async fn purge(&self) -> AppResult<u32> {
        let purged = self
            .channel
            .queue_purge(&self.config.queue, QueuePurgeOptions::default())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Broker, format!("Failed to purge queue: {e}"), e)
            })?;

        info!(queue = %self.config.queue, purged, "Queue purged");
        Ok(purged)
    }

    /// Close the channel and connection.
    pub async fn close(&self) {
        if let Err(e) = self.channel.close(200, "shutdown").await {
            warn!(error = %e, "Failed to close broker channel");
        }
        if let Err(e) = self.conn.close(200, "shutdown").await {
            warn!(error = %e, "Failed to close broker connection");
        }
    }
}
