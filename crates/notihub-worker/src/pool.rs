//! Queue worker pool.
//!
//! N cooperative consumers, each holding an independent consume session on
//! the broker gateway and invoking the fan-out processor per envelope.
//! Workers are symmetric and stateless; raising the count increases
//! concurrent external-channel calls. A broken consume session is reopened
//! with exponential backoff rather than crashing the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use notihub_broker::BrokerGateway;
use notihub_core::config::WorkerConfig;
use notihub_service::NotificationProcessor;

/// Initial reconnect delay after a consume session ends.
const BACKOFF_INITIAL: Duration = Duration::from_secs(1);
/// Upper bound on the reconnect delay.
const BACKOFF_MAX: Duration = Duration::from_secs(30);

/// Spawns and owns the queue consumer tasks.
#[derive(Debug)]
pub struct WorkerPool {
    broker: Arc<BrokerGateway>,
    processor: Arc<NotificationProcessor>,
    config: WorkerConfig,
}

impl WorkerPool {
    /// Create a new worker pool.
    pub fn new(
        broker: Arc<BrokerGateway>,
        processor: Arc<NotificationProcessor>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            broker,
            processor,
            config,
        }
    }

    /// Spawn the configured number of worker tasks.
    ///
    /// Each task runs until the cancel signal flips to `true`.
    pub fn spawn(&self, cancel: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        info!(count = self.config.count, "Starting notification workers");

        (1..=self.config.count)
            .map(|worker_id| {
                let broker = Arc::clone(&self.broker);
                let processor = Arc::clone(&self.processor);
                let cancel = cancel.clone();
                tokio::spawn(run_worker(worker_id, broker, processor, cancel))
            })
            .collect()
    }
}

/// One worker's consume loop.
async fn run_worker(
    worker_id: usize,
    broker: Arc<BrokerGateway>,
    processor: Arc<NotificationProcessor>,
    mut cancel: watch::Receiver<bool>,
) {
    let tag = format!("notihub-worker-{worker_id}");
    let mut backoff = BACKOFF_INITIAL;

    info!(worker = %tag, "Worker started");

    loop {
        let handler = {
            let processor = Arc::clone(&processor);
            move |envelope| {
                let processor = Arc::clone(&processor);
                async move { processor.process(envelope).await }
            }
        };

        tokio::select! {
            _ = cancel.changed() => {
                if *cancel.borrow() {
                    break;
                }
            }
            result = broker.consume(&tag, handler) => {
                if let Err(e) = result {
                    warn!(worker = %tag, error = %e, delay = ?backoff, "Consume session ended, reopening");
                }

                tokio::select! {
                    _ = cancel.changed() => {
                        if *cancel.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff = (backoff * 2).min(BACKOFF_MAX);
            }
        }
    }

    info!(worker = %tag, "Worker stopped");
}
