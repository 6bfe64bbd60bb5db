//! # notihub-broker
//!
//! Durable enqueue/consume gateway over RabbitMQ: persistent envelopes,
//! per-consumer prefetch, bounded retry via republish, and dead-lettering
//! for exhausted or undecodable envelopes.

pub mod envelope;
pub mod gateway;

pub use envelope::QueueEnvelope;
pub use gateway::{BrokerGateway, QueueStats};
