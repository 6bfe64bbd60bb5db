//! # notihub-worker
//!
//! The consuming side of the pipeline: N symmetric queue workers applying
//! the fan-out processor, plus the scheduler that promotes due scheduled
//! notifications into the live pipeline.

pub mod pool;
pub mod scheduler;

pub use pool::WorkerPool;
pub use scheduler::ReleaseScheduler;
