//! # notihub-core
//!
//! Core crate for NotiHub. Contains configuration schemas, shared
//! pagination/response types, and the unified error system.
//!
//! This crate has **no** internal dependencies on other NotiHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
