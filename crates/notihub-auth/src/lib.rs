//! # notihub-auth
//!
//! Claim intake for tokens issued by the upstream identity gateway.
//!
//! Signature verification is the gateway's responsibility; this crate only
//! decodes the claims segment and projects it into [`claims::UserInfo`].

pub mod claims;

pub use claims::{UserInfo, parse_token};
