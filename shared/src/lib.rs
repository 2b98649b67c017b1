//! Shared types for the açaí storefront platform
//!
//! Error codes, the API response envelope and domain models used by the
//! server and mirrored by the web front end.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};
