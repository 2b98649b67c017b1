//! acai-server: multi-tenant açaí storefront backend
//!
//! - Public storefront API: shop info, catalog, cart quotes, checkout, order tracking
//! - Admin API (JWT): catalog CRUD, store config, orders, dashboard, notifications
//! - Payment gateway integration (Pix) with webhook receipt and background reconciliation
//! - Pluggable persistence: PostgreSQL or a local in-process store

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod payment;
pub mod persistence;
pub mod pricing;
pub mod reconcile;
pub mod seed;
pub mod state;
pub mod util;

pub use config::Config;
pub use state::AppState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
