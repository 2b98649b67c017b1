//! Persistence layer
//!
//! All shop data goes through the [`ShopStore`] trait. Two backends exist:
//! - [`PgStore`]: hosted PostgreSQL (production)
//! - [`LocalStore`]: in-process maps with an optional JSON snapshot (offline/demo)
//!
//! The backend is picked once at startup from [`PersistenceMode`]. Every
//! catalog query is scoped by `store_id`; orders are additionally reachable
//! by payment reference for webhook/reconciliation lookups.

pub mod local;
pub mod pg;

pub use local::LocalStore;
pub use pg::PgStore;

use async_trait::async_trait;
use shared::models::{
    Additional, AdditionalCategory, AdditionalCategoryCreate, AdditionalCategoryUpdate,
    AdditionalCreate, AdditionalUpdate, Category, CategoryCreate, CategoryUpdate, Notification,
    Order, OrderFilter, OrderStatus, PaymentStatus, PaymentUpdate, Product, ProductCreate,
    ProductUpdate, PushSubscription, Store, StoreConfig, StoreCreate,
};
use uuid::Uuid;

use crate::BoxError;

/// Runtime flag selecting the persistence backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceMode {
    Postgres,
    Local,
}

impl std::str::FromStr for PersistenceMode {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "local" | "memory" => Ok(Self::Local),
            other => Err(format!("unknown PERSISTENCE_MODE: {other}").into()),
        }
    }
}

impl std::fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Result of a delete that may be refused because of dependents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Row still referenced (category with products, group with additionals)
    InUse,
}

/// `create_store` lost a uniqueness race. Backends return it boxed so the
/// API layer can `downcast_ref` it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreConflict {
    #[error("store slug already exists")]
    Slug,
    #[error("store email already exists")]
    Email,
}

/// Data access for every shop entity
#[async_trait]
pub trait ShopStore: Send + Sync {
    // ── Stores ──
    async fn create_store(&self, data: &StoreCreate, now: i64) -> Result<Store, BoxError>;
    async fn find_store_by_id(&self, id: i64) -> Result<Option<Store>, BoxError>;
    async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, BoxError>;
    async fn find_store_by_email(&self, email: &str) -> Result<Option<Store>, BoxError>;

    // ── Store config ──
    async fn get_config(&self, store_id: i64) -> Result<Option<StoreConfig>, BoxError>;
    async fn save_config(&self, config: &StoreConfig) -> Result<(), BoxError>;

    // ── Categories ──
    async fn list_categories(&self, store_id: i64) -> Result<Vec<Category>, BoxError>;
    async fn get_category(&self, store_id: i64, id: i64) -> Result<Option<Category>, BoxError>;
    async fn create_category(
        &self,
        store_id: i64,
        data: &CategoryCreate,
        now: i64,
    ) -> Result<Category, BoxError>;
    async fn update_category(
        &self,
        store_id: i64,
        id: i64,
        data: &CategoryUpdate,
        now: i64,
    ) -> Result<Option<Category>, BoxError>;
    async fn delete_category(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError>;

    // ── Products ──
    async fn list_products(&self, store_id: i64) -> Result<Vec<Product>, BoxError>;
    async fn get_product(&self, store_id: i64, id: i64) -> Result<Option<Product>, BoxError>;
    async fn create_product(
        &self,
        store_id: i64,
        data: &ProductCreate,
        now: i64,
    ) -> Result<Product, BoxError>;
    async fn update_product(
        &self,
        store_id: i64,
        id: i64,
        data: &ProductUpdate,
        now: i64,
    ) -> Result<Option<Product>, BoxError>;
    async fn delete_product(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError>;

    // ── Additional categories ──
    async fn list_additional_categories(
        &self,
        store_id: i64,
    ) -> Result<Vec<AdditionalCategory>, BoxError>;
    async fn get_additional_category(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<Option<AdditionalCategory>, BoxError>;
    async fn create_additional_category(
        &self,
        store_id: i64,
        data: &AdditionalCategoryCreate,
        now: i64,
    ) -> Result<AdditionalCategory, BoxError>;
    async fn update_additional_category(
        &self,
        store_id: i64,
        id: i64,
        data: &AdditionalCategoryUpdate,
        now: i64,
    ) -> Result<Option<AdditionalCategory>, BoxError>;
    async fn delete_additional_category(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<DeleteOutcome, BoxError>;

    // ── Additionals ──
    async fn list_additionals(&self, store_id: i64) -> Result<Vec<Additional>, BoxError>;
    async fn get_additional(&self, store_id: i64, id: i64)
    -> Result<Option<Additional>, BoxError>;
    async fn create_additional(
        &self,
        store_id: i64,
        data: &AdditionalCreate,
        now: i64,
    ) -> Result<Additional, BoxError>;
    async fn update_additional(
        &self,
        store_id: i64,
        id: i64,
        data: &AdditionalUpdate,
        now: i64,
    ) -> Result<Option<Additional>, BoxError>;
    async fn delete_additional(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError>;

    // ── Orders ──
    async fn insert_order(&self, order: &Order) -> Result<(), BoxError>;
    async fn get_order(&self, store_id: i64, id: Uuid) -> Result<Option<Order>, BoxError>;
    /// Newest first
    async fn list_orders(&self, store_id: i64, filter: &OrderFilter)
    -> Result<Vec<Order>, BoxError>;
    /// Compare-and-set on the order status. `None` when the order is missing
    /// or no longer in `from`.
    async fn update_order_status(
        &self,
        store_id: i64,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
    ) -> Result<Option<Order>, BoxError>;
    /// Compare-and-set on the payment status. `None` when the order is
    /// missing or its payment status is no longer `expected`.
    async fn apply_payment_update(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        update: &PaymentUpdate,
        now: i64,
    ) -> Result<Option<Order>, BoxError>;
    /// Orders whose payment is pending at the gateway, oldest first.
    /// `None` spans every store.
    async fn list_pending_payments(
        &self,
        store_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Order>, BoxError>;
    async fn find_order_by_payment_id(&self, payment_id: &str)
    -> Result<Option<Order>, BoxError>;

    // ── Notifications ──
    async fn insert_notification(&self, notification: &Notification) -> Result<(), BoxError>;
    /// Newest first
    async fn list_notifications(
        &self,
        store_id: i64,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, BoxError>;
    async fn mark_notification_read(&self, store_id: i64, id: i64) -> Result<bool, BoxError>;
    async fn unread_notification_count(&self, store_id: i64) -> Result<i64, BoxError>;

    // ── Push subscriptions ──
    async fn upsert_push_subscription(&self, sub: &PushSubscription) -> Result<(), BoxError>;
    async fn list_push_subscriptions(
        &self,
        store_id: i64,
    ) -> Result<Vec<PushSubscription>, BoxError>;
    async fn delete_push_subscription(
        &self,
        store_id: i64,
        endpoint: &str,
    ) -> Result<bool, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_persistence_mode() {
        assert_eq!("postgres".parse::<PersistenceMode>().unwrap(), PersistenceMode::Postgres);
        assert_eq!("LOCAL".parse::<PersistenceMode>().unwrap(), PersistenceMode::Local);
        assert!("sqlite".parse::<PersistenceMode>().is_err());
        assert_eq!(PersistenceMode::Local.to_string(), "local");
    }
}
