//! Local persistence backend
//!
//! In-process maps behind a `parking_lot::RwLock`. When a snapshot path is
//! configured the whole data set is written as JSON after every mutation
//! (tmp file + rename) and loaded back at startup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::models::{
    Additional, AdditionalCategory, AdditionalCategoryCreate, AdditionalCategoryUpdate,
    AdditionalCreate, AdditionalUpdate, Category, CategoryCreate, CategoryUpdate, Notification,
    Order, OrderFilter, OrderStatus, PaymentStatus, PaymentUpdate, Product, ProductCreate,
    ProductUpdate, PushSubscription, Store, StoreConfig, StoreCreate,
};
use shared::util::snowflake_id;
use uuid::Uuid;

use super::{DeleteOutcome, ShopStore, StoreConflict};
use crate::BoxError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LocalData {
    #[serde(default)]
    stores: BTreeMap<i64, Store>,
    /// `Store` never serializes its hash, so snapshots keep it here
    #[serde(default)]
    store_passwords: BTreeMap<i64, String>,
    #[serde(default)]
    configs: BTreeMap<i64, StoreConfig>,
    #[serde(default)]
    categories: BTreeMap<i64, Category>,
    #[serde(default)]
    products: BTreeMap<i64, Product>,
    #[serde(default)]
    additional_categories: BTreeMap<i64, AdditionalCategory>,
    #[serde(default)]
    additionals: BTreeMap<i64, Additional>,
    #[serde(default)]
    orders: BTreeMap<Uuid, Order>,
    #[serde(default)]
    notifications: BTreeMap<i64, Notification>,
    #[serde(default)]
    push_subscriptions: Vec<PushSubscription>,
}

/// Sort key shared by every catalog listing
fn by_sort_order<T>(items: &mut [T], key: impl Fn(&T) -> (i32, i64)) {
    items.sort_by_key(|item| key(item));
}

pub struct LocalStore {
    data: RwLock<LocalData>,
    snapshot_path: Option<PathBuf>,
    write_gate: tokio::sync::Mutex<()>,
}

impl LocalStore {
    /// Memory-only store
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(LocalData::default()),
            snapshot_path: None,
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Store backed by a JSON snapshot. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BoxError> {
        let path = path.as_ref().to_path_buf();
        let mut data: LocalData = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| format!("corrupt local snapshot {}: {e}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LocalData::default(),
            Err(e) => return Err(e.into()),
        };
        for (id, store) in data.stores.iter_mut() {
            if let Some(hash) = data.store_passwords.get(id) {
                store.hashed_password = hash.clone();
            }
        }
        tracing::info!(path = %path.display(), "Local persistence snapshot loaded");
        Ok(Self {
            data: RwLock::new(data),
            snapshot_path: Some(path),
            write_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Run a mutation and persist it.
    ///
    /// With a snapshot file the mutation is applied to a copy, the copy is
    /// written to disk off the runtime, and only then swapped in. A failed
    /// write leaves memory untouched. Writers are serialized by `write_gate`
    /// so snapshots land in commit order.
    async fn try_write<T>(
        &self,
        f: impl FnOnce(&mut LocalData) -> Result<T, BoxError>,
    ) -> Result<T, BoxError> {
        let Some(path) = self.snapshot_path.clone() else {
            return f(&mut self.data.write());
        };

        let _gate = self.write_gate.lock().await;
        let mut next = self.data.read().clone();
        let out = f(&mut next)?;
        let bytes = serde_json::to_vec(&next)?;
        tokio::task::spawn_blocking(move || write_snapshot(&path, &bytes)).await??;
        *self.data.write() = next;
        Ok(out)
    }

    async fn write<T>(&self, f: impl FnOnce(&mut LocalData) -> T) -> Result<T, BoxError> {
        self.try_write(|d| Ok(f(d))).await
    }
}

/// tmp file + rename so a crash never leaves a half-written snapshot
fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<(), BoxError> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait]
impl ShopStore for LocalStore {
    // ── Stores ──

    async fn create_store(&self, data: &StoreCreate, now: i64) -> Result<Store, BoxError> {
        self.try_write(|d| {
            if d.stores.values().any(|s| s.slug == data.slug) {
                return Err(StoreConflict::Slug.into());
            }
            if d.stores.values().any(|s| s.email == data.email) {
                return Err(StoreConflict::Email.into());
            }
            let store = Store::new(snowflake_id(), data, now);
            d.stores.insert(store.id, store.clone());
            d.store_passwords
                .insert(store.id, store.hashed_password.clone());
            Ok(store)
        })
        .await
    }

    async fn find_store_by_id(&self, id: i64) -> Result<Option<Store>, BoxError> {
        Ok(self.data.read().stores.get(&id).cloned())
    }

    async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, BoxError> {
        Ok(self.data.read().stores.values().find(|s| s.slug == slug).cloned())
    }

    async fn find_store_by_email(&self, email: &str) -> Result<Option<Store>, BoxError> {
        Ok(self.data.read().stores.values().find(|s| s.email == email).cloned())
    }

    // ── Store config ──

    async fn get_config(&self, store_id: i64) -> Result<Option<StoreConfig>, BoxError> {
        Ok(self.data.read().configs.get(&store_id).cloned())
    }

    async fn save_config(&self, config: &StoreConfig) -> Result<(), BoxError> {
        self.write(|d| {
            d.configs.insert(config.store_id, config.clone());
        }).await
    }

    // ── Categories ──

    async fn list_categories(&self, store_id: i64) -> Result<Vec<Category>, BoxError> {
        let mut items: Vec<Category> = self
            .data
            .read()
            .categories
            .values()
            .filter(|c| c.store_id == store_id)
            .cloned()
            .collect();
        by_sort_order(&mut items, |c| (c.sort_order, c.id));
        Ok(items)
    }

    async fn get_category(&self, store_id: i64, id: i64) -> Result<Option<Category>, BoxError> {
        Ok(self
            .data
            .read()
            .categories
            .get(&id)
            .filter(|c| c.store_id == store_id)
            .cloned())
    }

    async fn create_category(
        &self,
        store_id: i64,
        data: &CategoryCreate,
        now: i64,
    ) -> Result<Category, BoxError> {
        let category = Category::new(snowflake_id(), store_id, data, now);
        self.write(|d| {
            d.categories.insert(category.id, category.clone());
        }).await?;
        Ok(category)
    }

    async fn update_category(
        &self,
        store_id: i64,
        id: i64,
        data: &CategoryUpdate,
        now: i64,
    ) -> Result<Option<Category>, BoxError> {
        self.write(|d| {
            let category = d.categories.get_mut(&id).filter(|c| c.store_id == store_id)?;
            category.apply(data, now);
            Some(category.clone())
        }).await
    }

    async fn delete_category(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError> {
        self.write(|d| {
            if !d.categories.get(&id).is_some_and(|c| c.store_id == store_id) {
                return DeleteOutcome::NotFound;
            }
            if d.products.values().any(|p| p.category_id == id) {
                return DeleteOutcome::InUse;
            }
            d.categories.remove(&id);
            DeleteOutcome::Deleted
        }).await
    }

    // ── Products ──

    async fn list_products(&self, store_id: i64) -> Result<Vec<Product>, BoxError> {
        let mut items: Vec<Product> = self
            .data
            .read()
            .products
            .values()
            .filter(|p| p.store_id == store_id)
            .cloned()
            .collect();
        by_sort_order(&mut items, |p| (p.sort_order, p.id));
        Ok(items)
    }

    async fn get_product(&self, store_id: i64, id: i64) -> Result<Option<Product>, BoxError> {
        Ok(self
            .data
            .read()
            .products
            .get(&id)
            .filter(|p| p.store_id == store_id)
            .cloned())
    }

    async fn create_product(
        &self,
        store_id: i64,
        data: &ProductCreate,
        now: i64,
    ) -> Result<Product, BoxError> {
        let product = Product::new(snowflake_id(), store_id, data, now);
        self.write(|d| {
            d.products.insert(product.id, product.clone());
        }).await?;
        Ok(product)
    }

    async fn update_product(
        &self,
        store_id: i64,
        id: i64,
        data: &ProductUpdate,
        now: i64,
    ) -> Result<Option<Product>, BoxError> {
        self.write(|d| {
            let product = d.products.get_mut(&id).filter(|p| p.store_id == store_id)?;
            product.apply(data, now);
            Some(product.clone())
        }).await
    }

    async fn delete_product(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError> {
        self.write(|d| {
            if d.products.get(&id).is_some_and(|p| p.store_id == store_id) {
                d.products.remove(&id);
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::NotFound
            }
        }).await
    }

    // ── Additional categories ──

    async fn list_additional_categories(
        &self,
        store_id: i64,
    ) -> Result<Vec<AdditionalCategory>, BoxError> {
        let mut items: Vec<AdditionalCategory> = self
            .data
            .read()
            .additional_categories
            .values()
            .filter(|c| c.store_id == store_id)
            .cloned()
            .collect();
        by_sort_order(&mut items, |c| (c.sort_order, c.id));
        Ok(items)
    }

    async fn get_additional_category(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<Option<AdditionalCategory>, BoxError> {
        Ok(self
            .data
            .read()
            .additional_categories
            .get(&id)
            .filter(|c| c.store_id == store_id)
            .cloned())
    }

    async fn create_additional_category(
        &self,
        store_id: i64,
        data: &AdditionalCategoryCreate,
        now: i64,
    ) -> Result<AdditionalCategory, BoxError> {
        let category = AdditionalCategory::new(snowflake_id(), store_id, data, now);
        self.write(|d| {
            d.additional_categories.insert(category.id, category.clone());
        }).await?;
        Ok(category)
    }

    async fn update_additional_category(
        &self,
        store_id: i64,
        id: i64,
        data: &AdditionalCategoryUpdate,
        now: i64,
    ) -> Result<Option<AdditionalCategory>, BoxError> {
        self.write(|d| {
            let category = d
                .additional_categories
                .get_mut(&id)
                .filter(|c| c.store_id == store_id)?;
            category.apply(data, now);
            Some(category.clone())
        }).await
    }

    async fn delete_additional_category(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<DeleteOutcome, BoxError> {
        self.write(|d| {
            if !d
                .additional_categories
                .get(&id)
                .is_some_and(|c| c.store_id == store_id)
            {
                return DeleteOutcome::NotFound;
            }
            if d.additionals.values().any(|a| a.category_id == id) {
                return DeleteOutcome::InUse;
            }
            d.additional_categories.remove(&id);
            for product in d.products.values_mut().filter(|p| p.store_id == store_id) {
                product.additional_category_ids.retain(|cid| *cid != id);
            }
            DeleteOutcome::Deleted
        }).await
    }

    // ── Additionals ──

    async fn list_additionals(&self, store_id: i64) -> Result<Vec<Additional>, BoxError> {
        let mut items: Vec<Additional> = self
            .data
            .read()
            .additionals
            .values()
            .filter(|a| a.store_id == store_id)
            .cloned()
            .collect();
        by_sort_order(&mut items, |a| (a.sort_order, a.id));
        Ok(items)
    }

    async fn get_additional(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<Option<Additional>, BoxError> {
        Ok(self
            .data
            .read()
            .additionals
            .get(&id)
            .filter(|a| a.store_id == store_id)
            .cloned())
    }

    async fn create_additional(
        &self,
        store_id: i64,
        data: &AdditionalCreate,
        now: i64,
    ) -> Result<Additional, BoxError> {
        let additional = Additional::new(snowflake_id(), store_id, data, now);
        self.write(|d| {
            d.additionals.insert(additional.id, additional.clone());
        }).await?;
        Ok(additional)
    }

    async fn update_additional(
        &self,
        store_id: i64,
        id: i64,
        data: &AdditionalUpdate,
        now: i64,
    ) -> Result<Option<Additional>, BoxError> {
        self.write(|d| {
            let additional = d.additionals.get_mut(&id).filter(|a| a.store_id == store_id)?;
            additional.apply(data, now);
            Some(additional.clone())
        }).await
    }

    async fn delete_additional(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError> {
        self.write(|d| {
            if d.additionals.get(&id).is_some_and(|a| a.store_id == store_id) {
                d.additionals.remove(&id);
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::NotFound
            }
        }).await
    }

    // ── Orders ──

    async fn insert_order(&self, order: &Order) -> Result<(), BoxError> {
        self.write(|d| {
            d.orders.insert(order.id, order.clone());
        }).await
    }

    async fn get_order(&self, store_id: i64, id: Uuid) -> Result<Option<Order>, BoxError> {
        Ok(self
            .data
            .read()
            .orders
            .get(&id)
            .filter(|o| o.store_id == store_id)
            .cloned())
    }

    async fn list_orders(
        &self,
        store_id: i64,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, BoxError> {
        let guard = self.data.read();
        let mut items: Vec<&Order> = guard
            .orders
            .values()
            .filter(|o| o.store_id == store_id)
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .filter(|o| filter.from.is_none_or(|from| o.created_at >= from))
            .filter(|o| filter.to.is_none_or(|to| o.created_at < to))
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &self,
        store_id: i64,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
    ) -> Result<Option<Order>, BoxError> {
        self.write(|d| {
            let order = d
                .orders
                .get_mut(&id)
                .filter(|o| o.store_id == store_id && o.status == from)?;
            order.status = to;
            order.updated_at = now;
            Some(order.clone())
        }).await
    }

    async fn apply_payment_update(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        update: &PaymentUpdate,
        now: i64,
    ) -> Result<Option<Order>, BoxError> {
        self.write(|d| {
            let order = d
                .orders
                .get_mut(&id)
                .filter(|o| o.payment_status == expected)?;
            order.apply_payment(update, now);
            Some(order.clone())
        }).await
    }

    async fn list_pending_payments(
        &self,
        store_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Order>, BoxError> {
        let guard = self.data.read();
        let mut items: Vec<&Order> = guard
            .orders
            .values()
            .filter(|o| store_id.is_none_or(|id| o.store_id == id))
            .filter(|o| o.payment_status == PaymentStatus::Pending && o.payment_id.is_some())
            .collect();
        items.sort_by_key(|o| o.created_at);
        Ok(items
            .into_iter()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn find_order_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<Order>, BoxError> {
        Ok(self
            .data
            .read()
            .orders
            .values()
            .find(|o| o.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    // ── Notifications ──

    async fn insert_notification(&self, notification: &Notification) -> Result<(), BoxError> {
        self.write(|d| {
            d.notifications.insert(notification.id, notification.clone());
        }).await
    }

    async fn list_notifications(
        &self,
        store_id: i64,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, BoxError> {
        let guard = self.data.read();
        Ok(guard
            .notifications
            .values()
            .rev()
            .filter(|n| n.store_id == store_id && (!unread_only || !n.is_read))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, store_id: i64, id: i64) -> Result<bool, BoxError> {
        self.write(|d| {
            match d
                .notifications
                .get_mut(&id)
                .filter(|n| n.store_id == store_id)
            {
                Some(n) => {
                    n.is_read = true;
                    true
                }
                None => false,
            }
        }).await
    }

    async fn unread_notification_count(&self, store_id: i64) -> Result<i64, BoxError> {
        Ok(self
            .data
            .read()
            .notifications
            .values()
            .filter(|n| n.store_id == store_id && !n.is_read)
            .count() as i64)
    }

    // ── Push subscriptions ──

    async fn upsert_push_subscription(&self, sub: &PushSubscription) -> Result<(), BoxError> {
        self.write(|d| {
            d.push_subscriptions.retain(|s| s.endpoint != sub.endpoint);
            d.push_subscriptions.push(sub.clone());
        }).await
    }

    async fn list_push_subscriptions(
        &self,
        store_id: i64,
    ) -> Result<Vec<PushSubscription>, BoxError> {
        Ok(self
            .data
            .read()
            .push_subscriptions
            .iter()
            .filter(|s| s.store_id == store_id)
            .cloned()
            .collect())
    }

    async fn delete_push_subscription(
        &self,
        store_id: i64,
        endpoint: &str,
    ) -> Result<bool, BoxError> {
        self.write(|d| {
            let before = d.push_subscriptions.len();
            d.push_subscriptions
                .retain(|s| !(s.store_id == store_id && s.endpoint == endpoint));
            d.push_subscriptions.len() != before
        }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::models::{Fulfillment, PaymentMethod, ProductSize};

    fn product_create(category_id: i64) -> ProductCreate {
        ProductCreate {
            category_id,
            name: "Açaí no copo".into(),
            description: None,
            image_url: None,
            sizes: vec![ProductSize {
                name: "300ml".into(),
                price: Decimal::new(1500, 2),
                free_additionals: 2,
                max_additionals: Some(5),
            }],
            additional_category_ids: vec![],
            sort_order: None,
            is_featured: None,
        }
    }

    fn order(store_id: i64, created_at: i64) -> Order {
        Order {
            id: Uuid::new_v4(),
            store_id,
            customer_name: "Ana".into(),
            customer_phone: "11999990000".into(),
            customer_email: None,
            fulfillment: Fulfillment::Pickup,
            address: None,
            payment_method: PaymentMethod::Pix,
            change_for: None,
            items: vec![],
            subtotal: Decimal::new(1500, 2),
            delivery_fee: Decimal::ZERO,
            total: Decimal::new(1500, 2),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
            payment_status_detail: None,
            payment_qr_code: None,
            payment_qr_code_base64: None,
            payment_ticket_url: None,
            notes: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_category_scoped_by_store() {
        let store = LocalStore::in_memory();
        let cat = store
            .create_category(
                1,
                &CategoryCreate {
                    name: " Açaí ".into(),
                    description: None,
                    sort_order: None,
                },
                10,
            )
            .await
            .unwrap();
        assert_eq!(cat.name, "Açaí");
        assert!(store.get_category(2, cat.id).await.unwrap().is_none());
        assert_eq!(store.list_categories(1).await.unwrap().len(), 1);
        assert_eq!(
            store.delete_category(2, cat.id).await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_category_with_products_is_in_use() {
        let store = LocalStore::in_memory();
        let cat = store
            .create_category(
                1,
                &CategoryCreate {
                    name: "Açaí".into(),
                    description: None,
                    sort_order: None,
                },
                10,
            )
            .await
            .unwrap();
        let product = store.create_product(1, &product_create(cat.id), 10).await.unwrap();
        assert_eq!(
            store.delete_category(1, cat.id).await.unwrap(),
            DeleteOutcome::InUse
        );
        store.delete_product(1, product.id).await.unwrap();
        assert_eq!(
            store.delete_category(1, cat.id).await.unwrap(),
            DeleteOutcome::Deleted
        );
    }

    #[tokio::test]
    async fn test_order_status_compare_and_set() {
        let store = LocalStore::in_memory();
        let o = order(1, 100);
        store.insert_order(&o).await.unwrap();

        let updated = store
            .update_order_status(1, o.id, OrderStatus::Pending, OrderStatus::Confirmed, 200)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Confirmed);

        // Stale `from` does not match
        assert!(
            store
                .update_order_status(1, o.id, OrderStatus::Pending, OrderStatus::Cancelled, 300)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_orders_filters_and_pages() {
        let store = LocalStore::in_memory();
        for t in [100, 200, 300, 400] {
            store.insert_order(&order(1, t)).await.unwrap();
        }
        store.insert_order(&order(2, 250)).await.unwrap();

        let filter = OrderFilter {
            from: Some(200),
            to: Some(400),
            limit: 10,
            ..Default::default()
        };
        let orders = store.list_orders(1, &filter).await.unwrap();
        let times: Vec<i64> = orders.iter().map(|o| o.created_at).collect();
        assert_eq!(times, vec![300, 200]);

        let page = OrderFilter {
            limit: 2,
            offset: 1,
            ..Default::default()
        };
        let times: Vec<i64> = store
            .list_orders(1, &page)
            .await
            .unwrap()
            .iter()
            .map(|o| o.created_at)
            .collect();
        assert_eq!(times, vec![300, 200]);
    }

    #[tokio::test]
    async fn test_pending_payments_and_lookup() {
        let store = LocalStore::in_memory();
        let mut with_ref = order(1, 100);
        with_ref.payment_id = Some("123".into());
        store.insert_order(&with_ref).await.unwrap();
        store.insert_order(&order(1, 50)).await.unwrap();

        let mut other_store = order(2, 60);
        other_store.payment_id = Some("456".into());
        store.insert_order(&other_store).await.unwrap();

        assert_eq!(store.list_pending_payments(None, 10).await.unwrap().len(), 2);
        let pending = store.list_pending_payments(Some(1), 10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, with_ref.id);
        assert_eq!(
            store.find_order_by_payment_id("123").await.unwrap().unwrap().id,
            with_ref.id
        );

        let update = PaymentUpdate {
            payment_status: Some(PaymentStatus::Approved),
            ..Default::default()
        };
        assert!(
            store
                .apply_payment_update(with_ref.id, PaymentStatus::Pending, &update, 200)
                .await
                .unwrap()
                .is_some()
        );
        assert!(store.list_pending_payments(Some(1), 10).await.unwrap().is_empty());
        // Second apply with a stale expectation is a no-op
        assert!(
            store
                .apply_payment_update(with_ref.id, PaymentStatus::Pending, &update, 300)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.json");

        let store = LocalStore::open(&path).unwrap();
        let created = store
            .create_store(
                &StoreCreate {
                    slug: "acai-da-praia".into(),
                    name: "Açaí da Praia".into(),
                    email: "dono@praia.com".into(),
                    hashed_password: "hash".into(),
                },
                1,
            )
            .await
            .unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).unwrap();
        let found = reopened.find_store_by_slug("acai-da-praia").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.hashed_password, "hash");
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let store = LocalStore::in_memory();
        let data = StoreCreate {
            slug: "acai".into(),
            name: "Açaí".into(),
            email: "a@a.com".into(),
            hashed_password: "h".into(),
        };
        store.create_store(&data, 1).await.unwrap();
        let err = store.create_store(&data, 2).await.unwrap_err();
        assert_eq!(err.downcast_ref::<StoreConflict>(), Some(&StoreConflict::Slug));

        let same_email = StoreCreate {
            slug: "outra".into(),
            ..data
        };
        let err = store.create_store(&same_email, 3).await.unwrap_err();
        assert_eq!(err.downcast_ref::<StoreConflict>(), Some(&StoreConflict::Email));
    }

    #[tokio::test]
    async fn test_failed_snapshot_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("shop.json");
        let store = LocalStore::open(&path).unwrap();

        let config = StoreConfig::default_for(7, "Açaí", 1);
        assert!(store.save_config(&config).await.is_err());
        assert!(store.get_config(7).await.unwrap().is_none());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        store.save_config(&config).await.unwrap();
        assert!(store.get_config(7).await.unwrap().is_some());
        assert!(path.exists());
    }
}
