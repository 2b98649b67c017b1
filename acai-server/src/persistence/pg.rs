//! PostgreSQL persistence backend

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Additional, AdditionalCategory, AdditionalCategoryCreate, AdditionalCategoryUpdate,
    AdditionalCreate, AdditionalUpdate, Category, CategoryCreate, CategoryUpdate, Fulfillment,
    Notification, OpeningHours, Order, OrderFilter, OrderStatus, PaymentMethod, PaymentStatus,
    PaymentUpdate, PricedLine, Product, ProductCreate, ProductSize, ProductUpdate,
    PushSubscription, Store, StoreConfig, StoreCreate,
};
use shared::util::snowflake_id;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{DeleteOutcome, ShopStore, StoreConflict};
use crate::BoxError;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run pending migrations
    pub async fn connect(database_url: &str) -> Result<Self, BoxError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ── Row types for columns that are not flat ──

#[derive(sqlx::FromRow)]
struct ConfigRow {
    store_id: i64,
    display_name: String,
    theme_color: String,
    logo_url: Option<String>,
    banner_url: Option<String>,
    phone: Option<String>,
    whatsapp: Option<String>,
    email: Option<String>,
    address: Option<String>,
    instagram: Option<String>,
    opening_hours: Json<Vec<OpeningHours>>,
    utc_offset_minutes: i32,
    open_override: Option<bool>,
    accepts_delivery: bool,
    accepts_pickup: bool,
    delivery_fee: Decimal,
    min_order_value: Decimal,
    updated_at: i64,
}

impl From<ConfigRow> for StoreConfig {
    fn from(r: ConfigRow) -> Self {
        Self {
            store_id: r.store_id,
            display_name: r.display_name,
            theme_color: r.theme_color,
            logo_url: r.logo_url,
            banner_url: r.banner_url,
            phone: r.phone,
            whatsapp: r.whatsapp,
            email: r.email,
            address: r.address,
            instagram: r.instagram,
            opening_hours: r.opening_hours.0,
            utc_offset_minutes: r.utc_offset_minutes,
            open_override: r.open_override,
            accepts_delivery: r.accepts_delivery,
            accepts_pickup: r.accepts_pickup,
            delivery_fee: r.delivery_fee,
            min_order_value: r.min_order_value,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    store_id: i64,
    category_id: i64,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    sizes: Json<Vec<ProductSize>>,
    additional_category_ids: Vec<i64>,
    sort_order: i32,
    is_active: bool,
    is_featured: bool,
    created_at: i64,
    updated_at: i64,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            store_id: r.store_id,
            category_id: r.category_id,
            name: r.name,
            description: r.description,
            image_url: r.image_url,
            sizes: r.sizes.0,
            additional_category_ids: r.additional_category_ids,
            sort_order: r.sort_order,
            is_active: r.is_active,
            is_featured: r.is_featured,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    store_id: i64,
    customer_name: String,
    customer_phone: String,
    customer_email: Option<String>,
    fulfillment: String,
    address: Option<String>,
    payment_method: String,
    change_for: Option<Decimal>,
    items: Json<Vec<PricedLine>>,
    subtotal: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
    status: String,
    payment_status: String,
    payment_id: Option<String>,
    payment_status_detail: Option<String>,
    payment_qr_code: Option<String>,
    payment_qr_code_base64: Option<String>,
    payment_ticket_url: Option<String>,
    notes: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = BoxError;

    fn try_from(r: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            fulfillment: Fulfillment::from_db(&r.fulfillment)
                .ok_or_else(|| format!("unknown fulfillment: {}", r.fulfillment))?,
            payment_method: PaymentMethod::from_db(&r.payment_method)
                .ok_or_else(|| format!("unknown payment method: {}", r.payment_method))?,
            status: OrderStatus::from_db(&r.status)
                .ok_or_else(|| format!("unknown order status: {}", r.status))?,
            payment_status: PaymentStatus::from_db(&r.payment_status)
                .ok_or_else(|| format!("unknown payment status: {}", r.payment_status))?,
            id: r.id,
            store_id: r.store_id,
            customer_name: r.customer_name,
            customer_phone: r.customer_phone,
            customer_email: r.customer_email,
            address: r.address,
            change_for: r.change_for,
            items: r.items.0,
            subtotal: r.subtotal,
            delivery_fee: r.delivery_fee,
            total: r.total,
            payment_id: r.payment_id,
            payment_status_detail: r.payment_status_detail,
            payment_qr_code: r.payment_qr_code,
            payment_qr_code_base64: r.payment_qr_code_base64,
            payment_ticket_url: r.payment_ticket_url,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

fn orders_from_rows(rows: Vec<OrderRow>) -> Result<Vec<Order>, BoxError> {
    rows.into_iter().map(Order::try_from).collect()
}

/// Unique violations on `stores` become [`StoreConflict`]
fn store_conflict(e: sqlx::Error) -> BoxError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        match db.constraint() {
            Some("stores_slug_key") => return StoreConflict::Slug.into(),
            Some("stores_email_key") => return StoreConflict::Email.into(),
            _ => {}
        }
    }
    e.into()
}

#[async_trait]
impl ShopStore for PgStore {
    // ── Stores ──

    async fn create_store(&self, data: &StoreCreate, now: i64) -> Result<Store, BoxError> {
        let store = Store::new(snowflake_id(), data, now);
        sqlx::query(
            "INSERT INTO stores (id, slug, name, email, hashed_password, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(store.id)
        .bind(&store.slug)
        .bind(&store.name)
        .bind(&store.email)
        .bind(&store.hashed_password)
        .bind(store.is_active)
        .bind(store.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_conflict)?;
        Ok(store)
    }

    async fn find_store_by_id(&self, id: i64) -> Result<Option<Store>, BoxError> {
        let row = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, BoxError> {
        let row = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_store_by_email(&self, email: &str) -> Result<Option<Store>, BoxError> {
        let row = sqlx::query_as::<_, Store>("SELECT * FROM stores WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // ── Store config ──

    async fn get_config(&self, store_id: i64) -> Result<Option<StoreConfig>, BoxError> {
        let row = sqlx::query_as::<_, ConfigRow>("SELECT * FROM store_configs WHERE store_id = $1")
            .bind(store_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(StoreConfig::from))
    }

    async fn save_config(&self, c: &StoreConfig) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            INSERT INTO store_configs (
                store_id, display_name, theme_color, logo_url, banner_url, phone,
                whatsapp, email, address, instagram, opening_hours, utc_offset_minutes,
                open_override, accepts_delivery, accepts_pickup, delivery_fee,
                min_order_value, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT (store_id) DO UPDATE SET
                display_name = EXCLUDED.display_name, theme_color = EXCLUDED.theme_color,
                logo_url = EXCLUDED.logo_url, banner_url = EXCLUDED.banner_url,
                phone = EXCLUDED.phone, whatsapp = EXCLUDED.whatsapp,
                email = EXCLUDED.email, address = EXCLUDED.address,
                instagram = EXCLUDED.instagram, opening_hours = EXCLUDED.opening_hours,
                utc_offset_minutes = EXCLUDED.utc_offset_minutes,
                open_override = EXCLUDED.open_override,
                accepts_delivery = EXCLUDED.accepts_delivery,
                accepts_pickup = EXCLUDED.accepts_pickup,
                delivery_fee = EXCLUDED.delivery_fee,
                min_order_value = EXCLUDED.min_order_value,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(c.store_id)
        .bind(&c.display_name)
        .bind(&c.theme_color)
        .bind(&c.logo_url)
        .bind(&c.banner_url)
        .bind(&c.phone)
        .bind(&c.whatsapp)
        .bind(&c.email)
        .bind(&c.address)
        .bind(&c.instagram)
        .bind(Json(&c.opening_hours))
        .bind(c.utc_offset_minutes)
        .bind(c.open_override)
        .bind(c.accepts_delivery)
        .bind(c.accepts_pickup)
        .bind(c.delivery_fee)
        .bind(c.min_order_value)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ── Categories ──

    async fn list_categories(&self, store_id: i64) -> Result<Vec<Category>, BoxError> {
        let rows = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE store_id = $1 ORDER BY sort_order, id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_category(&self, store_id: i64, id: i64) -> Result<Option<Category>, BoxError> {
        let row = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE store_id = $1 AND id = $2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_category(
        &self,
        store_id: i64,
        data: &CategoryCreate,
        now: i64,
    ) -> Result<Category, BoxError> {
        let c = Category::new(snowflake_id(), store_id, data, now);
        sqlx::query(
            "INSERT INTO categories (id, store_id, name, description, sort_order, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(c.id)
        .bind(c.store_id)
        .bind(&c.name)
        .bind(&c.description)
        .bind(c.sort_order)
        .bind(c.is_active)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(c)
    }

    async fn update_category(
        &self,
        store_id: i64,
        id: i64,
        data: &CategoryUpdate,
        now: i64,
    ) -> Result<Option<Category>, BoxError> {
        let row = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET
                name = COALESCE($3, name),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                sort_order = COALESCE($6, sort_order),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(&data.name)
        .bind(data.description.is_some())
        .bind(data.description.as_ref().and_then(|d| d.as_deref()))
        .bind(data.sort_order)
        .bind(data.is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_category(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM categories WHERE store_id = $1 AND id = $2 FOR UPDATE")
                .bind(store_id)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }
        let (in_use,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use {
            return Ok(DeleteOutcome::InUse);
        }
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    // ── Products ──

    async fn list_products(&self, store_id: i64) -> Result<Vec<Product>, BoxError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE store_id = $1 ORDER BY sort_order, id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, store_id: i64, id: i64) -> Result<Option<Product>, BoxError> {
        let row = sqlx::query_as::<_, ProductRow>(
            "SELECT * FROM products WHERE store_id = $1 AND id = $2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn create_product(
        &self,
        store_id: i64,
        data: &ProductCreate,
        now: i64,
    ) -> Result<Product, BoxError> {
        let p = Product::new(snowflake_id(), store_id, data, now);
        sqlx::query(
            r#"
            INSERT INTO products (
                id, store_id, category_id, name, description, image_url, sizes,
                additional_category_ids, sort_order, is_active, is_featured, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(p.id)
        .bind(p.store_id)
        .bind(p.category_id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(&p.image_url)
        .bind(Json(&p.sizes))
        .bind(&p.additional_category_ids)
        .bind(p.sort_order)
        .bind(p.is_active)
        .bind(p.is_featured)
        .bind(p.created_at)
        .bind(p.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(p)
    }

    async fn update_product(
        &self,
        store_id: i64,
        id: i64,
        data: &ProductUpdate,
        now: i64,
    ) -> Result<Option<Product>, BoxError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products SET
                category_id = COALESCE($3, category_id),
                name = COALESCE($4, name),
                description = CASE WHEN $5 THEN $6 ELSE description END,
                image_url = CASE WHEN $7 THEN $8 ELSE image_url END,
                sizes = COALESCE($9, sizes),
                additional_category_ids = COALESCE($10, additional_category_ids),
                sort_order = COALESCE($11, sort_order),
                is_active = COALESCE($12, is_active),
                is_featured = COALESCE($13, is_featured),
                updated_at = $14
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(data.category_id)
        .bind(&data.name)
        .bind(data.description.is_some())
        .bind(data.description.as_ref().and_then(|d| d.as_deref()))
        .bind(data.image_url.is_some())
        .bind(data.image_url.as_ref().and_then(|u| u.as_deref()))
        .bind(data.sizes.as_ref().map(Json))
        .bind(&data.additional_category_ids)
        .bind(data.sort_order)
        .bind(data.is_active)
        .bind(data.is_featured)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn delete_product(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError> {
        let result = sqlx::query("DELETE FROM products WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(if result.rows_affected() > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    // ── Additional categories ──

    async fn list_additional_categories(
        &self,
        store_id: i64,
    ) -> Result<Vec<AdditionalCategory>, BoxError> {
        let rows = sqlx::query_as::<_, AdditionalCategory>(
            "SELECT * FROM additional_categories WHERE store_id = $1 ORDER BY sort_order, id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_additional_category(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<Option<AdditionalCategory>, BoxError> {
        let row = sqlx::query_as::<_, AdditionalCategory>(
            "SELECT * FROM additional_categories WHERE store_id = $1 AND id = $2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_additional_category(
        &self,
        store_id: i64,
        data: &AdditionalCategoryCreate,
        now: i64,
    ) -> Result<AdditionalCategory, BoxError> {
        let c = AdditionalCategory::new(snowflake_id(), store_id, data, now);
        sqlx::query(
            r#"
            INSERT INTO additional_categories (
                id, store_id, name, sort_order, min_selections, max_selections,
                is_free_eligible, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(c.id)
        .bind(c.store_id)
        .bind(&c.name)
        .bind(c.sort_order)
        .bind(c.min_selections)
        .bind(c.max_selections)
        .bind(c.is_free_eligible)
        .bind(c.is_active)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(c)
    }

    async fn update_additional_category(
        &self,
        store_id: i64,
        id: i64,
        data: &AdditionalCategoryUpdate,
        now: i64,
    ) -> Result<Option<AdditionalCategory>, BoxError> {
        let row = sqlx::query_as::<_, AdditionalCategory>(
            r#"
            UPDATE additional_categories SET
                name = COALESCE($3, name),
                sort_order = COALESCE($4, sort_order),
                min_selections = COALESCE($5, min_selections),
                max_selections = CASE WHEN $6 THEN $7 ELSE max_selections END,
                is_free_eligible = COALESCE($8, is_free_eligible),
                is_active = COALESCE($9, is_active),
                updated_at = $10
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(&data.name)
        .bind(data.sort_order)
        .bind(data.min_selections)
        .bind(data.max_selections.is_some())
        .bind(data.max_selections.flatten())
        .bind(data.is_free_eligible)
        .bind(data.is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_additional_category(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<DeleteOutcome, BoxError> {
        let mut tx = self.pool.begin().await?;
        let exists: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM additional_categories WHERE store_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if exists.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }
        let (in_use,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM additionals WHERE category_id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use {
            return Ok(DeleteOutcome::InUse);
        }
        sqlx::query("DELETE FROM additional_categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE products SET additional_category_ids = array_remove(additional_category_ids, $1)
             WHERE store_id = $2 AND $1 = ANY(additional_category_ids)",
        )
        .bind(id)
        .bind(store_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    // ── Additionals ──

    async fn list_additionals(&self, store_id: i64) -> Result<Vec<Additional>, BoxError> {
        let rows = sqlx::query_as::<_, Additional>(
            "SELECT * FROM additionals WHERE store_id = $1 ORDER BY sort_order, id",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_additional(
        &self,
        store_id: i64,
        id: i64,
    ) -> Result<Option<Additional>, BoxError> {
        let row = sqlx::query_as::<_, Additional>(
            "SELECT * FROM additionals WHERE store_id = $1 AND id = $2",
        )
        .bind(store_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_additional(
        &self,
        store_id: i64,
        data: &AdditionalCreate,
        now: i64,
    ) -> Result<Additional, BoxError> {
        let a = Additional::new(snowflake_id(), store_id, data, now);
        sqlx::query(
            "INSERT INTO additionals (id, store_id, category_id, name, price, sort_order, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(a.id)
        .bind(a.store_id)
        .bind(a.category_id)
        .bind(&a.name)
        .bind(a.price)
        .bind(a.sort_order)
        .bind(a.is_active)
        .bind(a.created_at)
        .bind(a.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(a)
    }

    async fn update_additional(
        &self,
        store_id: i64,
        id: i64,
        data: &AdditionalUpdate,
        now: i64,
    ) -> Result<Option<Additional>, BoxError> {
        let row = sqlx::query_as::<_, Additional>(
            r#"
            UPDATE additionals SET
                category_id = COALESCE($3, category_id),
                name = COALESCE($4, name),
                price = COALESCE($5, price),
                sort_order = COALESCE($6, sort_order),
                is_active = COALESCE($7, is_active),
                updated_at = $8
            WHERE store_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(store_id)
        .bind(id)
        .bind(data.category_id)
        .bind(&data.name)
        .bind(data.price)
        .bind(data.sort_order)
        .bind(data.is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_additional(&self, store_id: i64, id: i64) -> Result<DeleteOutcome, BoxError> {
        let result = sqlx::query("DELETE FROM additionals WHERE store_id = $1 AND id = $2")
            .bind(store_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(if result.rows_affected() > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        })
    }

    // ── Orders ──

    async fn insert_order(&self, o: &Order) -> Result<(), BoxError> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, store_id, customer_name, customer_phone, customer_email, fulfillment,
                address, payment_method, change_for, items, subtotal, delivery_fee, total,
                status, payment_status, payment_id, payment_status_detail, payment_qr_code,
                payment_qr_code_base64, payment_ticket_url, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(o.id)
        .bind(o.store_id)
        .bind(&o.customer_name)
        .bind(&o.customer_phone)
        .bind(&o.customer_email)
        .bind(o.fulfillment.as_db())
        .bind(&o.address)
        .bind(o.payment_method.as_db())
        .bind(o.change_for)
        .bind(Json(&o.items))
        .bind(o.subtotal)
        .bind(o.delivery_fee)
        .bind(o.total)
        .bind(o.status.as_db())
        .bind(o.payment_status.as_db())
        .bind(&o.payment_id)
        .bind(&o.payment_status_detail)
        .bind(&o.payment_qr_code)
        .bind(&o.payment_qr_code_base64)
        .bind(&o.payment_ticket_url)
        .bind(&o.notes)
        .bind(o.created_at)
        .bind(o.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_order(&self, store_id: i64, id: Uuid) -> Result<Option<Order>, BoxError> {
        let row =
            sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE store_id = $1 AND id = $2")
                .bind(store_id)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_orders(
        &self,
        store_id: i64,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, BoxError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT * FROM orders
            WHERE store_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND ($3::bigint IS NULL OR created_at >= $3)
              AND ($4::bigint IS NULL OR created_at < $4)
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(store_id)
        .bind(filter.status.map(|s| s.as_db()))
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        orders_from_rows(rows)
    }

    async fn update_order_status(
        &self,
        store_id: i64,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        now: i64,
    ) -> Result<Option<Order>, BoxError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "UPDATE orders SET status = $4, updated_at = $5
             WHERE store_id = $1 AND id = $2 AND status = $3
             RETURNING *",
        )
        .bind(store_id)
        .bind(id)
        .bind(from.as_db())
        .bind(to.as_db())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn apply_payment_update(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        u: &PaymentUpdate,
        now: i64,
    ) -> Result<Option<Order>, BoxError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders SET
                payment_id = COALESCE($3, payment_id),
                payment_status = COALESCE($4, payment_status),
                payment_status_detail = COALESCE($5, payment_status_detail),
                payment_qr_code = COALESCE($6, payment_qr_code),
                payment_qr_code_base64 = COALESCE($7, payment_qr_code_base64),
                payment_ticket_url = COALESCE($8, payment_ticket_url),
                updated_at = $9
            WHERE id = $1 AND payment_status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.as_db())
        .bind(&u.payment_id)
        .bind(u.payment_status.map(|s| s.as_db()))
        .bind(&u.payment_status_detail)
        .bind(&u.payment_qr_code)
        .bind(&u.payment_qr_code_base64)
        .bind(&u.payment_ticket_url)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Order::try_from).transpose()
    }

    async fn list_pending_payments(
        &self,
        store_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Order>, BoxError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT * FROM orders
             WHERE payment_status = 'pending' AND payment_id IS NOT NULL
               AND ($1::BIGINT IS NULL OR store_id = $1)
             ORDER BY created_at
             LIMIT $2",
        )
        .bind(store_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        orders_from_rows(rows)
    }

    async fn find_order_by_payment_id(
        &self,
        payment_id: &str,
    ) -> Result<Option<Order>, BoxError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE payment_id = $1")
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    // ── Notifications ──

    async fn insert_notification(&self, n: &Notification) -> Result<(), BoxError> {
        sqlx::query(
            "INSERT INTO notifications (id, store_id, kind, title, body, order_id, is_read, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(n.id)
        .bind(n.store_id)
        .bind(&n.kind)
        .bind(&n.title)
        .bind(&n.body)
        .bind(n.order_id)
        .bind(n.is_read)
        .bind(n.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        store_id: i64,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Notification>, BoxError> {
        let rows = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE store_id = $1 AND (NOT $2 OR is_read = FALSE)
             ORDER BY created_at DESC, id DESC
             LIMIT $3",
        )
        .bind(store_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn mark_notification_read(&self, store_id: i64, id: i64) -> Result<bool, BoxError> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE store_id = $1 AND id = $2")
                .bind(store_id)
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn unread_notification_count(&self, store_id: i64) -> Result<i64, BoxError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE store_id = $1 AND is_read = FALSE",
        )
        .bind(store_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    // ── Push subscriptions ──

    async fn upsert_push_subscription(&self, s: &PushSubscription) -> Result<(), BoxError> {
        sqlx::query(
            "INSERT INTO push_subscriptions (endpoint, store_id, p256dh, auth, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (endpoint) DO UPDATE SET
                store_id = EXCLUDED.store_id, p256dh = EXCLUDED.p256dh, auth = EXCLUDED.auth",
        )
        .bind(&s.endpoint)
        .bind(s.store_id)
        .bind(&s.p256dh)
        .bind(&s.auth)
        .bind(s.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_push_subscriptions(
        &self,
        store_id: i64,
    ) -> Result<Vec<PushSubscription>, BoxError> {
        let rows = sqlx::query_as::<_, PushSubscription>(
            "SELECT store_id, endpoint, p256dh, auth, created_at
             FROM push_subscriptions WHERE store_id = $1",
        )
        .bind(store_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_push_subscription(
        &self,
        store_id: i64,
        endpoint: &str,
    ) -> Result<bool, BoxError> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE store_id = $1 AND endpoint = $2")
                .bind(store_id)
                .bind(endpoint)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
