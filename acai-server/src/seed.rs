//! Default data for new stores
//!
//! `seed_store_defaults` runs after registration and at startup for the demo
//! store. Each part only runs when its table is empty for the store, so
//! calling it again never duplicates rows.

use rust_decimal::Decimal;
use shared::models::{
    AdditionalCategoryCreate, AdditionalCreate, CategoryCreate, ProductCreate, ProductSize,
    Store, StoreConfig, StoreCreate,
};
use shared::util::now_millis;

use crate::BoxError;
use crate::util::hash_password;
use crate::persistence::ShopStore;

pub const DEMO_SLUG: &str = "acai-demo";
const DEMO_EMAIL: &str = "demo@acai.local";
const DEMO_PASSWORD: &str = "acai-demo-123";

/// (group name, min, max, free-eligible, [(additional, price in cents)])
type GroupSeed = (
    &'static str,
    i32,
    Option<i32>,
    bool,
    &'static [(&'static str, i64)],
);

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Açaí", "Açaí batido na hora, no copo ou na tigela"),
    ("Sorvetes", "Sorvetes de massa e picolés"),
];

const DEFAULT_GROUPS: &[GroupSeed] = &[
    (
        "Frutas",
        0,
        Some(3),
        true,
        &[("Banana", 200), ("Morango", 300), ("Kiwi", 350)],
    ),
    (
        "Complementos",
        0,
        None,
        true,
        &[("Granola", 200), ("Leite em pó", 250), ("Paçoca", 250)],
    ),
    (
        "Coberturas",
        0,
        Some(2),
        true,
        &[("Leite condensado", 200), ("Mel", 200), ("Chocolate", 250)],
    ),
    (
        "Adicionais Premium",
        0,
        None,
        false,
        &[("Nutella", 800), ("Ninho com Nutella", 900)],
    ),
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub config: bool,
    pub categories: usize,
    pub additional_categories: usize,
    pub additionals: usize,
}

/// Seed default config, categories and additional groups for a store
pub async fn seed_store_defaults(
    store: &dyn ShopStore,
    store_id: i64,
    display_name: &str,
) -> Result<SeedReport, BoxError> {
    let now = now_millis();
    let mut report = SeedReport::default();

    if store.get_config(store_id).await?.is_none() {
        store
            .save_config(&StoreConfig::default_for(store_id, display_name, now))
            .await?;
        report.config = true;
    }

    if store.list_categories(store_id).await?.is_empty() {
        for (i, (name, description)) in DEFAULT_CATEGORIES.iter().enumerate() {
            let data = CategoryCreate {
                name: (*name).to_string(),
                description: Some((*description).to_string()),
                sort_order: Some(i as i32),
            };
            store.create_category(store_id, &data, now).await?;
            report.categories += 1;
        }
    }

    if store.list_additional_categories(store_id).await?.is_empty() {
        for (i, (name, min, max, free, items)) in DEFAULT_GROUPS.iter().enumerate() {
            let group = store
                .create_additional_category(
                    store_id,
                    &AdditionalCategoryCreate {
                        name: (*name).to_string(),
                        sort_order: Some(i as i32),
                        min_selections: Some(*min),
                        max_selections: *max,
                        is_free_eligible: Some(*free),
                    },
                    now,
                )
                .await?;
            report.additional_categories += 1;

            for (j, (item, cents)) in items.iter().enumerate() {
                store
                    .create_additional(
                        store_id,
                        &AdditionalCreate {
                            category_id: group.id,
                            name: (*item).to_string(),
                            price: Decimal::new(*cents, 2),
                            sort_order: Some(j as i32),
                        },
                        now,
                    )
                    .await?;
                report.additionals += 1;
            }
        }
    }

    if report != SeedReport::default() {
        tracing::info!(store_id, ?report, "Seeded store defaults");
    }
    Ok(report)
}

/// Create the demo tenant with one sample product, if it does not exist yet
pub async fn seed_demo_store(store: &dyn ShopStore) -> Result<Store, BoxError> {
    if let Some(existing) = store.find_store_by_slug(DEMO_SLUG).await? {
        seed_store_defaults(store, existing.id, &existing.name).await?;
        return Ok(existing);
    }

    let now = now_millis();
    let hashed_password = hash_password(DEMO_PASSWORD).map_err(|e| e.to_string())?;
    let demo = store
        .create_store(
            &StoreCreate {
                slug: DEMO_SLUG.to_string(),
                name: "Açaí Demo".to_string(),
                email: DEMO_EMAIL.to_string(),
                hashed_password,
            },
            now,
        )
        .await?;
    seed_store_defaults(store, demo.id, &demo.name).await?;

    let categories = store.list_categories(demo.id).await?;
    let groups = store.list_additional_categories(demo.id).await?;
    if let Some(acai) = categories.first() {
        let size = |name: &str, cents: i64, free: i32, max: i32| ProductSize {
            name: name.to_string(),
            price: Decimal::new(cents, 2),
            free_additionals: free,
            max_additionals: Some(max),
        };
        store
            .create_product(
                demo.id,
                &ProductCreate {
                    category_id: acai.id,
                    name: "Açaí no copo".to_string(),
                    description: Some("Monte do seu jeito".to_string()),
                    image_url: None,
                    sizes: vec![
                        size("300ml", 1400, 2, 5),
                        size("500ml", 1900, 3, 7),
                        size("700ml", 2400, 4, 9),
                    ],
                    additional_category_ids: groups.iter().map(|g| g.id).collect(),
                    sort_order: Some(0),
                    is_featured: Some(true),
                },
                now,
            )
            .await?;
    }

    tracing::info!(store_id = demo.id, slug = DEMO_SLUG, "Demo store created");
    Ok(demo)
}
