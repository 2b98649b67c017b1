//! Public storefront API
//!
//! GET /api/shops/{slug} - shop info + open flag
//! GET /api/shops/{slug}/catalog - active catalog
//! POST /api/shops/{slug}/cart/quote - server-side cart pricing
//! GET /api/shops/{slug}/orders/{id} - order tracking

use std::collections::HashSet;

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Additional, AdditionalCategory, CartItem, CartQuote, Category, Fulfillment, Order, Product,
    StoreConfig,
};
use uuid::Uuid;

use crate::pricing::{Catalog, quote_cart};
use crate::state::AppState;

use super::{ApiResult, internal, load_config, resolve_shop};

#[derive(Serialize)]
pub struct ShopResponse {
    pub slug: String,
    pub name: String,
    pub config: StoreConfig,
    pub is_open: bool,
}

#[derive(Serialize)]
pub struct AdditionalGroup {
    #[serde(flatten)]
    pub category: AdditionalCategory,
    pub additionals: Vec<Additional>,
}

#[derive(Serialize)]
pub struct CatalogResponse {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub additional_groups: Vec<AdditionalGroup>,
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub items: Vec<CartItem>,
    #[serde(default = "default_fulfillment")]
    pub fulfillment: Fulfillment,
}

fn default_fulfillment() -> Fulfillment {
    Fulfillment::Pickup
}

pub async fn get_shop(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ShopResponse> {
    let store = resolve_shop(&state, &slug).await?;
    let config = load_config(&state, &store).await?;
    Ok(Json(ShopResponse {
        is_open: config.is_open_at(chrono::Utc::now()),
        slug: store.slug,
        name: store.name,
        config,
    }))
}

/// Active categories, their active products, and the active additional
/// groups those products offer.
pub async fn get_catalog(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<CatalogResponse> {
    let store = resolve_shop(&state, &slug).await?;

    let mut categories: Vec<Category> = state
        .store
        .list_categories(store.id)
        .await
        .map_err(internal)?
        .into_iter()
        .filter(|c| c.is_active)
        .collect();
    categories.sort_by_key(|c| (c.sort_order, c.id));
    let visible: HashSet<i64> = categories.iter().map(|c| c.id).collect();

    let mut products: Vec<Product> = state
        .store
        .list_products(store.id)
        .await
        .map_err(internal)?
        .into_iter()
        .filter(|p| p.is_active && visible.contains(&p.category_id))
        .collect();
    products.sort_by_key(|p| (p.sort_order, p.id));

    let mut additionals = state
        .store
        .list_additionals(store.id)
        .await
        .map_err(internal)?;
    additionals.retain(|a| a.is_active);
    additionals.sort_by_key(|a| (a.sort_order, a.id));

    let mut groups = state
        .store
        .list_additional_categories(store.id)
        .await
        .map_err(internal)?;
    groups.retain(|g| g.is_active);
    groups.sort_by_key(|g| (g.sort_order, g.id));

    let additional_groups = groups
        .into_iter()
        .map(|category| AdditionalGroup {
            additionals: additionals
                .iter()
                .filter(|a| a.category_id == category.id)
                .cloned()
                .collect(),
            category,
        })
        .collect();

    Ok(Json(CatalogResponse {
        categories,
        products,
        additional_groups,
    }))
}

pub async fn quote(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<QuoteRequest>,
) -> ApiResult<CartQuote> {
    let store = resolve_shop(&state, &slug).await?;
    let config = load_config(&state, &store).await?;
    let catalog = Catalog::load(state.store.as_ref(), store.id)
        .await
        .map_err(internal)?;
    Ok(Json(quote_cart(&req.items, req.fulfillment, &config, &catalog)?))
}

pub async fn track_order(
    State(state): State<AppState>,
    Path((slug, order_id)): Path<(String, Uuid)>,
) -> ApiResult<Order> {
    let store = resolve_shop(&state, &slug).await?;
    let order = state
        .store
        .get_order(store.id, order_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(order))
}
