//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Cup/pot size with its own price and additional allowance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSize {
    /// e.g. "300ml", "500ml"
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Additional units included in the price
    #[serde(default)]
    pub free_additionals: i32,
    /// Cap on additional units for this size (null = unlimited)
    #[serde(default)]
    pub max_additionals: Option<i32>,
}

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub store_id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sizes: Vec<ProductSize>,
    /// Additional groups offered with this product
    pub additional_category_ids: Vec<i64>,
    pub sort_order: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub category_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sizes: Vec<ProductSize>,
    #[serde(default)]
    pub additional_category_ids: Vec<i64>,
    pub sort_order: Option<i32>,
    pub is_featured: Option<bool>,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    /// `Some(None)` clears the text
    #[serde(
        default,
        with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<Option<String>>,
    pub sizes: Option<Vec<ProductSize>>,
    pub additional_category_ids: Option<Vec<i64>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

impl Product {
    pub fn new(id: i64, store_id: i64, data: &ProductCreate, now: i64) -> Self {
        Self {
            id,
            store_id,
            category_id: data.category_id,
            name: data.name.trim().to_string(),
            description: data.description.clone(),
            image_url: data.image_url.clone(),
            sizes: data.sizes.clone(),
            additional_category_ids: data.additional_category_ids.clone(),
            sort_order: data.sort_order.unwrap_or(0),
            is_active: true,
            is_featured: data.is_featured.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn size(&self, name: &str) -> Option<&ProductSize> {
        self.sizes.iter().find(|s| s.name == name)
    }

    /// Lowest size price, shown as "a partir de" on the storefront
    pub fn starting_price(&self) -> Option<Decimal> {
        self.sizes.iter().map(|s| s.price).min()
    }

    pub fn apply(&mut self, update: &ProductUpdate, now: i64) {
        if let Some(v) = update.category_id {
            self.category_id = v;
        }
        if let Some(v) = &update.name {
            self.name = v.clone();
        }
        if let Some(v) = &update.description {
            self.description = v.clone();
        }
        if let Some(v) = &update.image_url {
            self.image_url = v.clone();
        }
        if let Some(v) = &update.sizes {
            self.sizes = v.clone();
        }
        if let Some(v) = &update.additional_category_ids {
            self.additional_category_ids = v.clone();
        }
        if let Some(v) = update.sort_order {
            self.sort_order = v;
        }
        if let Some(v) = update.is_active {
            self.is_active = v;
        }
        if let Some(v) = update.is_featured {
            self.is_featured = v;
        }
        self.updated_at = now;
    }
}

/// A product needs at least one size; names are unique, amounts non-negative.
pub fn validate_sizes(sizes: &[ProductSize]) -> AppResult<()> {
    use crate::error::ErrorCode;

    if sizes.is_empty() {
        return Err(AppError::validation("Product needs at least one size"));
    }
    let mut seen = std::collections::HashSet::new();
    for size in sizes {
        if size.name.trim().is_empty() {
            return Err(AppError::validation("Size name must not be empty"));
        }
        if !seen.insert(size.name.as_str()) {
            return Err(AppError::validation("Duplicate size name").with_detail("size", size.name.clone()));
        }
        if size.price.is_sign_negative() {
            return Err(AppError::new(ErrorCode::ProductInvalidPrice).with_detail("size", size.name.clone()));
        }
        if size.free_additionals < 0 || size.max_additionals.is_some_and(|m| m < 0) {
            return Err(AppError::validation("Additional limits must not be negative")
                .with_detail("size", size.name.clone()));
        }
        if let Some(max) = size.max_additionals
            && size.free_additionals > max
        {
            return Err(AppError::validation("free_additionals exceeds max_additionals")
                .with_detail("size", size.name.clone()));
        }
    }
    Ok(())
}
