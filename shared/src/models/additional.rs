//! Additional Model
//!
//! Additionals are optional add-ons (toppings, fruits, syrups) attached to
//! an order line. They are grouped in [`AdditionalCategory`] which caps how
//! many units a customer may pick from the group and whether the group's
//! units can consume the size's free allowance.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Additional group entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AdditionalCategory {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub sort_order: i32,
    /// Minimum units per order line (0 = optional group)
    pub min_selections: i32,
    /// Maximum units per order line (null = unlimited)
    pub max_selections: Option<i32>,
    /// Units from this group may be covered by the size's free allowance
    pub is_free_eligible: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create additional group payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalCategoryCreate {
    pub name: String,
    pub sort_order: Option<i32>,
    pub min_selections: Option<i32>,
    pub max_selections: Option<i32>,
    pub is_free_eligible: Option<bool>,
}

/// Update additional group payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalCategoryUpdate {
    pub name: Option<String>,
    pub sort_order: Option<i32>,
    pub min_selections: Option<i32>,
    /// `Some(None)` removes the cap
    #[serde(
        default,
        with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_selections: Option<Option<i32>>,
    pub is_free_eligible: Option<bool>,
    pub is_active: Option<bool>,
}

impl AdditionalCategory {
    pub fn new(id: i64, store_id: i64, data: &AdditionalCategoryCreate, now: i64) -> Self {
        Self {
            id,
            store_id,
            name: data.name.trim().to_string(),
            sort_order: data.sort_order.unwrap_or(0),
            min_selections: data.min_selections.unwrap_or(0),
            max_selections: data.max_selections,
            is_free_eligible: data.is_free_eligible.unwrap_or(false),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &AdditionalCategoryUpdate, now: i64) {
        if let Some(v) = &update.name {
            self.name = v.clone();
        }
        if let Some(v) = update.sort_order {
            self.sort_order = v;
        }
        if let Some(v) = update.min_selections {
            self.min_selections = v;
        }
        if let Some(v) = update.max_selections {
            self.max_selections = v;
        }
        if let Some(v) = update.is_free_eligible {
            self.is_free_eligible = v;
        }
        if let Some(v) = update.is_active {
            self.is_active = v;
        }
        self.updated_at = now;
    }
}

/// Selection bounds must be non-negative and ordered.
pub fn validate_selection_bounds(min: Option<i32>, max: Option<i32>) -> Result<(), &'static str> {
    if min.is_some_and(|v| v < 0) || max.is_some_and(|v| v < 0) {
        return Err("Selection limits must not be negative");
    }
    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err("min_selections must not exceed max_selections");
    }
    Ok(())
}

/// Additional entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Additional {
    pub id: i64,
    pub store_id: i64,
    pub category_id: i64,
    pub name: String,
    /// Unit price charged when not covered by the free allowance
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create additional payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalCreate {
    pub category_id: i64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub sort_order: Option<i32>,
}

/// Update additional payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalUpdate {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Additional {
    pub fn new(id: i64, store_id: i64, data: &AdditionalCreate, now: i64) -> Self {
        Self {
            id,
            store_id,
            category_id: data.category_id,
            name: data.name.trim().to_string(),
            price: data.price,
            sort_order: data.sort_order.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &AdditionalUpdate, now: i64) {
        if let Some(v) = update.category_id {
            self.category_id = v;
        }
        if let Some(v) = &update.name {
            self.name = v.clone();
        }
        if let Some(v) = update.price {
            self.price = v;
        }
        if let Some(v) = update.sort_order {
            self.sort_order = v;
        }
        if let Some(v) = update.is_active {
            self.is_active = v;
        }
        self.updated_at = now;
    }
}
