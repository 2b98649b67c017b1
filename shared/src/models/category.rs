//! Category Model

use serde::{Deserialize, Serialize};

/// Product category entity (e.g. "Açaí", "Sorvetes")
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub store_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

/// Update category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    #[serde(
        default,
        with = "super::double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Category {
    /// Build a new active category from a create payload
    pub fn new(id: i64, store_id: i64, data: &CategoryCreate, now: i64) -> Self {
        Self {
            id,
            store_id,
            name: data.name.trim().to_string(),
            description: data.description.clone(),
            sort_order: data.sort_order.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &CategoryUpdate, now: i64) {
        if let Some(v) = &update.name {
            self.name = v.clone();
        }
        if let Some(v) = &update.description {
            self.description = v.clone();
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
