//! Cart pricing
//!
//! Totals are always computed here from the stored catalog, never taken
//! from the client. Money uses `rust_decimal` and is rounded to cents with
//! half-up rounding.

mod additionals;
mod cart;

pub use additionals::*;
pub use cart::*;

use std::collections::HashMap;

use rust_decimal::prelude::*;
use shared::models::{Additional, AdditionalCategory, Product};

use crate::BoxError;
use crate::persistence::ShopStore;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Store catalog indexed by id, loaded once per quote/checkout
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub store_id: i64,
    pub products: HashMap<i64, Product>,
    pub additional_categories: HashMap<i64, AdditionalCategory>,
    pub additionals: HashMap<i64, Additional>,
}

impl Catalog {
    pub fn new(
        store_id: i64,
        products: Vec<Product>,
        additional_categories: Vec<AdditionalCategory>,
        additionals: Vec<Additional>,
    ) -> Self {
        Self {
            store_id,
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            additional_categories: additional_categories
                .into_iter()
                .map(|c| (c.id, c))
                .collect(),
            additionals: additionals.into_iter().map(|a| (a.id, a)).collect(),
        }
    }

    pub async fn load(store: &dyn ShopStore, store_id: i64) -> Result<Self, BoxError> {
        let products = store.list_products(store_id).await?;
        let additional_categories = store.list_additional_categories(store_id).await?;
        let additionals = store.list_additionals(store_id).await?;
        Ok(Self::new(store_id, products, additional_categories, additionals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_money(Decimal::new(12344, 3)), Decimal::new(1234, 2));
        assert_eq!(round_money(Decimal::new(-5, 3)), Decimal::new(-1, 2));
    }
}
