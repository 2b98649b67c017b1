//! Additional selection rules
//!
//! For one cart line:
//! 1. Every selected additional exists, is active and belongs to a group the
//!    product offers (and that group is active).
//! 2. Units per group stay within `[min_selections, max_selections]`.
//!    Minimums apply to every offered group, even when nothing was picked.
//! 3. Total units stay within the size's `max_additionals`.
//! 4. The size's `free_additionals` units are given to units from
//!    free-eligible groups, cheapest first. Everything else is charged.

use std::collections::HashMap;

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CartAdditional, MAX_ADDITIONAL_UNITS, PricedAdditional, Product, ProductSize,
};

use super::{Catalog, round_money};

pub fn price_additionals(
    product: &Product,
    size: &ProductSize,
    selections: &[CartAdditional],
    catalog: &Catalog,
) -> Result<Vec<PricedAdditional>, AppError> {
    // Merge repeated picks of the same additional, keeping first-seen order
    // Every unit counts toward MAX_ADDITIONAL_UNITS, so later sums cannot overflow
    let mut merged: Vec<(i64, i32)> = Vec::with_capacity(selections.len());
    let mut line_units: i32 = 0;
    for sel in selections {
        let too_many = || {
            AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("additional_id", sel.additional_id)
                .with_detail("max", MAX_ADDITIONAL_UNITS)
        };
        if sel.quantity < 1 {
            return Err(AppError::new(ErrorCode::InvalidQuantity)
                .with_detail("additional_id", sel.additional_id));
        }
        line_units = line_units
            .checked_add(sel.quantity)
            .filter(|units| *units <= MAX_ADDITIONAL_UNITS)
            .ok_or_else(too_many)?;
        match merged.iter_mut().find(|(id, _)| *id == sel.additional_id) {
            Some((_, qty)) => *qty = qty.checked_add(sel.quantity).ok_or_else(too_many)?,
            None => merged.push((sel.additional_id, sel.quantity)),
        }
    }

    let mut picked = Vec::with_capacity(merged.len());
    let mut units_per_group: HashMap<i64, i32> = HashMap::new();
    for (additional_id, quantity) in merged {
        let additional = catalog
            .additionals
            .get(&additional_id)
            .filter(|a| a.is_active && a.store_id == product.store_id)
            .ok_or_else(|| {
                AppError::new(ErrorCode::AdditionalNotFound)
                    .with_detail("additional_id", additional_id)
            })?;
        let group = catalog
            .additional_categories
            .get(&additional.category_id)
            .filter(|g| g.is_active && product.additional_category_ids.contains(&g.id))
            .ok_or_else(|| {
                AppError::new(ErrorCode::AdditionalNotAllowed)
                    .with_detail("additional_id", additional_id)
                    .with_detail("product_id", product.id)
            })?;
        *units_per_group.entry(group.id).or_default() += quantity;
        picked.push((additional, group.is_free_eligible, quantity));
    }

    for group_id in &product.additional_category_ids {
        let Some(group) = catalog
            .additional_categories
            .get(group_id)
            .filter(|g| g.is_active)
        else {
            continue;
        };
        let units = units_per_group.get(group_id).copied().unwrap_or(0);
        if units < group.min_selections {
            return Err(AppError::with_message(
                ErrorCode::AdditionalSelectionBelowMin,
                format!("Pick at least {} from {}", group.min_selections, group.name),
            )
            .with_detail("additional_category_id", group.id)
            .with_detail("min", group.min_selections));
        }
        if let Some(max) = group.max_selections
            && units > max
        {
            return Err(AppError::with_message(
                ErrorCode::AdditionalSelectionAboveMax,
                format!("Pick at most {max} from {}", group.name),
            )
            .with_detail("additional_category_id", group.id)
            .with_detail("max", max));
        }
    }

    let total_units: i32 = picked.iter().map(|(_, _, q)| *q).sum();
    if let Some(max) = size.max_additionals
        && total_units > max
    {
        return Err(AppError::new(ErrorCode::AdditionalLimitExceeded)
            .with_detail("size", size.name.clone())
            .with_detail("max", max));
    }

    // Free allowance: cheapest eligible units first, ties by id
    let mut free_left = size.free_additionals.max(0);
    let mut free_units = vec![0i32; picked.len()];
    let mut eligible: Vec<usize> = (0..picked.len()).filter(|&i| picked[i].1).collect();
    eligible.sort_by(|&a, &b| {
        picked[a]
            .0
            .price
            .cmp(&picked[b].0.price)
            .then(picked[a].0.id.cmp(&picked[b].0.id))
    });
    for i in eligible {
        if free_left == 0 {
            break;
        }
        let take = picked[i].2.min(free_left);
        free_units[i] = take;
        free_left -= take;
    }

    Ok(picked
        .into_iter()
        .zip(free_units)
        .map(|((additional, _, quantity), free_quantity)| PricedAdditional {
            additional_id: additional.id,
            name: additional.name.clone(),
            category_id: additional.category_id,
            quantity,
            free_quantity,
            unit_price: additional.price,
            charged: round_money(additional.price * Decimal::from(quantity - free_quantity)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Additional, AdditionalCategory};

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn group(id: i64, min: i32, max: Option<i32>, free: bool) -> AdditionalCategory {
        AdditionalCategory {
            id,
            store_id: 1,
            name: format!("group-{id}"),
            sort_order: 0,
            min_selections: min,
            max_selections: max,
            is_free_eligible: free,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn additional(id: i64, category_id: i64, cents: i64) -> Additional {
        Additional {
            id,
            store_id: 1,
            category_id,
            name: format!("additional-{id}"),
            price: money(cents),
            sort_order: 0,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn product(groups: Vec<i64>) -> Product {
        Product {
            id: 100,
            store_id: 1,
            category_id: 1,
            name: "Açaí".into(),
            description: None,
            image_url: None,
            sizes: vec![size(2, Some(5))],
            additional_category_ids: groups,
            sort_order: 0,
            is_active: true,
            is_featured: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn size(free: i32, max: Option<i32>) -> ProductSize {
        ProductSize {
            name: "500ml".into(),
            price: money(2000),
            free_additionals: free,
            max_additionals: max,
        }
    }

    fn pick(id: i64, quantity: i32) -> CartAdditional {
        CartAdditional {
            additional_id: id,
            quantity,
        }
    }

    /// Frutas (10, free-eligible, max 3), Coberturas (20, free-eligible),
    /// Premium (30, paid only)
    fn catalog() -> Catalog {
        Catalog::new(
            1,
            vec![],
            vec![
                group(10, 0, Some(3), true),
                group(20, 0, None, true),
                group(30, 0, None, false),
            ],
            vec![
                additional(1, 10, 200), // banana
                additional(2, 10, 300), // morango
                additional(3, 20, 150), // leite condensado
                additional(4, 30, 800), // nutella
                additional(5, 40, 100), // not offered
            ],
        )
    }

    #[test]
    fn cheapest_eligible_units_are_free() {
        let p = product(vec![10, 20, 30]);
        let priced =
            price_additionals(&p, &size(2, None), &[pick(2, 1), pick(3, 1), pick(1, 1)], &catalog())
                .unwrap();
        // leite condensado (1.50) and banana (2.00) are free, morango charged
        let by_id: HashMap<i64, &PricedAdditional> =
            priced.iter().map(|a| (a.additional_id, a)).collect();
        assert_eq!(by_id[&3].free_quantity, 1);
        assert_eq!(by_id[&1].free_quantity, 1);
        assert_eq!(by_id[&2].free_quantity, 0);
        assert_eq!(by_id[&2].charged, money(300));
        assert_eq!(priced[0].additional_id, 2, "selection order is kept");
    }

    #[test]
    fn paid_only_groups_never_consume_allowance() {
        let p = product(vec![10, 30]);
        let priced =
            price_additionals(&p, &size(2, None), &[pick(4, 1), pick(1, 1)], &catalog()).unwrap();
        assert_eq!(priced[0].free_quantity, 0);
        assert_eq!(priced[0].charged, money(800));
        assert_eq!(priced[1].free_quantity, 1);
        assert_eq!(priced[1].charged, Decimal::ZERO);
    }

    #[test]
    fn allowance_splits_a_multi_unit_pick() {
        let p = product(vec![10]);
        let priced = price_additionals(&p, &size(2, None), &[pick(1, 3)], &catalog()).unwrap();
        assert_eq!(priced[0].free_quantity, 2);
        assert_eq!(priced[0].charged, money(200));
    }

    #[test]
    fn repeated_picks_are_merged() {
        let p = product(vec![10]);
        let priced =
            price_additionals(&p, &size(0, None), &[pick(1, 1), pick(1, 2)], &catalog()).unwrap();
        assert_eq!(priced.len(), 1);
        assert_eq!(priced[0].quantity, 3);
        assert_eq!(priced[0].charged, money(600));
    }

    #[test]
    fn group_maximum_enforced() {
        let p = product(vec![10]);
        let err = price_additionals(&p, &size(0, None), &[pick(1, 2), pick(2, 2)], &catalog())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalSelectionAboveMax);
    }

    #[test]
    fn group_minimum_enforced_even_when_empty() {
        let mut cat = catalog();
        cat.additional_categories.insert(10, group(10, 1, Some(3), true));
        let p = product(vec![10]);
        let err = price_additionals(&p, &size(0, None), &[], &cat).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalSelectionBelowMin);
    }

    #[test]
    fn size_cap_enforced() {
        let p = product(vec![10, 20]);
        let err = price_additionals(&p, &size(0, Some(2)), &[pick(1, 2), pick(3, 1)], &catalog())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalLimitExceeded);
    }

    #[test]
    fn unknown_or_disallowed_additionals_rejected() {
        let p = product(vec![10]);
        let err = price_additionals(&p, &size(0, None), &[pick(99, 1)], &catalog()).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalNotFound);

        let err = price_additionals(&p, &size(0, None), &[pick(5, 1)], &catalog()).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalNotAllowed);

        let err = price_additionals(&p, &size(0, None), &[pick(3, 1)], &catalog()).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalNotAllowed);
    }

    #[test]
    fn inactive_additional_rejected() {
        let mut cat = catalog();
        if let Some(a) = cat.additionals.get_mut(&1) {
            a.is_active = false;
        }
        let p = product(vec![10]);
        let err = price_additionals(&p, &size(0, None), &[pick(1, 1)], &cat).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdditionalNotFound);
    }

    #[test]
    fn oversized_quantities_rejected_without_overflow() {
        let p = product(vec![10, 20]);
        let err = price_additionals(
            &p,
            &size(0, None),
            &[pick(1, i32::MAX), pick(1, 2), pick(3, i32::MAX)],
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);

        let err = price_additionals(
            &p,
            &size(0, None),
            &[pick(3, MAX_ADDITIONAL_UNITS), pick(3, 1)],
            &catalog(),
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);

        let priced =
            price_additionals(&p, &size(0, None), &[pick(3, MAX_ADDITIONAL_UNITS)], &catalog())
                .unwrap();
        assert!(priced[0].charged > Decimal::ZERO);
    }

    #[test]
    fn zero_quantity_rejected() {
        let p = product(vec![10]);
        let err = price_additionals(&p, &size(0, None), &[pick(1, 0)], &catalog()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidQuantity);
    }
}
