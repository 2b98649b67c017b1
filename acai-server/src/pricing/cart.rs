//! Cart quote

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CartItem, CartQuote, Fulfillment, MAX_LINE_QUANTITY, PricedLine, StoreConfig,
};

use super::{Catalog, price_additionals, round_money};

/// Longest accepted line note
pub const MAX_NOTE_LEN: usize = 280;

/// Price a cart against the catalog and store config.
///
/// line = (size price + charged additionals) × quantity. The delivery fee is
/// only added for delivery orders; the minimum order value is checked
/// against the subtotal.
pub fn quote_cart(
    items: &[CartItem],
    fulfillment: Fulfillment,
    config: &StoreConfig,
    catalog: &Catalog,
) -> Result<CartQuote, AppError> {
    if items.is_empty() {
        return Err(AppError::new(ErrorCode::CartEmpty));
    }

    let mut lines = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        lines.push(price_line(item, catalog).map_err(|e| e.with_detail("line", index as u64))?);
    }

    let subtotal = round_money(lines.iter().map(|l| l.line_total).sum::<Decimal>());
    let delivery_fee = match fulfillment {
        Fulfillment::Delivery => round_money(config.delivery_fee),
        Fulfillment::Pickup => Decimal::ZERO,
    };

    Ok(CartQuote {
        lines,
        subtotal,
        delivery_fee,
        total: subtotal + delivery_fee,
        min_order_value: config.min_order_value,
        meets_minimum: subtotal >= config.min_order_value,
    })
}

fn price_line(item: &CartItem, catalog: &Catalog) -> Result<PricedLine, AppError> {
    if !(1..=MAX_LINE_QUANTITY).contains(&item.quantity) {
        return Err(AppError::new(ErrorCode::InvalidQuantity)
            .with_detail("product_id", item.product_id)
            .with_detail("max", MAX_LINE_QUANTITY));
    }

    let product = catalog
        .products
        .get(&item.product_id)
        .filter(|p| p.store_id == catalog.store_id)
        .ok_or_else(|| {
            AppError::new(ErrorCode::ProductNotFound).with_detail("product_id", item.product_id)
        })?;
    if !product.is_active {
        return Err(
            AppError::new(ErrorCode::ProductUnavailable).with_detail("product_id", product.id)
        );
    }
    let size = product.size(&item.size).ok_or_else(|| {
        AppError::new(ErrorCode::SizeNotFound)
            .with_detail("product_id", product.id)
            .with_detail("size", item.size.clone())
    })?;

    let additionals = price_additionals(product, size, &item.additionals, catalog)?;
    let unit_price =
        round_money(size.price + additionals.iter().map(|a| a.charged).sum::<Decimal>());
    let line_total = round_money(unit_price * Decimal::from(item.quantity));

    let notes = item
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(MAX_NOTE_LEN).collect::<String>());

    Ok(PricedLine {
        product_id: product.id,
        product_name: product.name.clone(),
        size: size.name.clone(),
        size_price: size.price,
        additionals,
        unit_price,
        quantity: item.quantity,
        line_total,
        notes,
    })
}
