//! Admin dashboard aggregates, computed from the order list

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Serialize;
use shared::models::{Order, OrderStatus, PaymentMethod, PaymentStatus};

use crate::pricing::round_money;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    pub from: i64,
    pub to: i64,
    pub order_count: usize,
    /// Order counts keyed by status
    pub by_status: BTreeMap<&'static str, usize>,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    /// Revenue / revenue orders
    #[serde(with = "rust_decimal::serde::float")]
    pub average_ticket: Decimal,
    pub pending_payments: usize,
    pub top_products: Vec<TopProduct>,
}

/// Revenue counts an order once money is secured: online payments when
/// approved, counter payments once delivered.
fn counts_as_revenue(order: &Order) -> bool {
    if order.status == OrderStatus::Cancelled {
        return false;
    }
    match order.payment_method {
        PaymentMethod::Pix => order.payment_status == PaymentStatus::Approved,
        PaymentMethod::Card | PaymentMethod::Cash => order.status == OrderStatus::Delivered,
    }
}

pub fn summarize(orders: &[Order], from: i64, to: i64) -> DashboardSummary {
    let in_range: Vec<&Order> = orders
        .iter()
        .filter(|o| o.created_at >= from && o.created_at < to)
        .collect();

    let mut by_status = BTreeMap::new();
    for o in &in_range {
        *by_status.entry(o.status.as_db()).or_insert(0) += 1;
    }

    let revenue_orders: Vec<&&Order> = in_range.iter().filter(|o| counts_as_revenue(o)).collect();
    let revenue = round_money(revenue_orders.iter().map(|o| o.total).sum::<Decimal>());
    let average_ticket = if revenue_orders.is_empty() {
        Decimal::ZERO
    } else {
        round_money(revenue / Decimal::from(revenue_orders.len()))
    };

    let mut products: HashMap<i64, TopProduct> = HashMap::new();
    for o in &revenue_orders {
        for line in &o.items {
            let entry = products.entry(line.product_id).or_insert_with(|| TopProduct {
                product_id: line.product_id,
                name: line.product_name.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            entry.quantity += i64::from(line.quantity);
            entry.revenue += line.line_total;
        }
    }
    let mut top_products: Vec<TopProduct> = products.into_values().collect();
    top_products.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(b.revenue.cmp(&a.revenue))
            .then(a.product_id.cmp(&b.product_id))
    });
    top_products.truncate(5);

    DashboardSummary {
        from,
        to,
        order_count: in_range.len(),
        by_status,
        revenue,
        average_ticket,
        pending_payments: in_range
            .iter()
            .filter(|o| {
                o.payment_method.is_online()
                    && o.payment_status == PaymentStatus::Pending
                    && o.status != OrderStatus::Cancelled
            })
            .count(),
        top_products,
    }
}
