//! Cart Model
//!
//! The cart itself lives on the client; the server only receives its items
//! for quoting and checkout and answers with priced lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum quantity of one line
pub const MAX_LINE_QUANTITY: i32 = 50;

/// Maximum units of additionals on one line, across all picks
pub const MAX_ADDITIONAL_UNITS: i32 = 50;

/// Selected additional on a cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartAdditional {
    pub additional_id: i64,
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

/// Cart line as sent by the storefront
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    /// Size name, must match one of the product's sizes
    pub size: String,
    pub quantity: i32,
    #[serde(default)]
    pub additionals: Vec<CartAdditional>,
    pub notes: Option<String>,
}

/// Priced additional inside a line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedAdditional {
    pub additional_id: i64,
    pub name: String,
    pub category_id: i64,
    pub quantity: i32,
    /// Units covered by the size's free allowance
    pub free_quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// (quantity - free_quantity) * unit_price
    #[serde(with = "rust_decimal::serde::float")]
    pub charged: Decimal,
}

/// Fully priced line. Stored verbatim on orders as a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: i64,
    pub product_name: String,
    pub size: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub size_price: Decimal,
    pub additionals: Vec<PricedAdditional>,
    /// size price + charged additionals, for one unit
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
    pub notes: Option<String>,
}

/// Cart pricing answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartQuote {
    pub lines: Vec<PricedLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub min_order_value: Decimal,
    pub meets_minimum: bool,
}
