//! Order Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::cart::PricedLine;

/// Kitchen/fulfillment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "confirmed" => Some(Self::Confirmed),
            "preparing" => Some(Self::Preparing),
            "ready" => Some(Self::Ready),
            "out_for_delivery" => Some(Self::OutForDelivery),
            "delivered" => Some(Self::Delivered),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Forward-only workflow; cancellation is allowed from any open state.
    /// `OutForDelivery` only exists for delivery orders.
    pub fn can_transition_to(&self, next: OrderStatus, fulfillment: Fulfillment) -> bool {
        use OrderStatus::*;
        if self.is_final() || *self == next {
            return false;
        }
        match (self, next) {
            (_, Cancelled) => true,
            (Pending, Confirmed) => true,
            (Confirmed, Preparing) => true,
            (Preparing, Ready) => true,
            (Ready, OutForDelivery) => fulfillment == Fulfillment::Delivery,
            (Ready, Delivered) => true,
            (OutForDelivery, Delivered) => true,
            _ => false,
        }
    }
}

/// Payment status as tracked locally, mirrored from the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
}

impl PaymentStatus {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::ChargedBack => "charged_back",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            "charged_back" => Some(Self::ChargedBack),
            _ => None,
        }
    }

    /// `pending` can resolve to anything; `approved` can only be reversed.
    /// Everything else is final.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        match (self, next) {
            (a, b) if *a == b => false,
            (Pending, _) => true,
            (Approved, Refunded | ChargedBack) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fulfillment {
    Delivery,
    Pickup,
}

impl Fulfillment {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "delivery" => Some(Self::Delivery),
            "pickup" => Some(Self::Pickup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant payment through the gateway (QR code)
    Pix,
    /// Card machine on delivery/pickup
    Card,
    Cash,
}

impl PaymentMethod {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pix => "pix",
            Self::Card => "card",
            Self::Cash => "cash",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pix" => Some(Self::Pix),
            "card" => Some(Self::Card),
            "cash" => Some(Self::Cash),
            _ => None,
        }
    }

    /// Paid through the gateway rather than at the counter
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Pix)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub store_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub fulfillment: Fulfillment,
    pub address: Option<String>,
    pub payment_method: PaymentMethod,
    /// Cash orders: amount the customer will pay with
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub change_for: Option<Decimal>,
    pub items: Vec<PricedLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    /// Gateway payment reference
    pub payment_id: Option<String>,
    pub payment_status_detail: Option<String>,
    pub payment_qr_code: Option<String>,
    pub payment_qr_code_base64: Option<String>,
    pub payment_ticket_url: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Gateway-derived payment fields written onto an order
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub payment_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_status_detail: Option<String>,
    pub payment_qr_code: Option<String>,
    pub payment_qr_code_base64: Option<String>,
    pub payment_ticket_url: Option<String>,
}

impl Order {
    pub fn apply_payment(&mut self, update: &PaymentUpdate, now: i64) {
        if update.payment_id.is_some() {
            self.payment_id = update.payment_id.clone();
        }
        if let Some(s) = update.payment_status {
            self.payment_status = s;
        }
        if update.payment_status_detail.is_some() {
            self.payment_status_detail = update.payment_status_detail.clone();
        }
        if update.payment_qr_code.is_some() {
            self.payment_qr_code = update.payment_qr_code.clone();
        }
        if update.payment_qr_code_base64.is_some() {
            self.payment_qr_code_base64 = update.payment_qr_code_base64.clone();
        }
        if update.payment_ticket_url.is_some() {
            self.payment_ticket_url = update.payment_ticket_url.clone();
        }
        self.updated_at = now;
    }
}

/// Order listing filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on `created_at` (ms)
    pub from: Option<i64>,
    /// Exclusive upper bound on `created_at` (ms)
    pub to: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}
