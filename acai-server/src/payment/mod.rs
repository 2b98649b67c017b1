//! Payment gateway integration via REST API (no SDK dependency)
//!
//! Online payments are Pix charges: the gateway returns a QR code the
//! customer pays from their bank app, then reports the outcome through a
//! signed webhook. The reconciler polls the same lookup endpoint for orders
//! whose webhook never arrived.

mod mercadopago;

pub use mercadopago::MercadoPagoGateway;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::Sha256;
use shared::models::PaymentStatus;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

/// Pix charge for one order
#[derive(Debug, Clone)]
pub struct PixPaymentRequest {
    pub order_id: Uuid,
    pub amount: Decimal,
    pub description: String,
    pub payer_email: String,
    pub payer_name: String,
    pub notification_url: Option<String>,
}

/// Gateway view of a payment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayPayment {
    pub id: String,
    pub status: PaymentStatus,
    /// Raw gateway status before mapping
    pub raw_status: String,
    pub status_detail: Option<String>,
    /// Our order id, echoed back by the gateway
    pub external_reference: Option<String>,
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_pix_payment(
        &self,
        request: &PixPaymentRequest,
    ) -> Result<GatewayPayment, GatewayError>;

    async fn get_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

/// Map a gateway status string onto the local payment status.
///
/// In-flight states collapse into `Pending`; anything unknown is treated as
/// still pending so it gets polled again.
pub fn map_status(status: &str) -> PaymentStatus {
    match status {
        "approved" => PaymentStatus::Approved,
        "rejected" => PaymentStatus::Rejected,
        "cancelled" => PaymentStatus::Cancelled,
        "refunded" => PaymentStatus::Refunded,
        "charged_back" => PaymentStatus::ChargedBack,
        "pending" | "in_process" | "authorized" | "in_mediation" => PaymentStatus::Pending,
        other => {
            tracing::warn!(status = other, "Unknown gateway payment status, treating as pending");
            PaymentStatus::Pending
        }
    }
}

/// Verify a payment webhook signature (HMAC-SHA256)
///
/// Header format: `x-signature: ts=<unix>,v1=<hex>`. The signed manifest is
/// `id:{data.id};request-id:{x-request-id};ts:{ts};`.
pub fn verify_webhook_signature(
    sig_header: &str,
    request_id: &str,
    data_id: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        let part = part.trim();
        if let Some(t) = part.strip_prefix("ts=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("Invalid x-signature header");
    }

    // Alphanumeric ids are signed lowercase
    let data_id = data_id.to_ascii_lowercase();
    let manifest = format!("id:{data_id};request-id:{request_id};ts:{timestamp};");
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(manifest.as_bytes());

    // Constant-time comparison via hmac::verify_slice
    let sig_bytes = hex::decode(signature).map_err(|_| "Invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "Webhook signature mismatch")?;

    Ok(())
}

/// Build an `x-signature` header value. Used by tests and local tooling.
pub fn sign_webhook(request_id: &str, data_id: &str, ts: i64, secret: &str) -> String {
    let manifest = format!(
        "id:{};request-id:{request_id};ts:{ts};",
        data_id.to_ascii_lowercase()
    );
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(manifest.as_bytes());
    format!("ts={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
}
