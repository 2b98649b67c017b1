//! Payment gateway webhook
//!
//! POST /webhooks/payments - signature-verified payment notifications.
//!
//! The notification only carries the payment id; the current status is
//! always fetched from the gateway before anything is written. Replays are
//! harmless because status writes are compare-and-set.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use shared::error::{AppError, ErrorCode};

use crate::payment::verify_webhook_signature;
use crate::reconcile::apply_payment_status;
use crate::state::AppState;

/// Payment id from `?data.id=` or the JSON body's `data.id`
fn extract_data_id(query: &HashMap<String, String>, body: &serde_json::Value) -> Option<String> {
    if let Some(id) = query.get("data.id").filter(|s| !s.is_empty()) {
        return Some(id.clone());
    }
    match &body["data"]["id"] {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Notification topic; only `payment` events are handled
fn extract_topic<'a>(query: &'a HashMap<String, String>, body: &'a serde_json::Value) -> &'a str {
    query
        .get("type")
        .or_else(|| query.get("topic"))
        .map(String::as_str)
        .or_else(|| body["type"].as_str())
        .unwrap_or("")
}

pub async fn handle_webhook(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let event: serde_json::Value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(%e, "Failed to parse webhook JSON");
                return Ok(StatusCode::BAD_REQUEST);
            }
        }
    };

    let Some(data_id) = extract_data_id(&query, &event) else {
        tracing::warn!("Webhook without data.id");
        return Ok(StatusCode::BAD_REQUEST);
    };

    let sig_header = headers
        .get("x-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let request_id = headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if let Err(e) =
        verify_webhook_signature(sig_header, request_id, &data_id, &state.payment_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return Err(AppError::new(ErrorCode::WebhookSignatureInvalid));
    }

    let topic = extract_topic(&query, &event);
    if topic != "payment" {
        tracing::debug!(topic, "Ignoring non-payment webhook");
        return Ok(StatusCode::OK);
    }

    let Some(gateway) = state.gateway.as_ref() else {
        tracing::warn!(payment_id = %data_id, "Payment webhook received while gateway is disabled");
        return Ok(StatusCode::SERVICE_UNAVAILABLE);
    };

    let order = match state.store.find_order_by_payment_id(&data_id).await {
        Ok(Some(o)) => o,
        Ok(None) => {
            tracing::info!(payment_id = %data_id, "Webhook for unknown payment, skipping");
            return Ok(StatusCode::OK);
        }
        Err(e) => {
            tracing::error!(payment_id = %data_id, error = %e, "Order lookup failed");
            return Ok(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let payment = match gateway.get_payment(&data_id).await {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(payment_id = %data_id, error = %e, "Payment lookup failed");
            // Non-2xx makes the gateway retry
            return Ok(StatusCode::BAD_GATEWAY);
        }
    };

    match apply_payment_status(state.store.as_ref(), &state.notifier, &order, &payment).await {
        Ok(Some(updated)) => {
            tracing::info!(
                order_id = %updated.id,
                payment_status = updated.payment_status.as_db(),
                "Webhook applied payment status"
            );
            Ok(StatusCode::OK)
        }
        Ok(None) => Ok(StatusCode::OK),
        Err(e) => {
            tracing::error!(order_id = %order.id, error = %e, "Failed to apply webhook payment");
            Ok(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
