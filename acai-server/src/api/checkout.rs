//! POST /api/shops/{slug}/checkout
//!
//! Re-prices the cart from the catalog, stores the order, creates the Pix
//! charge for online payments and notifies the store.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CartItem, Fulfillment, NotificationKind, Order, OrderStatus, PaymentMethod, PaymentStatus,
    PaymentUpdate, Store, StoreConfig,
};
use shared::util::now_millis;
use uuid::Uuid;
use validator::Validate;

use crate::payment::{GatewayPayment, PixPaymentRequest};
use crate::pricing::{Catalog, MAX_NOTE_LEN, quote_cart};
use crate::reconcile::{apply_payment_status, short_order_id};
use crate::state::AppState;

use super::{ApiResult, internal, invalid, load_config, resolve_shop};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 2, max = 80))]
    pub customer_name: String,
    #[validate(length(min = 8, max = 20))]
    pub customer_phone: String,
    #[validate(email)]
    pub customer_email: Option<String>,
    pub fulfillment: Fulfillment,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub change_for: Option<Decimal>,
    #[validate(length(max = 280))]
    pub notes: Option<String>,
    pub items: Vec<CartItem>,
}

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub order: Order,
    /// Payment was requested but is still awaiting the customer
    pub awaiting_payment: bool,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Store-side checks that do not depend on the cart contents
fn check_acceptance(config: &StoreConfig, req: &CheckoutRequest) -> Result<(), AppError> {
    if !config.is_open_at(chrono::Utc::now()) {
        return Err(AppError::new(ErrorCode::StoreClosed));
    }
    let accepted = match req.fulfillment {
        Fulfillment::Delivery => config.accepts_delivery,
        Fulfillment::Pickup => config.accepts_pickup,
    };
    if !accepted {
        return Err(AppError::new(ErrorCode::FulfillmentNotAccepted)
            .with_detail("fulfillment", req.fulfillment.as_db()));
    }
    if req.fulfillment == Fulfillment::Delivery && non_empty(req.address.as_ref()).is_none() {
        return Err(AppError::new(ErrorCode::DeliveryAddressRequired));
    }
    Ok(())
}

pub async fn checkout(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    req.validate().map_err(invalid)?;
    if req
        .items
        .iter()
        .any(|i| i.notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTE_LEN))
    {
        return Err(AppError::validation("Item note too long")
            .with_detail("max_length", MAX_NOTE_LEN as u64));
    }

    let store = resolve_shop(&state, &slug).await?;
    let config = load_config(&state, &store).await?;
    check_acceptance(&config, &req)?;

    if req.payment_method.is_online() && state.gateway.is_none() {
        return Err(AppError::new(ErrorCode::PaymentGatewayUnavailable));
    }

    let catalog = Catalog::load(state.store.as_ref(), store.id)
        .await
        .map_err(internal)?;
    let quote = quote_cart(&req.items, req.fulfillment, &config, &catalog)?;
    if !quote.meets_minimum {
        return Err(AppError::new(ErrorCode::MinimumOrderNotMet)
            .with_detail("min_order_value", quote.min_order_value.to_string())
            .with_detail("subtotal", quote.subtotal.to_string()));
    }

    let change_for = match req.payment_method {
        PaymentMethod::Cash => req.change_for,
        _ => None,
    };
    if let Some(change) = change_for
        && change < quote.total
    {
        return Err(AppError::validation("Change amount is below the order total")
            .with_detail("field", "change_for"));
    }

    let now = now_millis();
    let order = Order {
        id: Uuid::new_v4(),
        store_id: store.id,
        customer_name: req.customer_name.trim().to_string(),
        customer_phone: req.customer_phone.trim().to_string(),
        customer_email: non_empty(req.customer_email.as_ref()).map(|e| e.to_lowercase()),
        fulfillment: req.fulfillment,
        address: match req.fulfillment {
            Fulfillment::Delivery => non_empty(req.address.as_ref()),
            Fulfillment::Pickup => None,
        },
        payment_method: req.payment_method,
        change_for,
        items: quote.lines,
        subtotal: quote.subtotal,
        delivery_fee: quote.delivery_fee,
        total: quote.total,
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_id: None,
        payment_status_detail: None,
        payment_qr_code: None,
        payment_qr_code_base64: None,
        payment_ticket_url: None,
        notes: non_empty(req.notes.as_ref()),
        created_at: now,
        updated_at: now,
    };
    state.store.insert_order(&order).await.map_err(internal)?;
    tracing::info!(
        order_id = %order.id,
        store_id = store.id,
        total = %order.total,
        method = order.payment_method.as_db(),
        "Order created"
    );

    let order = if order.payment_method.is_online() {
        start_pix_payment(&state, &store, order).await?
    } else {
        order
    };

    state
        .notifier
        .notify(
            store.id,
            NotificationKind::NewOrder,
            &format!("Novo pedido {}", short_order_id(&order)),
            &format!(
                "{} · R$ {} · {}",
                order.customer_name,
                order.total,
                order.payment_method.as_db()
            ),
            Some(order.id),
        )
        .await;

    Ok(Json(CheckoutResponse {
        awaiting_payment: order.payment_method.is_online()
            && order.payment_status == PaymentStatus::Pending,
        order,
    }))
}

/// Create the Pix charge and attach its reference/QR to the order.
///
/// A gateway failure cancels the order so it never lingers unpaid.
async fn start_pix_payment(
    state: &AppState,
    store: &Store,
    order: Order,
) -> Result<Order, AppError> {
    let Some(gateway) = state.gateway.as_ref() else {
        return Err(AppError::new(ErrorCode::PaymentGatewayUnavailable));
    };

    let request = PixPaymentRequest {
        order_id: order.id,
        amount: order.total,
        description: format!("Pedido {} - {}", short_order_id(&order), store.name),
        payer_email: order
            .customer_email
            .clone()
            .unwrap_or_else(|| store.email.clone()),
        payer_name: order.customer_name.clone(),
        notification_url: state.payment_notification_url.clone(),
    };

    let payment = match gateway.create_pix_payment(&request).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(order_id = %order.id, error = %e, "Pix payment creation failed");
            cancel_unpaid(state, &order).await;
            return Err(AppError::new(ErrorCode::PaymentGatewayError));
        }
    };

    let now = now_millis();
    let update = reference_update(&payment);
    let with_reference = state
        .store
        .apply_payment_update(order.id, PaymentStatus::Pending, &update, now)
        .await
        .map_err(internal)?
        .unwrap_or_else(|| {
            let mut o = order.clone();
            o.apply_payment(&update, now);
            o
        });

    if payment.status == PaymentStatus::Pending {
        return Ok(with_reference);
    }
    let applied = apply_payment_status(
        state.store.as_ref(),
        &state.notifier,
        &with_reference,
        &payment,
    )
    .await
    .map_err(internal)?;
    Ok(applied.unwrap_or(with_reference))
}

fn reference_update(payment: &GatewayPayment) -> PaymentUpdate {
    PaymentUpdate {
        payment_id: Some(payment.id.clone()),
        payment_status: None,
        payment_status_detail: payment.status_detail.clone(),
        payment_qr_code: payment.qr_code.clone(),
        payment_qr_code_base64: payment.qr_code_base64.clone(),
        payment_ticket_url: payment.ticket_url.clone(),
    }
}

async fn cancel_unpaid(state: &AppState, order: &Order) {
    let now = now_millis();
    let update = PaymentUpdate {
        payment_status: Some(PaymentStatus::Cancelled),
        payment_status_detail: Some("gateway_error".into()),
        ..Default::default()
    };
    if let Err(e) = state
        .store
        .apply_payment_update(order.id, PaymentStatus::Pending, &update, now)
        .await
    {
        tracing::error!(order_id = %order.id, error = %e, "Failed to mark payment cancelled");
    }
    if let Err(e) = state
        .store
        .update_order_status(
            order.store_id,
            order.id,
            OrderStatus::Pending,
            OrderStatus::Cancelled,
            now,
        )
        .await
    {
        tracing::error!(order_id = %order.id, error = %e, "Failed to cancel order");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(fulfillment: Fulfillment, address: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Ana".into(),
            customer_phone: "11999990000".into(),
            customer_email: None,
            fulfillment,
            address: address.map(String::from),
            payment_method: PaymentMethod::Cash,
            change_for: None,
            notes: None,
            items: vec![],
        }
    }

    fn open_config() -> StoreConfig {
        let mut config = StoreConfig::default_for(1, "Loja", 0);
        config.open_override = Some(true);
        config
    }

    #[test]
    fn closed_store_rejected() {
        let mut config = open_config();
        config.open_override = Some(false);
        let err = check_acceptance(&config, &request(Fulfillment::Pickup, None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreClosed);
    }

    #[test]
    fn delivery_needs_address_and_acceptance() {
        let config = open_config();
        let err = check_acceptance(&config, &request(Fulfillment::Delivery, Some("  ")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DeliveryAddressRequired);
        assert!(
            check_acceptance(&config, &request(Fulfillment::Delivery, Some("Rua A, 1"))).is_ok()
        );

        let mut pickup_only = open_config();
        pickup_only.accepts_delivery = false;
        let err = check_acceptance(&pickup_only, &request(Fulfillment::Delivery, Some("Rua A")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FulfillmentNotAccepted);
    }

    #[test]
    fn no_opening_hours_means_closed() {
        let mut config = open_config();
        config.open_override = None;
        config.opening_hours = vec![];
        let err = check_acceptance(&config, &request(Fulfillment::Pickup, None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreClosed);
    }

    #[test]
    fn validator_flags_bad_fields() {
        let mut req = request(Fulfillment::Pickup, None);
        req.customer_name = "A".into();
        req.customer_email = Some("not-an-email".into());
        let err = invalid(req.validate().unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert!(err.message.contains("customer_email"));
        assert!(err.message.contains("customer_name"));
    }
}
