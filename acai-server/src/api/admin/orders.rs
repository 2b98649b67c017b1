//! Order management
//!
//! GET /api/admin/orders - filtered, paginated, newest first
//! GET /api/admin/orders/{id} - order detail
//! PUT /api/admin/orders/{id}/status - workflow transition
//! POST /api/admin/payments/reconcile - check this store's pending payments now

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Order, OrderFilter, OrderStatus};
use shared::util::now_millis;
use uuid::Uuid;

use crate::api::{ApiResult, internal};
use crate::auth::AdminIdentity;
use crate::reconcile::{ReconcileError, ReconcileSummary};
use crate::state::AppState;

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound (Unix millis)
    pub from: Option<i64>,
    /// Exclusive upper bound (Unix millis)
    pub to: Option<i64>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Serialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

impl OrderQuery {
    fn to_filter(&self) -> (OrderFilter, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let filter = OrderFilter {
            status: self.status,
            from: self.from,
            to: self.to,
            limit: per_page,
            offset: (page - 1).saturating_mul(per_page),
        };
        (filter, page, per_page)
    }
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<OrderPage> {
    let (filter, page, per_page) = query.to_filter();
    let orders = state
        .store
        .list_orders(identity.store_id, &filter)
        .await
        .map_err(internal)?;
    Ok(Json(OrderPage {
        orders,
        page,
        per_page,
    }))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Order> {
    let order = state
        .store
        .get_order(identity.store_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;
    Ok(Json(order))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> ApiResult<Order> {
    let order = state
        .store
        .get_order(identity.store_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    if order.status.is_final() {
        return Err(AppError::new(ErrorCode::OrderAlreadyFinal)
            .with_detail("status", order.status.as_db()));
    }
    if !order.status.can_transition_to(req.status, order.fulfillment) {
        return Err(AppError::new(ErrorCode::InvalidStatusTransition)
            .with_detail("from", order.status.as_db())
            .with_detail("to", req.status.as_db()));
    }

    let updated = state
        .store
        .update_order_status(identity.store_id, id, order.status, req.status, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                "Order was changed by another request",
            )
            .with_detail("from", order.status.as_db())
        })?;

    tracing::info!(
        order_id = %id,
        from = order.status.as_db(),
        to = updated.status.as_db(),
        "Order status updated"
    );
    Ok(Json(updated))
}

pub async fn reconcile_payments(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<ReconcileSummary> {
    tracing::info!(store_id = identity.store_id, "Manual payment reconciliation requested");
    match state.reconciler.run_for_store(identity.store_id).await {
        Ok(summary) => Ok(Json(summary)),
        Err(ReconcileError::AlreadyRunning) => Err(AppError::new(ErrorCode::ReconcileInProgress)),
        Err(ReconcileError::GatewayDisabled) => {
            Err(AppError::new(ErrorCode::PaymentGatewayUnavailable))
        }
        Err(ReconcileError::Store(e)) => Err(internal(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let q = OrderQuery {
            status: None,
            from: None,
            to: None,
            page: Some(0),
            per_page: Some(1000),
        };
        let (filter, page, per_page) = q.to_filter();
        assert_eq!(page, 1);
        assert_eq!(per_page, MAX_PER_PAGE);
        assert_eq!(filter.offset, 0);

        let q = OrderQuery {
            status: Some(OrderStatus::Ready),
            from: Some(10),
            to: Some(20),
            page: Some(3),
            per_page: None,
        };
        let (filter, _, _) = q.to_filter();
        assert_eq!(filter.limit, DEFAULT_PER_PAGE);
        assert_eq!(filter.offset, 40);
        assert_eq!(filter.status, Some(OrderStatus::Ready));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let q = OrderQuery {
            status: None,
            from: None,
            to: None,
            page: Some(i64::MAX),
            per_page: Some(20),
        };
        let (filter, page, _) = q.to_filter();
        assert_eq!(page, i64::MAX);
        assert_eq!(filter.offset, i64::MAX);
    }
}
