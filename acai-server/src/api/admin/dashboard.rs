use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::error::AppError;
use shared::models::OrderFilter;
use shared::util::now_millis;

use crate::api::{ApiResult, internal};
use crate::auth::AdminIdentity;
use crate::dashboard::{DashboardSummary, summarize};
use crate::state::AppState;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
/// Upper bound on orders scanned for one summary
const MAX_ORDERS: i64 = 10_000;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Inclusive (Unix millis); defaults to 30 days before `to`
    pub from: Option<i64>,
    /// Exclusive (Unix millis); defaults to now
    pub to: Option<i64>,
}

/// GET /api/admin/dashboard?from=&to=
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<DashboardSummary> {
    let to = query.to.unwrap_or_else(now_millis);
    let from = query.from.unwrap_or(to - 30 * DAY_MS);
    if from >= to {
        return Err(AppError::validation("`from` must be before `to`"));
    }

    let orders = state
        .store
        .list_orders(
            identity.store_id,
            &OrderFilter {
                from: Some(from),
                to: Some(to),
                limit: MAX_ORDERS,
                ..Default::default()
            },
        )
        .await
        .map_err(internal)?;
    Ok(Json(summarize(&orders, from, to)))
}
