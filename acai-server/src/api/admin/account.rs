use axum::{Extension, Json, extract::State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::Store;

use crate::api::{ApiResult, internal};
use crate::auth::AdminIdentity;
use crate::state::AppState;

#[derive(Serialize)]
pub struct MeResponse {
    pub store: Store,
    pub unread_notifications: i64,
}

/// GET /api/admin/me
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<MeResponse> {
    let store = state
        .store
        .find_store_by_id(identity.store_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound))?;
    let unread_notifications = state
        .store
        .unread_notification_count(identity.store_id)
        .await
        .map_err(internal)?;
    Ok(Json(MeResponse {
        store,
        unread_notifications,
    }))
}
