//! Notifications and push subscriptions

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Notification, PushSubscription, PushSubscriptionCreate};
use shared::util::now_millis;

use crate::api::{ApiResult, internal};
use crate::auth::AdminIdentity;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread_count: i64,
}

#[derive(Deserialize)]
pub struct Unsubscribe {
    pub endpoint: String,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Query(query): Query<NotificationQuery>,
) -> ApiResult<NotificationList> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let notifications = state
        .store
        .list_notifications(identity.store_id, query.unread, limit)
        .await
        .map_err(internal)?;
    let unread_count = state
        .store
        .unread_notification_count(identity.store_id)
        .await
        .map_err(internal)?;
    Ok(Json(NotificationList {
        notifications,
        unread_count,
    }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let found = state
        .store
        .mark_notification_read(identity.store_id, id)
        .await
        .map_err(internal)?;
    if !found {
        return Err(AppError::not_found("Notification"));
    }
    Ok(Json(serde_json::json!({ "id": id, "is_read": true })))
}

pub async fn subscribe_push(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(req): Json<PushSubscriptionCreate>,
) -> ApiResult<PushSubscription> {
    if !req.endpoint.starts_with("https://") {
        return Err(AppError::with_message(
            ErrorCode::InvalidFormat,
            "Push endpoint must be an https URL",
        )
        .with_detail("field", "endpoint"));
    }
    if req.keys.p256dh.is_empty() || req.keys.auth.is_empty() {
        return Err(AppError::field(ErrorCode::RequiredField, "keys"));
    }

    let sub = PushSubscription {
        store_id: identity.store_id,
        endpoint: req.endpoint,
        p256dh: req.keys.p256dh,
        auth: req.keys.auth,
        created_at: now_millis(),
    };
    state
        .store
        .upsert_push_subscription(&sub)
        .await
        .map_err(internal)?;
    tracing::info!(store_id = identity.store_id, "Push subscription registered");
    Ok(Json(sub))
}

pub async fn unsubscribe_push(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(req): Json<Unsubscribe>,
) -> ApiResult<serde_json::Value> {
    let removed = state
        .store
        .delete_push_subscription(identity.store_id, &req.endpoint)
        .await
        .map_err(internal)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}
