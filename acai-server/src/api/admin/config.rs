//! Store configuration
//!
//! GET /api/admin/config - current config (defaults if never saved)
//! PUT /api/admin/config - partial update

use axum::{Extension, Json, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{StoreConfig, StoreConfigUpdate};
use shared::util::now_millis;

use crate::api::{ApiResult, internal, load_config};
use crate::auth::AdminIdentity;
use crate::state::AppState;

pub async fn get_config(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<StoreConfig> {
    let store = state
        .store
        .find_store_by_id(identity.store_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound))?;
    Ok(Json(load_config(&state, &store).await?))
}

pub async fn update_config(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(update): Json<StoreConfigUpdate>,
) -> ApiResult<StoreConfig> {
    let store = state
        .store
        .find_store_by_id(identity.store_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound))?;

    let mut config = load_config(&state, &store).await?;
    config.apply(update, now_millis())?;
    state.store.save_config(&config).await.map_err(internal)?;

    tracing::info!(store_id = store.id, "Store config updated");
    Ok(Json(config))
}
