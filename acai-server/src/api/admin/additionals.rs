//! Additional groups and additionals

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Additional, AdditionalCategory, AdditionalCategoryCreate, AdditionalCategoryUpdate,
    AdditionalCreate, AdditionalUpdate, validate_selection_bounds,
};
use shared::util::now_millis;

use super::{Deleted, deleted, require_name};
use crate::api::{ApiResult, internal};
use crate::auth::AdminIdentity;
use crate::state::AppState;

fn bounds(min: Option<i32>, max: Option<i32>) -> Result<(), AppError> {
    validate_selection_bounds(min, max).map_err(|msg| {
        AppError::with_message(ErrorCode::ValueOutOfRange, msg)
            .with_detail("field", "min_selections")
    })
}

fn price(value: Decimal) -> Result<(), AppError> {
    if value.is_sign_negative() {
        return Err(AppError::field(ErrorCode::ProductInvalidPrice, "price"));
    }
    Ok(())
}

async fn require_group(state: &AppState, store_id: i64, id: i64) -> Result<AdditionalCategory, AppError> {
    state
        .store
        .get_additional_category(store_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::AdditionalCategoryNotFound).with_detail("id", id))
}

// ── Additional categories ──

pub async fn list_additional_categories(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<Vec<AdditionalCategory>> {
    let mut groups = state
        .store
        .list_additional_categories(identity.store_id)
        .await
        .map_err(internal)?;
    groups.sort_by_key(|g| (g.sort_order, g.id));
    Ok(Json(groups))
}

pub async fn get_additional_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<AdditionalCategory> {
    Ok(Json(require_group(&state, identity.store_id, id).await?))
}

pub async fn create_additional_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(data): Json<AdditionalCategoryCreate>,
) -> ApiResult<AdditionalCategory> {
    require_name(&data.name)?;
    bounds(data.min_selections, data.max_selections)?;
    let group = state
        .store
        .create_additional_category(identity.store_id, &data, now_millis())
        .await
        .map_err(internal)?;
    Ok(Json(group))
}

pub async fn update_additional_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<AdditionalCategoryUpdate>,
) -> ApiResult<AdditionalCategory> {
    if let Some(name) = &data.name {
        require_name(name)?;
    }
    let current = require_group(&state, identity.store_id, id).await?;
    bounds(
        data.min_selections.or(Some(current.min_selections)),
        data.max_selections.unwrap_or(current.max_selections),
    )?;

    let group = state
        .store
        .update_additional_category(identity.store_id, id, &data, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::AdditionalCategoryNotFound).with_detail("id", id))?;
    Ok(Json(group))
}

pub async fn delete_additional_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Deleted> {
    let outcome = state
        .store
        .delete_additional_category(identity.store_id, id)
        .await
        .map_err(internal)?;
    deleted(
        id,
        outcome,
        ErrorCode::AdditionalCategoryNotFound,
        ErrorCode::AdditionalCategoryInUse,
    )
}

// ── Additionals ──

pub async fn list_additionals(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<Vec<Additional>> {
    let mut additionals = state
        .store
        .list_additionals(identity.store_id)
        .await
        .map_err(internal)?;
    additionals.sort_by_key(|a| (a.category_id, a.sort_order, a.id));
    Ok(Json(additionals))
}

pub async fn get_additional(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Additional> {
    let additional = state
        .store
        .get_additional(identity.store_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::AdditionalNotFound).with_detail("id", id))?;
    Ok(Json(additional))
}

pub async fn create_additional(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(data): Json<AdditionalCreate>,
) -> ApiResult<Additional> {
    require_name(&data.name)?;
    price(data.price)?;
    require_group(&state, identity.store_id, data.category_id).await?;
    let additional = state
        .store
        .create_additional(identity.store_id, &data, now_millis())
        .await
        .map_err(internal)?;
    Ok(Json(additional))
}

pub async fn update_additional(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<AdditionalUpdate>,
) -> ApiResult<Additional> {
    if let Some(name) = &data.name {
        require_name(name)?;
    }
    if let Some(p) = data.price {
        price(p)?;
    }
    if let Some(category_id) = data.category_id {
        require_group(&state, identity.store_id, category_id).await?;
    }
    let additional = state
        .store
        .update_additional(identity.store_id, id, &data, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::AdditionalNotFound).with_detail("id", id))?;
    Ok(Json(additional))
}

pub async fn delete_additional(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Deleted> {
    let outcome = state
        .store
        .delete_additional(identity.store_id, id)
        .await
        .map_err(internal)?;
    deleted(
        id,
        outcome,
        ErrorCode::AdditionalNotFound,
        ErrorCode::AdditionalNotFound,
    )
}
