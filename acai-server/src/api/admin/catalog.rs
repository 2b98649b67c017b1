//! Categories and products

use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Category, CategoryCreate, CategoryUpdate, Product, ProductCreate, ProductUpdate,
    validate_sizes,
};
use shared::util::now_millis;

use super::{Deleted, deleted, require_name};
use crate::api::{ApiResult, internal};
use crate::auth::AdminIdentity;
use crate::state::AppState;

// ── Categories ──

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<Vec<Category>> {
    let mut categories = state
        .store
        .list_categories(identity.store_id)
        .await
        .map_err(internal)?;
    categories.sort_by_key(|c| (c.sort_order, c.id));
    Ok(Json(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Category> {
    let category = state
        .store
        .get_category(identity.store_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("id", id))?;
    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(data): Json<CategoryCreate>,
) -> ApiResult<Category> {
    require_name(&data.name)?;
    let category = state
        .store
        .create_category(identity.store_id, &data, now_millis())
        .await
        .map_err(internal)?;
    tracing::info!(store_id = identity.store_id, category_id = category.id, "Category created");
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<CategoryUpdate>,
) -> ApiResult<Category> {
    if let Some(name) = &data.name {
        require_name(name)?;
    }
    let category = state
        .store
        .update_category(identity.store_id, id, &data, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::CategoryNotFound).with_detail("id", id))?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Deleted> {
    let outcome = state
        .store
        .delete_category(identity.store_id, id)
        .await
        .map_err(internal)?;
    deleted(
        id,
        outcome,
        ErrorCode::CategoryNotFound,
        ErrorCode::CategoryHasProducts,
    )
}

// ── Products ──

/// Category and additional groups must exist in the admin's store
async fn check_product_refs(
    state: &AppState,
    store_id: i64,
    category_id: Option<i64>,
    additional_category_ids: Option<&[i64]>,
) -> Result<(), AppError> {
    if let Some(category_id) = category_id
        && state
            .store
            .get_category(store_id, category_id)
            .await
            .map_err(internal)?
            .is_none()
    {
        return Err(AppError::new(ErrorCode::ProductCategoryInvalid)
            .with_detail("category_id", category_id));
    }

    if let Some(ids) = additional_category_ids {
        let known: HashSet<i64> = state
            .store
            .list_additional_categories(store_id)
            .await
            .map_err(internal)?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !known.contains(id)) {
            return Err(AppError::new(ErrorCode::AdditionalCategoryNotFound)
                .with_detail("additional_category_id", *missing));
        }
    }
    Ok(())
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
) -> ApiResult<Vec<Product>> {
    let mut products = state
        .store
        .list_products(identity.store_id)
        .await
        .map_err(internal)?;
    products.sort_by_key(|p| (p.category_id, p.sort_order, p.id));
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Product> {
    let product = state
        .store
        .get_product(identity.store_id, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("id", id))?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Json(data): Json<ProductCreate>,
) -> ApiResult<Product> {
    require_name(&data.name)?;
    validate_sizes(&data.sizes)?;
    check_product_refs(
        &state,
        identity.store_id,
        Some(data.category_id),
        Some(&data.additional_category_ids),
    )
    .await?;

    let product = state
        .store
        .create_product(identity.store_id, &data, now_millis())
        .await
        .map_err(internal)?;
    tracing::info!(store_id = identity.store_id, product_id = product.id, "Product created");
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
    Json(data): Json<ProductUpdate>,
) -> ApiResult<Product> {
    if let Some(name) = &data.name {
        require_name(name)?;
    }
    if let Some(sizes) = &data.sizes {
        validate_sizes(sizes)?;
    }
    check_product_refs(
        &state,
        identity.store_id,
        data.category_id,
        data.additional_category_ids.as_deref(),
    )
    .await?;

    let product = state
        .store
        .update_product(identity.store_id, id, &data, now_millis())
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ProductNotFound).with_detail("id", id))?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(identity): Extension<AdminIdentity>,
    Path(id): Path<i64>,
) -> ApiResult<Deleted> {
    let outcome = state
        .store
        .delete_product(identity.store_id, id)
        .await
        .map_err(internal)?;
    // Orders keep their own priced copy, so products are never "in use"
    deleted(
        id,
        outcome,
        ErrorCode::ProductNotFound,
        ErrorCode::ProductNotFound,
    )
}
