//! Store registration and admin login
//!
//! POST /api/register - create store, seed defaults, return token
//! POST /api/admin/login - email + password → token

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::{Store, StoreCreate, is_valid_slug};
use shared::util::now_millis;
use validator::Validate;

use crate::BoxError;
use crate::auth::create_token;
use crate::error::{ServiceError, ServiceResult};
use crate::persistence::StoreConflict;
use crate::seed::seed_store_defaults;
use crate::state::AppState;
use crate::util::{hash_password, normalize_email, verify_password};

use super::{ApiResult, internal, invalid};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    pub slug: String,
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub store: Store,
}

fn issue_token(state: &AppState, store: &Store) -> Result<String, AppError> {
    create_token(store.id, &store.email, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })
}

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    req.validate().map_err(invalid)?;
    let store = create_store_account(&state, &req).await?;
    tracing::info!(store_id = store.id, slug = %store.slug, "Store registered");

    let token = issue_token(&state, &store)?;
    Ok(Json(AuthResponse { token, store }))
}

/// Check uniqueness, create the store and seed its defaults
async fn create_store_account(state: &AppState, req: &RegisterRequest) -> ServiceResult<Store> {
    let slug = req.slug.trim().to_lowercase();
    if !is_valid_slug(&slug) {
        return Err(AppError::new(ErrorCode::InvalidSlug)
            .with_detail("slug", slug)
            .into());
    }
    let email = normalize_email(&req.email);
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("min_length", MIN_PASSWORD_LEN as u64)
            .into());
    }

    if state.store.find_store_by_slug(&slug).await?.is_some() {
        return Err(AppError::new(ErrorCode::StoreSlugTaken)
            .with_detail("slug", slug)
            .into());
    }
    if state.store.find_store_by_email(&email).await?.is_some() {
        return Err(AppError::new(ErrorCode::StoreEmailTaken).into());
    }

    let hashed_password =
        hash_password(&req.password).map_err(|e| ServiceError::Db(e.to_string().into()))?;
    let store = state
        .store
        .create_store(
            &StoreCreate {
                slug,
                name: req.name.trim().to_string(),
                email,
                hashed_password,
            },
            now_millis(),
        )
        .await
        .map_err(conflict_error)?;

    seed_store_defaults(state.store.as_ref(), store.id, &store.name).await?;
    Ok(store)
}

/// A unique-key clash lost to a concurrent registration
fn conflict_error(e: BoxError) -> ServiceError {
    match e.downcast_ref::<StoreConflict>() {
        Some(StoreConflict::Slug) => AppError::new(ErrorCode::StoreSlugTaken).into(),
        Some(StoreConflict::Email) => AppError::new(ErrorCode::StoreEmailTaken).into(),
        None => ServiceError::Db(e),
    }
}

/// POST /api/admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let store = state
        .store
        .find_store_by_email(&email)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &store.hashed_password) {
        return Err(AppError::new(ErrorCode::InvalidCredentials));
    }
    if !store.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let token = issue_token(&state, &store)?;
    Ok(Json(AuthResponse { token, store }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            slug: "acai-centro".into(),
            name: "Açaí Centro".into(),
            email: email.into(),
            password: "senha-forte-123".into(),
        }
    }

    #[test]
    fn register_email_must_be_an_address() {
        assert!(request("Loja@Acai.com").validate().is_ok());
        for bad in ["loja", "@acai.com", "loja@", "loja@@acai.com"] {
            let err = invalid(request(bad).validate().unwrap_err());
            assert_eq!(err.code, ErrorCode::ValidationFailed, "{bad}");
            assert_eq!(err.details.unwrap()["fields"][0], "email");
        }
    }

    #[test]
    fn backend_conflicts_become_taken_errors() {
        let code = |e: BoxError| match conflict_error(e) {
            ServiceError::App(app) => Some(app.code),
            ServiceError::Db(_) => None,
        };
        assert_eq!(code(StoreConflict::Slug.into()), Some(ErrorCode::StoreSlugTaken));
        assert_eq!(code(StoreConflict::Email.into()), Some(ErrorCode::StoreEmailTaken));
        assert_eq!(code("connection reset".into()), None);
    }
}
