//! HTTP API for acai-server
//!
//! Public storefront routes resolve the store from the `{slug}` path segment;
//! admin routes take the store from the JWT and never from the request.

pub mod admin;
pub mod auth;
pub mod checkout;
pub mod health;
pub mod storefront;
pub mod webhook;

use axum::routing::{get, post, put};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue, Method};
use shared::error::{AppError, ErrorCode};
use shared::models::{Store, StoreConfig};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::admin_auth_middleware;
use crate::auth::rate_limit::{
    checkout_rate_limit, login_rate_limit, reconcile_rate_limit, register_rate_limit,
};
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Log a backend error and hide it behind `InternalError`
pub(crate) fn internal(e: impl std::fmt::Display) -> AppError {
    tracing::error!("Store query error: {e}");
    AppError::new(ErrorCode::InternalError)
}

/// Map `validator` failures to a `ValidationFailed` error listing the fields
pub(crate) fn invalid(errors: validator::ValidationErrors) -> AppError {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|k| k.to_string())
        .collect();
    fields.sort_unstable();
    AppError::validation(format!("Invalid fields: {}", fields.join(", ")))
        .with_detail("fields", fields)
}

/// Resolve an active store by its public slug
pub(crate) async fn resolve_shop(state: &AppState, slug: &str) -> Result<Store, AppError> {
    state
        .store
        .find_store_by_slug(slug)
        .await
        .map_err(internal)?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::new(ErrorCode::StoreNotFound).with_detail("slug", slug))
}

/// Store config, falling back to defaults if it was never saved
pub(crate) async fn load_config(state: &AppState, store: &Store) -> Result<StoreConfig, AppError> {
    let config = state.store.get_config(store.id).await.map_err(internal)?;
    Ok(config.unwrap_or_else(|| {
        StoreConfig::default_for(store.id, &store.name, shared::util::now_millis())
    }))
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no tower layers)
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/api/admin/me", get(admin::account::me))
        .route(
            "/api/admin/config",
            get(admin::config::get_config).put(admin::config::update_config),
        )
        .route(
            "/api/admin/categories",
            get(admin::catalog::list_categories).post(admin::catalog::create_category),
        )
        .route(
            "/api/admin/categories/{id}",
            get(admin::catalog::get_category)
                .put(admin::catalog::update_category)
                .delete(admin::catalog::delete_category),
        )
        .route(
            "/api/admin/products",
            get(admin::catalog::list_products).post(admin::catalog::create_product),
        )
        .route(
            "/api/admin/products/{id}",
            get(admin::catalog::get_product)
                .put(admin::catalog::update_product)
                .delete(admin::catalog::delete_product),
        )
        .route(
            "/api/admin/additional-categories",
            get(admin::additionals::list_additional_categories)
                .post(admin::additionals::create_additional_category),
        )
        .route(
            "/api/admin/additional-categories/{id}",
            get(admin::additionals::get_additional_category)
                .put(admin::additionals::update_additional_category)
                .delete(admin::additionals::delete_additional_category),
        )
        .route(
            "/api/admin/additionals",
            get(admin::additionals::list_additionals).post(admin::additionals::create_additional),
        )
        .route(
            "/api/admin/additionals/{id}",
            get(admin::additionals::get_additional)
                .put(admin::additionals::update_additional)
                .delete(admin::additionals::delete_additional),
        )
        .route("/api/admin/orders", get(admin::orders::list_orders))
        .route("/api/admin/orders/{id}", get(admin::orders::get_order))
        .route(
            "/api/admin/orders/{id}/status",
            put(admin::orders::update_order_status),
        )
        .route("/api/admin/dashboard", get(admin::dashboard::get_dashboard))
        .route(
            "/api/admin/notifications",
            get(admin::notifications::list_notifications),
        )
        .route(
            "/api/admin/notifications/{id}/read",
            post(admin::notifications::mark_read),
        )
        .route(
            "/api/admin/push-subscriptions",
            post(admin::notifications::subscribe_push)
                .delete(admin::notifications::unsubscribe_push),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    let reconcile = Router::new()
        .route(
            "/api/admin/payments/reconcile",
            post(admin::orders::reconcile_payments),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            reconcile_rate_limit,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    let login = Router::new()
        .route("/api/admin/login", post(auth::login))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            login_rate_limit,
        ));

    let registration = Router::new()
        .route("/api/register", post(auth::register))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            register_rate_limit,
        ));

    let checkout = Router::new()
        .route("/api/shops/{slug}/checkout", post(checkout::checkout))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            checkout_rate_limit,
        ));

    let storefront = Router::new()
        .route("/api/shops/{slug}", get(storefront::get_shop))
        .route("/api/shops/{slug}/catalog", get(storefront::get_catalog))
        .route("/api/shops/{slug}/cart/quote", post(storefront::quote))
        .route(
            "/api/shops/{slug}/orders/{id}",
            get(storefront::track_order),
        );

    // Signature-verified, no auth
    let webhook = Router::new().route("/webhooks/payments", post(webhook::handle_webhook));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(registration)
        .merge(login)
        .merge(storefront)
        .merge(checkout)
        .merge(webhook)
        .merge(admin)
        .merge(reconcile)
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
}

/// Build the fully layered application; used by the server and by tests
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    build_router(state)
        .layer(cors_layer(allowed_origins))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
}
