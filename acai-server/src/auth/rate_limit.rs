//! Fixed-window rate limiting per client IP
//!
//! Each public write route has a [`Policy`]; counters are keyed by
//! `(policy name, ip)` and reset when the window elapses.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

/// Windows untouched for this long are dropped by [`RateLimiter::cleanup`]
pub const STALE_AFTER: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub name: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

pub const LOGIN: Policy = Policy {
    name: "login",
    max_requests: 5,
    window: Duration::from_secs(60),
};

pub const REGISTER: Policy = Policy {
    name: "register",
    max_requests: 3,
    window: Duration::from_secs(60),
};

pub const CHECKOUT: Policy = Policy {
    name: "checkout",
    max_requests: 10,
    window: Duration::from_secs(60),
};

/// Manual payment checks call the gateway once per pending order
pub const RECONCILE: Policy = Policy {
    name: "reconcile",
    max_requests: 6,
    window: Duration::from_secs(60),
};

struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<(&'static str, String), Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one hit; `false` once the window's budget is spent
    pub async fn check(&self, policy: Policy, ip: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry((policy.name, ip.to_owned()))
            .or_insert(Window { started: now, hits: 0 });

        if now.duration_since(window.started) >= policy.window {
            window.started = now;
            window.hits = 0;
        }
        window.hits += 1;
        window.hits <= policy.max_requests
    }

    pub async fn cleanup(&self) {
        let now = Instant::now();
        self.windows
            .lock()
            .await
            .retain(|_, w| now.duration_since(w.started) < STALE_AFTER);
    }
}

/// First `X-Forwarded-For` hop when behind a proxy, else the socket peer
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

async fn enforce(
    state: &AppState,
    policy: Policy,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let ip = client_ip(&request);
    if !state.rate_limiter.check(policy, &ip).await {
        tracing::warn!(route = policy.name, ip = %ip, "Rate limit exceeded");
        return Err(AppError::new(ErrorCode::TooManyRequests)
            .with_detail("retry_after_secs", policy.window.as_secs())
            .into_response());
    }
    Ok(next.run(request).await)
}

pub async fn login_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, LOGIN, request, next).await
}

pub async fn register_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, REGISTER, request, next).await
}

pub async fn checkout_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, CHECKOUT, request, next).await
}

pub async fn reconcile_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    enforce(&state, RECONCILE, request, next).await
}
