//! Admin JWT authentication for the store management API

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// JWT claims for a store admin
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    /// Store ID
    pub sub: String,
    /// Admin email
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated store admin extracted from JWT
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub store_id: i64,
    pub email: String,
}

const JWT_EXPIRY_HOURS: i64 = 24;

/// Create a JWT token for a store admin
pub fn create_token(
    store_id: i64,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = AdminClaims {
        sub: store_id.to_string(),
        email: email.to_string(),
        exp: (now + chrono::Duration::hours(JWT_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and validate an admin token
pub fn decode_token(token: &str, secret: &str) -> Result<AdminIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<AdminClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired)
            }
            _ => AppError::invalid_token("Invalid or expired token"),
        }
    })?;

    let store_id = token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::invalid_token("Invalid token subject"))?;

    Ok(AdminIdentity {
        store_id,
        email: token_data.claims.email,
    })
}

/// Middleware that extracts and verifies the admin JWT from the Authorization header
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            error_response(AppError::with_message(
                ErrorCode::NotAuthenticated,
                "Missing Authorization header",
            ))
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        error_response(AppError::invalid_token("Invalid Authorization format"))
    })?;

    let identity = decode_token(token, &state.jwt_secret).map_err(error_response)?;

    // Tokens outlive store deactivation; re-check on every request.
    match state.store.find_store_by_id(identity.store_id).await {
        Ok(Some(store)) if store.is_active => {}
        Ok(Some(_)) => return Err(error_response(AppError::new(ErrorCode::AccountDisabled))),
        Ok(None) => return Err(error_response(AppError::new(ErrorCode::StoreNotFound))),
        Err(e) => {
            tracing::error!(store_id = identity.store_id, "Store lookup failed: {e}");
            return Err(error_response(AppError::new(ErrorCode::InternalError)));
        }
    }

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

fn error_response(err: AppError) -> Response {
    err.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_token(42, "loja@acai.com", "secret").unwrap();
        let identity = decode_token(&token, "secret").unwrap();
        assert_eq!(identity.store_id, 42);
        assert_eq!(identity.email, "loja@acai.com");
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = create_token(42, "loja@acai.com", "secret").unwrap();
        let err = decode_token(&token, "other").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenInvalid);
    }

    #[test]
    fn expired_token_rejected() {
        let claims = AdminClaims {
            sub: "42".into(),
            email: "loja@acai.com".into(),
            exp: 1_000,
            iat: 0,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        let err = decode_token(&token, "secret").unwrap_err();
        assert_eq!(err.code, ErrorCode::TokenExpired);
    }
}
