//! Admin API (JWT authenticated), split into sub-modules by domain
//!
//! Every handler reads the store id from [`AdminIdentity`]; path ids are
//! always looked up within that store.
//!
//! [`AdminIdentity`]: crate::auth::AdminIdentity

pub mod account;
pub mod additionals;
pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod notifications;
pub mod orders;

use serde::Serialize;
use shared::error::{AppError, ErrorCode};

use crate::persistence::DeleteOutcome;

/// Body returned by delete endpoints
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
    pub deleted: bool,
}

/// Turn a [`DeleteOutcome`] into a response, with per-resource error codes
pub(crate) fn deleted(
    id: i64,
    outcome: DeleteOutcome,
    not_found: ErrorCode,
    in_use: ErrorCode,
) -> Result<axum::Json<Deleted>, AppError> {
    match outcome {
        DeleteOutcome::Deleted => Ok(axum::Json(Deleted { id, deleted: true })),
        DeleteOutcome::NotFound => Err(AppError::new(not_found).with_detail("id", id)),
        DeleteOutcome::InUse => Err(AppError::new(in_use).with_detail("id", id)),
    }
}

/// Trimmed, non-empty name
pub(crate) fn require_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::field(ErrorCode::RequiredField, "name"));
    }
    Ok(())
}
