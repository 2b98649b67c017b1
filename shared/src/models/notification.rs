//! Notification Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Admin-facing notification (new order, payment changes)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub store_id: i64,
    /// See [`NotificationKind`]
    pub kind: String,
    pub title: String,
    pub body: String,
    pub order_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: i64,
}

impl Notification {
    pub fn new(
        id: i64,
        store_id: i64,
        kind: NotificationKind,
        title: impl Into<String>,
        body: impl Into<String>,
        order_id: Option<Uuid>,
        now: i64,
    ) -> Self {
        Self {
            id,
            store_id,
            kind: kind.as_str().to_string(),
            title: title.into(),
            body: body.into(),
            order_id,
            is_read: false,
            created_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewOrder,
    PaymentApproved,
    PaymentFailed,
    OrderCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewOrder => "new_order",
            Self::PaymentApproved => "payment_approved",
            Self::PaymentFailed => "payment_failed",
            Self::OrderCancelled => "order_cancelled",
        }
    }
}

/// Browser push subscription registered by an admin device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PushSubscription {
    pub store_id: i64,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub created_at: i64,
}

/// Keys as produced by the browser's `PushSubscription.toJSON()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Register push subscription payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSubscriptionCreate {
    pub endpoint: String,
    pub keys: PushSubscriptionKeys,
}
