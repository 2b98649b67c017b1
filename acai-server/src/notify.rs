//! Admin notifications and web-push dispatch
//!
//! Every notification is stored first, then pushed to each browser
//! subscription of the store through a web-push relay service. Push is
//! best-effort: failures are logged and subscriptions the relay reports as
//! gone (404/410) are removed.

use std::sync::Arc;

use serde_json::json;
use shared::models::{Notification, NotificationKind, PushSubscription};
use shared::util::{now_millis, snowflake_id};
use uuid::Uuid;

use crate::persistence::ShopStore;

/// HTTP relay that performs the actual web-push encryption and delivery
#[derive(Clone)]
pub struct PushRelay {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

/// Relay answer for one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// Subscription expired or unsubscribed
    Gone,
    Failed,
}

impl PushRelay {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            token,
        }
    }

    pub async fn send(&self, sub: &PushSubscription, payload: &serde_json::Value) -> PushOutcome {
        let body = json!({
            "subscription": {
                "endpoint": sub.endpoint,
                "keys": { "p256dh": sub.p256dh, "auth": sub.auth },
            },
            "payload": payload,
            "ttl": 3600,
        });
        let mut req = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        match req.send().await {
            Ok(resp) => classify_status(resp.status().as_u16()),
            Err(e) => {
                tracing::warn!(endpoint = %sub.endpoint, error = %e, "Push relay request failed");
                PushOutcome::Failed
            }
        }
    }
}

fn classify_status(status: u16) -> PushOutcome {
    match status {
        200..=299 => PushOutcome::Delivered,
        404 | 410 => PushOutcome::Gone,
        _ => PushOutcome::Failed,
    }
}

#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn ShopStore>,
    relay: Option<PushRelay>,
}

impl Notifier {
    pub fn new(store: Arc<dyn ShopStore>, relay: Option<PushRelay>) -> Self {
        Self { store, relay }
    }

    /// Persist a notification and fan it out to push subscribers.
    /// Never fails; errors are logged.
    pub async fn notify(
        &self,
        store_id: i64,
        kind: NotificationKind,
        title: &str,
        body: &str,
        order_id: Option<Uuid>,
    ) -> Option<Notification> {
        let notification = Notification::new(
            snowflake_id(),
            store_id,
            kind,
            title,
            body,
            order_id,
            now_millis(),
        );
        if let Err(e) = self.store.insert_notification(&notification).await {
            tracing::error!(store_id, kind = kind.as_str(), error = %e, "Failed to store notification");
            return None;
        }

        if let Some(relay) = self.relay.clone() {
            let store = self.store.clone();
            let payload = json!({
                "title": notification.title,
                "body": notification.body,
                "data": {
                    "kind": notification.kind,
                    "notification_id": notification.id,
                    "order_id": notification.order_id,
                },
            });
            tokio::spawn(async move {
                dispatch(store.as_ref(), &relay, store_id, &payload).await;
            });
        }

        Some(notification)
    }
}

async fn dispatch(
    store: &dyn ShopStore,
    relay: &PushRelay,
    store_id: i64,
    payload: &serde_json::Value,
) {
    let subs = match store.list_push_subscriptions(store_id).await {
        Ok(subs) => subs,
        Err(e) => {
            tracing::error!(store_id, error = %e, "Failed to list push subscriptions");
            return;
        }
    };
    let outcomes =
        futures::future::join_all(subs.iter().map(|sub| relay.send(sub, payload))).await;
    for (sub, outcome) in subs.iter().zip(outcomes) {
        match outcome {
            PushOutcome::Delivered => {}
            PushOutcome::Gone => {
                tracing::info!(endpoint = %sub.endpoint, "Removing expired push subscription");
                if let Err(e) = store.delete_push_subscription(store_id, &sub.endpoint).await {
                    tracing::warn!(error = %e, "Failed to remove push subscription");
                }
            }
            PushOutcome::Failed => {
                tracing::warn!(endpoint = %sub.endpoint, "Push delivery failed");
            }
        }
    }
}
