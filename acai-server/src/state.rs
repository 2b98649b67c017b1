//! Application state shared by all handlers

use std::sync::Arc;

use crate::BoxError;
use crate::auth::RateLimiter;
use crate::config::Config;
use crate::notify::{Notifier, PushRelay};
use crate::payment::{MercadoPagoGateway, PaymentGateway};
use crate::persistence::{LocalStore, PersistenceMode, PgStore, ShopStore};
use crate::reconcile::PaymentReconciler;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Active persistence backend
    pub store: Arc<dyn ShopStore>,
    /// Payment gateway (None = online payments disabled)
    pub gateway: Option<Arc<dyn PaymentGateway>>,
    /// Notification writer + push fan-out
    pub notifier: Notifier,
    /// Payment-status poller (also triggered from the admin API)
    pub reconciler: PaymentReconciler,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Webhook signing secret shared with the gateway
    pub payment_webhook_secret: String,
    /// Public URL the gateway calls back on status changes
    pub payment_notification_url: Option<String>,
    /// Rate limiter for login/registration/checkout routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create a new AppState, connecting the backend picked by `PERSISTENCE_MODE`
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let store: Arc<dyn ShopStore> = match config.persistence_mode {
            PersistenceMode::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .ok_or("DATABASE_URL is required in postgres mode")?;
                let pg = PgStore::connect(url).await?;
                tracing::info!("PostgreSQL persistence ready");
                Arc::new(pg)
            }
            PersistenceMode::Local => {
                let local = match &config.local_data_path {
                    Some(path) => {
                        tracing::info!(path = %path, "Local persistence with snapshot file");
                        LocalStore::open(path)?
                    }
                    None => {
                        tracing::warn!("Local persistence in memory only; data is lost on restart");
                        LocalStore::in_memory()
                    }
                };
                Arc::new(local)
            }
        };

        let gateway: Option<Arc<dyn PaymentGateway>> = match &config.payment_access_token {
            Some(token) => Some(Arc::new(MercadoPagoGateway::new(
                token.clone(),
                config.payment_api_base.clone(),
            ))),
            None => {
                tracing::warn!("PAYMENT_ACCESS_TOKEN not set, Pix payments disabled");
                None
            }
        };

        let relay = config
            .push_relay_url
            .as_ref()
            .map(|url| PushRelay::new(url.clone(), config.push_relay_token.clone()));
        if relay.is_none() {
            tracing::info!("PUSH_RELAY_URL not set, push delivery disabled");
        }

        Ok(Self::from_parts(
            store,
            gateway,
            relay,
            config.jwt_secret.clone(),
            config.payment_webhook_secret.clone(),
            config.payment_notification_url.clone(),
        ))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        store: Arc<dyn ShopStore>,
        gateway: Option<Arc<dyn PaymentGateway>>,
        relay: Option<PushRelay>,
        jwt_secret: String,
        payment_webhook_secret: String,
        payment_notification_url: Option<String>,
    ) -> Self {
        let notifier = Notifier::new(store.clone(), relay);
        let reconciler = PaymentReconciler::new(store.clone(), gateway.clone(), notifier.clone());
        Self {
            store,
            gateway,
            notifier,
            reconciler,
            jwt_secret,
            payment_webhook_secret,
            payment_notification_url,
            rate_limiter: RateLimiter::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(payment_access_token: Option<&str>) -> Config {
        Config {
            environment: "development".into(),
            http_port: 0,
            persistence_mode: PersistenceMode::Local,
            database_url: None,
            local_data_path: None,
            jwt_secret: "jwt".into(),
            payment_access_token: payment_access_token.map(str::to_string),
            payment_webhook_secret: "hook".into(),
            payment_api_base: "http://127.0.0.1:9".into(),
            payment_notification_url: None,
            payment_poll_interval_secs: 0,
            push_relay_url: None,
            push_relay_token: None,
            cors_allowed_origins: vec![],
            seed_demo_store: false,
            log_format: "plain".into(),
        }
    }

    #[tokio::test]
    async fn gateway_follows_access_token() {
        let state = AppState::new(&config(Some("TEST-token"))).await.unwrap();
        assert!(state.gateway.is_some());
        let state = AppState::new(&config(None)).await.unwrap();
        assert!(state.gateway.is_none());
    }
}
