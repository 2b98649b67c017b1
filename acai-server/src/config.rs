//! Server configuration

use crate::BoxError;
use crate::persistence::PersistenceMode;

/// Server configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    /// Which backend holds the shop data
    pub persistence_mode: PersistenceMode,
    /// PostgreSQL connection URL (required in postgres mode)
    pub database_url: Option<String>,
    /// JSON snapshot file for the local backend (None = memory only)
    pub local_data_path: Option<String>,
    /// JWT secret for admin authentication
    pub jwt_secret: String,
    /// Payment gateway access token (None = online payments disabled)
    pub payment_access_token: Option<String>,
    /// Payment webhook signing secret
    pub payment_webhook_secret: String,
    /// Payment gateway REST base URL
    pub payment_api_base: String,
    /// Public URL the gateway posts payment notifications to
    pub payment_notification_url: Option<String>,
    /// Reconciliation interval in seconds (0 = disabled)
    pub payment_poll_interval_secs: u64,
    /// Web-push relay endpoint (None = push disabled)
    pub push_relay_url: Option<String>,
    pub push_relay_token: Option<String>,
    /// Allowed CORS origins (empty = permissive)
    pub cors_allowed_origins: Vec<String>,
    /// Create the `acai-demo` store at startup
    pub seed_demo_store: bool,
    /// `json` for JSON log lines, anything else for plain text
    pub log_format: String,
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let database_url = optional_var("DATABASE_URL");

        let persistence_mode = match optional_var("PERSISTENCE_MODE") {
            Some(mode) => mode.parse::<PersistenceMode>()?,
            None if database_url.is_some() => PersistenceMode::Postgres,
            None => PersistenceMode::Local,
        };
        if persistence_mode == PersistenceMode::Postgres && database_url.is_none() {
            return Err("DATABASE_URL must be set when PERSISTENCE_MODE=postgres".into());
        }

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            persistence_mode,
            database_url,
            local_data_path: optional_var("LOCAL_DATA_PATH"),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            payment_access_token: optional_var("PAYMENT_ACCESS_TOKEN"),
            payment_webhook_secret: Self::require_secret("PAYMENT_WEBHOOK_SECRET", &environment)?,
            payment_api_base: std::env::var("PAYMENT_API_BASE")
                .unwrap_or_else(|_| "https://api.mercadopago.com".into()),
            payment_notification_url: optional_var("PAYMENT_NOTIFICATION_URL"),
            payment_poll_interval_secs: std::env::var("PAYMENT_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            push_relay_url: optional_var("PUSH_RELAY_URL"),
            push_relay_token: optional_var("PUSH_RELAY_TOKEN"),
            cors_allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            seed_demo_store: std::env::var("SEED_DEMO_STORE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            log_format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            environment,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("https://a.com, https://b.com,,"),
            vec!["https://a.com".to_string(), "https://b.com".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_dev_secret_fallback() {
        let v = Config::require_secret("ACAI_TEST_UNSET_SECRET", "development").unwrap();
        assert!(v.starts_with("dev-"));
        assert!(Config::require_secret("ACAI_TEST_UNSET_SECRET", "production").is_err());
    }
}
