//! Application configuration module
//!
//! Configuration is read from environment variables (and a `.env` file when
//! present) with the `PAYWIRE` prefix; nested values are separated by `__`.
//!
//! # Example
//!
//! ```no_run
//! use paywire::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod auth;
mod database;
mod error;
mod notifications;
mod payment;
mod server;

pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use notifications::NotificationsConfig;
pub use payment::PaymentConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (bind address, logging, timeouts)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Notification socket handshake tokens
    pub auth: AuthConfig,

    /// Processor callback secret and processing deadline
    pub payment: PaymentConfig,

    #[serde(default)]
    pub notifications: NotificationsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variable Format
    ///
    /// - `PAYWIRE__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `PAYWIRE__PAYMENT__HMAC_SECRET=...` -> `payment.hmac_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYWIRE")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.payment.validate(self.server.request_timeout_secs)?;
        self.notifications.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::sync::Mutex;

    // env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 7] = [
        "PAYWIRE__DATABASE__URL",
        "PAYWIRE__AUTH__JWT_SECRET",
        "PAYWIRE__PAYMENT__HMAC_SECRET",
        "PAYWIRE__SERVER__PORT",
        "PAYWIRE__SERVER__ENVIRONMENT",
        "PAYWIRE__PAYMENT__PROCESSING_TIMEOUT_SECS",
        "PAYWIRE__NOTIFICATIONS__CONNECTION_BUFFER",
    ];

    fn set_minimal_env() {
        env::set_var("PAYWIRE__DATABASE__URL", "postgresql://test@localhost/paywire");
        env::set_var("PAYWIRE__AUTH__JWT_SECRET", "0123456789abcdef0123456789abcdef");
        env::set_var("PAYWIRE__PAYMENT__HMAC_SECRET", "test_hmac_secret");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn load_with(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_minimal_env();
        for (key, value) in extra {
            env::set_var(key, value);
        }
        let result = AppConfig::load();
        clear_env();
        result
    }

    #[test]
    fn test_load_from_environment() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/paywire");
        assert_eq!(config.payment.hmac_secret.expose_secret(), "test_hmac_secret");
        assert_eq!(config.notifications.connection_buffer, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.environment, Environment::Development);
    }

    #[test]
    fn test_overrides() {
        let config = load_with(&[
            ("PAYWIRE__SERVER__PORT", "3000"),
            ("PAYWIRE__PAYMENT__PROCESSING_TIMEOUT_SECS", "4"),
            ("PAYWIRE__NOTIFICATIONS__CONNECTION_BUFFER", "8"),
        ])
        .unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.payment.processing_timeout_secs, 4);
        assert_eq!(config.notifications.connection_buffer, 8);
    }

    #[test]
    fn test_is_production() {
        let config = load_with(&[("PAYWIRE__SERVER__ENVIRONMENT", "production")]).unwrap();
        assert!(config.is_production());
    }

    #[test]
    fn test_missing_payment_section_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        set_minimal_env();
        env::remove_var("PAYWIRE__PAYMENT__HMAC_SECRET");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
