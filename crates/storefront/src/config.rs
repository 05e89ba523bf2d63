//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOUTIK_GATEWAY_URL` - Base URL of the payment backend
//! - `BOUTIK_STORE_ID` - Identifier of the merchant boutique
//!
//! ## Optional
//! - `BOUTIK_HOST` - Bind address (default: 127.0.0.1)
//! - `BOUTIK_PORT` - Listen port (default: 3000)
//! - `BOUTIK_GATEWAY_API_KEY` - Bearer key for the payment backend
//! - `BOUTIK_VAULT_PATH` - Fallback store file for remembered customers
//!   (default: `data/saved_customers.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

use boutik_core::StoreId;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Merchant boutique served by this instance
    pub store_id: StoreId,
    /// Base URL of the payment backend
    pub gateway_url: String,
    /// Bearer key for the payment backend, when it requires one
    pub gateway_api_key: Option<SecretString>,
    /// File backing the fallback customer store
    pub vault_path: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("store_id", &self.store_id)
            .field("gateway_url", &self.gateway_url)
            .field("gateway_api_key", &self.gateway_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("vault_path", &self.vault_path)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("BOUTIK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOUTIK_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BOUTIK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BOUTIK_PORT".to_string(), e.to_string()))?;
        let store_id = StoreId::new(get_required_env("BOUTIK_STORE_ID")?);
        let gateway_url = get_required_env("BOUTIK_GATEWAY_URL")?;
        let gateway_api_key = get_optional_env("BOUTIK_GATEWAY_API_KEY").map(SecretString::from);
        let vault_path =
            PathBuf::from(get_env_or_default("BOUTIK_VAULT_PATH", "data/saved_customers.json"));
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            store_id,
            gateway_url,
            gateway_api_key,
            vault_path,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            store_id: StoreId::new("btk-7201"),
            gateway_url: "http://localhost:9000".to_string(),
            gateway_api_key: None,
            vault_path: PathBuf::from("data/saved_customers.json"),
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            store_id: StoreId::new("btk-7201"),
            gateway_url: "http://localhost:9000".to_string(),
            gateway_api_key: Some(SecretString::from("sk_live_very_secret")),
            vault_path: PathBuf::from("data/saved_customers.json"),
            sentry_dsn: None,
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_very_secret"));
    }
}
