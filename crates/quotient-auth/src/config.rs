//! Authorization server configuration.
//!
//! Controls code and token lifetimes plus the signing key for access
//! tokens. Lifetimes deserialize from humantime strings so they can live in
//! the server's TOML configuration alongside everything else.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "https://auth.quotient.dev"
//! signing_key = "<32+ bytes of random data>"
//! authorization_code_lifetime = "10m"
//! access_token_lifetime = "1h"
//! refresh_token_lifetime = "30d"
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the authorization server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Server issuer URL (used in the access token `iss` claim).
    pub issuer: String,

    /// HMAC signing key for access tokens.
    ///
    /// Must be a high-entropy value (32+ random bytes). Rotating it
    /// invalidates every outstanding access token at once.
    pub signing_key: String,

    /// Authorization code lifetime. Codes are single-use and short-lived.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Access token lifetime.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            signing_key: String::new(),
            authorization_code_lifetime: Duration::from_secs(10 * 60),
            access_token_lifetime: Duration::from_secs(60 * 60),
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl AuthConfig {
    /// Creates a configuration with the given issuer and signing key and
    /// default lifetimes.
    #[must_use]
    pub fn new(issuer: impl Into<String>, signing_key: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            signing_key: signing_key.into(),
            ..Self::default()
        }
    }

    /// Sets the authorization code lifetime.
    #[must_use]
    pub fn with_authorization_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.authorization_code_lifetime = lifetime;
        self
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime;
        self
    }
}
