//! Token endpoint types.
//!
//! Wire types for the token and revocation endpoints. The token endpoint
//! has no end-user session; clients authenticate with their credentials in
//! the request body.
//!
//! # Supported Grant Types
//!
//! - `authorization_code` - exchange a code for an access/refresh pair
//! - `refresh_token` - rotate a refresh token into a new pair

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Token request parameters.
///
/// Different fields are required depending on `grant_type`:
///
/// - `authorization_code`: code, client_id, client_secret,
///   (optional) redirect_uri, (optional) code_verifier
/// - `refresh_token`: refresh_token, client_id, client_secret
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type.
    pub grant_type: String,

    /// Authorization code (for the authorization_code grant).
    #[serde(default)]
    pub code: Option<String>,

    /// Refresh token (for the refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Public client identifier.
    pub client_id: String,

    /// Client secret.
    pub client_secret: String,

    /// Redirect URI; when supplied it must match the one bound to the
    /// code at authorize time.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// PKCE code verifier; required when the code carries a challenge.
    #[serde(default)]
    pub code_verifier: Option<String>,
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 3600,
///   "refresh_token": "3dPBm...",
///   "scope": "proposals:read proposals:write"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The signed access token.
    pub access_token: String,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// The opaque refresh token.
    pub refresh_token: String,

    /// Granted scopes (space-separated).
    pub scope: String,
}

impl TokenResponse {
    /// Creates a new token response.
    #[must_use]
    pub fn new(
        access_token: String,
        expires_in: u64,
        refresh_token: String,
        scope: String,
    ) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
            refresh_token,
            scope,
        }
    }
}

/// Hint about the token type being revoked (RFC 7009 section 2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    /// The token is an access token.
    AccessToken,
    /// The token is a refresh token.
    RefreshToken,
}

impl TokenTypeHint {
    /// Returns the hint as its wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for TokenTypeHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token revocation request (RFC 7009).
#[derive(Debug, Clone, Deserialize)]
pub struct RevocationRequest {
    /// The token value to revoke.
    pub token: String,

    /// Optional hint about which kind of token is being revoked. The
    /// server falls back to the other kind when the hinted lookup misses.
    #[serde(default)]
    pub token_type_hint: Option<TokenTypeHint>,
}

/// Token error envelope returned by the token endpoint (RFC 6749
/// section 5.2).
#[derive(Debug, Clone, Serialize)]
pub struct TokenErrorBody {
    /// OAuth 2.0 error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl TokenErrorBody {
    /// Builds the wire envelope for a protocol error.
    ///
    /// Server errors keep their description out of the envelope; the
    /// detail goes to logs, not to the client.
    #[must_use]
    pub fn from_error(err: &AuthError) -> Self {
        let description = if err.is_server_error() {
            None
        } else {
            Some(err.to_string())
        };
        Self {
            error: err.oauth_error_code().to_string(),
            error_description: description,
        }
    }
}
