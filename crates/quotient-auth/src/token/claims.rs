//! Signed access token claims.
//!
//! Access tokens are compact HMAC-signed JWTs carrying the subject, the
//! client, the granted scopes, and a token type discriminator. The
//! discriminator prevents a token minted for a different purpose (for
//! example a password-reset token signed with the same key) from being
//! accepted as an OAuth access token.
//!
//! A verified signature is deliberately not the whole story: callers must
//! still check the backing storage record, which is where revocation
//! lives. See [`crate::token::service::TokenService::validate`].
//!
//! # Example
//!
//! ```
//! use quotient_auth::token::claims::{AccessTokenClaims, ClaimsService};
//! use std::time::Duration;
//! use uuid::Uuid;
//!
//! let service = ClaimsService::new("https://auth.example.com", "a-high-entropy-signing-key");
//! let claims = AccessTokenClaims::new(
//!     "https://auth.example.com",
//!     Uuid::new_v4(),
//!     "ca_1234",
//!     "proposals:read",
//!     Duration::from_secs(3600),
//! );
//!
//! let token = service.issue(&claims).unwrap();
//! let verified = service.verify(&token).unwrap();
//! assert_eq!(verified.client_id, "ca_1234");
//! ```

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Token type discriminator for OAuth access tokens.
pub const OAUTH_ACCESS_TOKEN_TYPE: &str = "oauth_access";

/// Errors that can occur while issuing or verifying signed claims.
#[derive(Debug, thiserror::Error)]
pub enum ClaimsError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token was minted for a different purpose.
    #[error("Wrong token type: expected \"{expected}\", got \"{actual}\"")]
    WrongTokenType {
        /// The expected token type.
        expected: &'static str,
        /// The type the token actually carries.
        actual: String,
    },
}

impl ClaimsError {
    /// Returns `true` if this is a verification failure rather than an
    /// encoding problem.
    #[must_use]
    pub fn is_verification_error(&self) -> bool {
        matches!(
            self,
            Self::DecodingError { .. }
                | Self::Expired
                | Self::InvalidSignature
                | Self::WrongTokenType { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for ClaimsError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            _ => Self::DecodingError {
                message: err.to_string(),
            },
        }
    }
}

/// Claims carried by a signed access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer (the authorization server URL).
    pub iss: String,

    /// Subject: the user who authorized the grant.
    pub sub: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Granted scopes (space-separated).
    pub scope: String,

    /// Token type discriminator; must be [`OAUTH_ACCESS_TOKEN_TYPE`].
    pub token_type: String,

    /// Expiry (unix timestamp).
    pub exp: i64,

    /// Issued-at (unix timestamp).
    pub iat: i64,

    /// Unique token identifier.
    pub jti: String,
}

impl AccessTokenClaims {
    /// Builds claims for a fresh access token.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        user_id: Uuid,
        client_id: impl Into<String>,
        scope: impl Into<String>,
        ttl: std::time::Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            iss: issuer.into(),
            sub: user_id.to_string(),
            client_id: client_id.into(),
            scope: scope.into(),
            token_type: OAUTH_ACCESS_TOKEN_TYPE.to_string(),
            exp: (now + ttl).unix_timestamp(),
            iat: now.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Returns the subject parsed back into a user id.
    ///
    /// # Errors
    ///
    /// Returns `uuid::Error` if the subject is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid, uuid::Error> {
        Uuid::parse_str(&self.sub)
    }

    /// Splits the scope string into individual scopes.
    #[must_use]
    pub fn scope_set(&self) -> Vec<String> {
        self.scope.split_whitespace().map(str::to_string).collect()
    }
}

/// Service for issuing and verifying signed access tokens.
///
/// Tokens are signed with HS256 over a server-side key. The service is
/// `Send + Sync` and can be shared across async tasks.
pub struct ClaimsService {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl ClaimsService {
    /// Creates a new claims service.
    ///
    /// # Arguments
    ///
    /// * `issuer` - The issuer claim value (the server's public URL)
    /// * `signing_key` - High-entropy HMAC key (32+ random bytes)
    #[must_use]
    pub fn new(issuer: impl Into<String>, signing_key: impl AsRef<[u8]>) -> Self {
        let key = signing_key.as_ref();
        Self {
            issuer: issuer.into(),
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
        }
    }

    /// Returns the issuer URL.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Signs claims into a compact token string.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn issue(&self, claims: &AccessTokenClaims) -> Result<String, ClaimsError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            ClaimsError::EncodingError {
                message: e.to_string(),
            }
        })
    }

    /// Verifies a token and returns its claims.
    ///
    /// Rejects on signature mismatch, elapsed expiry, wrong issuer, and a
    /// token type other than [`OAUTH_ACCESS_TOKEN_TYPE`]. Every failure is
    /// a typed error; nothing panics past the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`ClaimsError`] describing the verification failure.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, ClaimsError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.leeway = 0;

        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)?;
        let claims = data.claims;

        if claims.token_type != OAUTH_ACCESS_TOKEN_TYPE {
            return Err(ClaimsError::WrongTokenType {
                expected: OAUTH_ACCESS_TOKEN_TYPE,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }
}
