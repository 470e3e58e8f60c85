//! Issued token domain type.
//!
//! One record per issuance: an access/refresh token pair created together
//! at code-exchange or refresh time.
//!
//! # Storage Security
//!
//! Neither token value is stored. Both are persisted as SHA-256 digests;
//! validation and revocation hash the presented value and look it up.
//! A record that exists but carries `revoked_at` fails every check, even
//! when the access token's signature still verifies.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::secret;

/// Access/refresh token pair stored by the token service.
///
/// A refresh exchange revokes the consumed record and creates a new one
/// (rotation); revocation is terminal and a revoked record is never
/// reactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    /// Unique identifier for this issuance record.
    pub id: Uuid,

    /// App the pair was issued to.
    pub app_id: Uuid,

    /// User who authorized the grant.
    pub user_id: Uuid,

    /// Granted scopes carried over from the code or the rotated record.
    pub scopes: Vec<String>,

    /// SHA-256 digest of the signed access token.
    pub access_token_hash: String,

    /// SHA-256 digest of the opaque refresh token.
    pub refresh_token_hash: String,

    /// When this pair was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the access token expires (issuance + 1 hour by default).
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When the refresh token expires (issuance + 30 days by default).
    #[serde(with = "time::serde::rfc3339")]
    pub refresh_expires_at: OffsetDateTime,

    /// When this record was revoked, explicitly or by rotation
    /// (None = live).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub revoked_at: Option<OffsetDateTime>,
}

impl IssuedToken {
    /// Returns `true` if the access token lifetime has elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if the refresh token lifetime has elapsed.
    #[must_use]
    pub fn is_refresh_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.refresh_expires_at
    }

    /// Returns `true` if this record has been revoked.
    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Returns `true` if the access token may still authorize requests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_expired() && !self.is_revoked()
    }

    /// Returns `true` if the refresh token may still be exchanged.
    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        !self.is_refresh_expired() && !self.is_revoked()
    }

    /// Hashes a token value for storage or lookup.
    #[must_use]
    pub fn hash_token(token: &str) -> String {
        secret::hash_secret(token)
    }

    /// Generates a cryptographically secure opaque refresh token.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 characters).
    #[must_use]
    pub fn generate_token() -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}
