//! Registered app domain type.
//!
//! A registered app is a third-party client application that an end-user
//! account can grant scoped access to via the authorization-code flow.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// A client application registered by an app owner.
///
/// The `client_id` is public and immutable for the lifetime of the app.
/// The client secret is never stored; only its digest is persisted, and
/// the plaintext is shown to the owner exactly once at creation or
/// rotation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredApp {
    /// Unique identifier for this app record.
    pub id: Uuid,

    /// User account that owns (registered) this app.
    pub owner_user_id: Uuid,

    /// Human-readable app name shown on consent and dashboard screens.
    pub name: String,

    /// Public client identifier, globally unique and immutable.
    pub client_id: String,

    /// SHA-256 digest of the client secret.
    /// Replaced only by explicit rotation; the old secret is permanently
    /// unusable from that moment.
    pub client_secret_hash: String,

    /// Registered redirect URI. Matched byte-for-byte at authorize and
    /// exchange time; no prefix or wildcard matching.
    pub redirect_uri: String,

    /// Whether the app may participate in the authorization flow.
    pub is_active: bool,

    /// When this app was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl RegisteredApp {
    /// Returns `true` if the given owner may manage this app.
    #[must_use]
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_user_id == user_id
    }
}
