//! Issued token storage trait.
//!
//! # Security Considerations
//!
//! - Both token values are stored as SHA-256 digests only
//! - Revocation must be a conditional write so refresh rotation has
//!   exactly one winner under concurrent replay attempts
//! - A record's presence with `revoked_at` unset is what makes a
//!   structurally valid access token actually authoritative

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::IssuedToken;

/// Storage operations for issued access/refresh token pairs.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    /// Persists a new token pair record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn create(&self, token: &IssuedToken) -> AuthResult<()>;

    /// Finds a record by the digest of its access token.
    ///
    /// Returns records regardless of expiry/revocation status; callers
    /// check `is_active()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_access_hash(&self, access_hash: &str) -> AuthResult<Option<IssuedToken>>;

    /// Finds a record by the digest of its refresh token.
    ///
    /// Returns records regardless of expiry/revocation status; callers
    /// check `is_refreshable()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_refresh_hash(&self, refresh_hash: &str) -> AuthResult<Option<IssuedToken>>;

    /// Revokes a record, conditional on it being unrevoked.
    ///
    /// The write must be atomic ("set `revoked_at` = now where
    /// `revoked_at` is still null"). Returns `true` if this call performed
    /// the write, `false` if the record was already revoked. Refresh
    /// rotation relies on this to give concurrent replays exactly one
    /// winner, and revocation is terminal either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not exist or the operation
    /// fails.
    async fn revoke(&self, id: Uuid) -> AuthResult<bool>;

    /// Revokes all live records issued to an app.
    ///
    /// Used when the app is deleted or its secret cannot be trusted.
    /// Returns the number of records revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn revoke_by_app(&self, app_id: Uuid) -> AuthResult<u64>;

    /// Revokes all live records issued to an `(app, user)` pair.
    ///
    /// Used when a user withdraws consent for a connected app. Returns the
    /// number of records revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn revoke_by_app_user(&self, app_id: Uuid, user_id: Uuid) -> AuthResult<u64>;

    /// Lists all live (unrevoked, refresh-unexpired) records for a user,
    /// newest first.
    ///
    /// Backs the user's connected-apps view.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn list_active_by_user(&self, user_id: Uuid) -> AuthResult<Vec<IssuedToken>>;
}
