//! Authorization code storage trait.
//!
//! # Security Considerations
//!
//! - Codes are stored as SHA-256 digests only
//! - Consumption must be a conditional write: under concurrent exchange
//!   attempts against the same code, exactly one caller may win

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::AuthorizationCode;

/// Storage operations for authorization codes.
#[async_trait]
pub trait CodeStorage: Send + Sync {
    /// Persists a new authorization code.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()>;

    /// Finds a code issued to the given app by the digest of its value.
    ///
    /// Returns codes regardless of expiry and consumption status; callers
    /// check `is_exchangeable()` and claim the code via [`mark_used`]
    /// before acting on it.
    ///
    /// [`mark_used`]: CodeStorage::mark_used
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_hash(
        &self,
        app_id: Uuid,
        code_hash: &str,
    ) -> AuthResult<Option<AuthorizationCode>>;

    /// Marks a code as consumed, conditional on it being unconsumed.
    ///
    /// This is the single-use enforcement point: the write must be atomic
    /// ("set `used_at` = now where `used_at` is still null"). Returns
    /// `true` if this call performed the write, `false` if the code was
    /// already consumed. When two exchanges race, exactly one observes
    /// `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the code does not exist or the operation fails.
    async fn mark_used(&self, id: Uuid) -> AuthResult<bool>;

    /// Discards all codes issued to an app.
    ///
    /// Used when the app is deleted. Returns the number of codes removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn delete_by_app(&self, app_id: Uuid) -> AuthResult<u64>;

    /// Discards all codes issued to an `(app, user)` pair.
    ///
    /// Used when a user withdraws consent for a connected app. Returns the
    /// number of codes removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation fails.
    async fn delete_by_app_user(&self, app_id: Uuid, user_id: Uuid) -> AuthResult<u64>;
}
