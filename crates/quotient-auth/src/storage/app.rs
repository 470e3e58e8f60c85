//! Registered app storage trait.
//!
//! Defines the persistence interface for registered client applications.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::RegisteredApp;

/// Storage operations for registered apps.
///
/// # Example
///
/// ```ignore
/// use quotient_auth::storage::AppStorage;
///
/// async fn example(storage: &dyn AppStorage) {
///     if let Some(app) = storage.find_by_client_id("ca_1234").await? {
///         println!("found app: {}", app.name);
///     }
/// }
/// ```
#[async_trait]
pub trait AppStorage: Send + Sync {
    /// Persists a new app.
    ///
    /// # Errors
    ///
    /// Returns an error if an app with the same `client_id` already exists
    /// or the storage operation fails.
    async fn create(&self, app: &RegisteredApp) -> AuthResult<()>;

    /// Finds an app by its record id.
    ///
    /// Returns `None` if no such app exists. Ownership is checked by the
    /// caller, not the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RegisteredApp>>;

    /// Finds an app by its public client identifier.
    ///
    /// Returns the app regardless of its `is_active` flag; callers decide
    /// whether an inactive app is acceptable for their operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredApp>>;

    /// Lists all apps registered by an owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn list_by_owner(&self, owner_user_id: Uuid) -> AuthResult<Vec<RegisteredApp>>;

    /// Replaces the stored client secret digest.
    ///
    /// The previous digest is overwritten, which makes the old secret
    /// permanently unusable.
    ///
    /// # Errors
    ///
    /// Returns an error if the app does not exist or the operation fails.
    async fn update_secret_hash(&self, id: Uuid, secret_hash: &str) -> AuthResult<()>;

    /// Deletes an app record.
    ///
    /// Cascading cleanup of the app's codes and tokens is the registry's
    /// responsibility, not the store's.
    ///
    /// # Errors
    ///
    /// Returns an error if the app does not exist or the operation fails.
    async fn delete(&self, id: Uuid) -> AuthResult<()>;
}
