//! Registered app management.
//!
//! Owner-scoped CRUD over client applications. Creation and secret
//! rotation are the only places a plaintext secret ever leaves the server,
//! and each returns it exactly once; storage only ever sees the digest.

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::secret;
use crate::storage::{AppStorage, CodeStorage, TokenStorage};
use crate::types::RegisteredApp;

/// Service managing registered apps on behalf of their owners.
///
/// Every operation is scoped to the calling owner: an app that exists but
/// belongs to someone else answers exactly like one that does not exist.
pub struct AppRegistry {
    /// App storage.
    app_storage: Arc<dyn AppStorage>,

    /// Code storage, for the delete cascade.
    code_storage: Arc<dyn CodeStorage>,

    /// Token storage, for the delete cascade.
    token_storage: Arc<dyn TokenStorage>,
}

impl AppRegistry {
    /// Creates a new app registry.
    #[must_use]
    pub fn new(
        app_storage: Arc<dyn AppStorage>,
        code_storage: Arc<dyn CodeStorage>,
        token_storage: Arc<dyn TokenStorage>,
    ) -> Self {
        Self {
            app_storage,
            code_storage,
            token_storage,
        }
    }

    /// Registers a new app and returns it together with the plaintext
    /// client secret.
    ///
    /// The secret is shown to the owner exactly once; only its digest is
    /// persisted and it cannot be retrieved again, only rotated.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn create(
        &self,
        owner_user_id: Uuid,
        name: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> AuthResult<(RegisteredApp, String)> {
        let client_secret = secret::generate_app_secret();

        let app = RegisteredApp {
            id: Uuid::new_v4(),
            owner_user_id,
            name: name.into(),
            client_id: secret::generate_client_id(),
            client_secret_hash: secret::hash_secret(&client_secret),
            redirect_uri: redirect_uri.into(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };

        self.app_storage.create(&app).await?;

        tracing::info!(app_id = %app.id, client_id = %app.client_id, "app registered");

        Ok((app, client_secret))
    }

    /// Lists all apps registered by the owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn list(&self, owner_user_id: Uuid) -> AuthResult<Vec<RegisteredApp>> {
        self.app_storage.list_by_owner(owner_user_id).await
    }

    /// Fetches a single app owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the app does not exist or belongs to a
    /// different owner.
    pub async fn get(&self, owner_user_id: Uuid, app_id: Uuid) -> AuthResult<RegisteredApp> {
        let app = self
            .app_storage
            .find_by_id(app_id)
            .await?
            .filter(|app| app.is_owned_by(owner_user_id))
            .ok_or_else(|| AuthError::not_found("App not found"))?;
        Ok(app)
    }

    /// Deletes an app, cascading to everything issued under it.
    ///
    /// All of the app's live tokens are revoked and all of its
    /// outstanding codes are discarded before the record itself goes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the app does not exist or belongs to a
    /// different owner.
    pub async fn delete(&self, owner_user_id: Uuid, app_id: Uuid) -> AuthResult<()> {
        let app = self.get(owner_user_id, app_id).await?;

        let tokens = self.token_storage.revoke_by_app(app.id).await?;
        let codes = self.code_storage.delete_by_app(app.id).await?;
        self.app_storage.delete(app.id).await?;

        tracing::info!(
            app_id = %app.id,
            revoked_tokens = tokens,
            discarded_codes = codes,
            "app deleted"
        );

        Ok(())
    }

    /// Replaces the app's client secret and returns the new plaintext.
    ///
    /// The old secret is permanently unusable from the moment the digest
    /// is replaced. The `client_id` is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the app does not exist or belongs to a
    /// different owner.
    pub async fn regenerate_secret(
        &self,
        owner_user_id: Uuid,
        app_id: Uuid,
    ) -> AuthResult<String> {
        let app = self.get(owner_user_id, app_id).await?;

        let client_secret = secret::generate_app_secret();
        self.app_storage
            .update_secret_hash(app.id, &secret::hash_secret(&client_secret))
            .await?;

        tracing::info!(app_id = %app.id, "client secret rotated");

        Ok(client_secret)
    }
}
