//! In-memory storage backend for the Quotient authorization server.
//!
//! This crate implements the `quotient-auth` storage traits over
//! `RwLock`-guarded maps. It backs tests and local development; production
//! wires the same traits to a durable store.
//!
//! The two concurrency-critical operations (`CodeStorage::mark_used` and
//! `TokenStorage::revoke`) run their check-and-set inside a single write
//! lock, which gives concurrent callers the same exactly-one-winner
//! behavior a SQL backend gets from `UPDATE ... WHERE ... IS NULL`.
//!
//! # Example
//!
//! ```ignore
//! use quotient_auth::{AuthConfig, OAuthService};
//! use quotient_auth_memory::memory_storage;
//!
//! let (apps, codes, tokens) = memory_storage();
//! let service = OAuthService::new(apps, codes, tokens, AuthConfig::default());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use quotient_auth::error::AuthError;
use quotient_auth::storage::{AppStorage, CodeStorage, TokenStorage};
use quotient_auth::types::{AuthorizationCode, IssuedToken, RegisteredApp};
use quotient_auth::AuthResult;

/// Creates the storage trio as trait objects ready for
/// `OAuthService::new`.
#[must_use]
pub fn memory_storage() -> (
    Arc<dyn AppStorage>,
    Arc<dyn CodeStorage>,
    Arc<dyn TokenStorage>,
) {
    (
        Arc::new(MemoryAppStorage::new()),
        Arc::new(MemoryCodeStorage::new()),
        Arc::new(MemoryTokenStorage::new()),
    )
}

/// In-memory [`AppStorage`] implementation.
#[derive(Default)]
pub struct MemoryAppStorage {
    apps: RwLock<HashMap<Uuid, RegisteredApp>>,
}

impl MemoryAppStorage {
    /// Creates an empty app store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AppStorage for MemoryAppStorage {
    async fn create(&self, app: &RegisteredApp) -> AuthResult<()> {
        let mut apps = self.apps.write().unwrap();
        if apps.values().any(|a| a.client_id == app.client_id) {
            return Err(AuthError::storage(format!(
                "duplicate client_id: {}",
                app.client_id
            )));
        }
        apps.insert(app.id, app.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RegisteredApp>> {
        Ok(self.apps.read().unwrap().get(&id).cloned())
    }

    async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredApp>> {
        Ok(self
            .apps
            .read()
            .unwrap()
            .values()
            .find(|a| a.client_id == client_id)
            .cloned())
    }

    async fn list_by_owner(&self, owner_user_id: Uuid) -> AuthResult<Vec<RegisteredApp>> {
        let mut apps: Vec<RegisteredApp> = self
            .apps
            .read()
            .unwrap()
            .values()
            .filter(|a| a.owner_user_id == owner_user_id)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn update_secret_hash(&self, id: Uuid, secret_hash: &str) -> AuthResult<()> {
        let mut apps = self.apps.write().unwrap();
        let app = apps
            .get_mut(&id)
            .ok_or_else(|| AuthError::storage(format!("app not found: {id}")))?;
        app.client_secret_hash = secret_hash.to_string();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> AuthResult<()> {
        let mut apps = self.apps.write().unwrap();
        apps.remove(&id)
            .map(|_| ())
            .ok_or_else(|| AuthError::storage(format!("app not found: {id}")))
    }
}

/// In-memory [`CodeStorage`] implementation.
#[derive(Default)]
pub struct MemoryCodeStorage {
    codes: RwLock<HashMap<Uuid, AuthorizationCode>>,
}

impl MemoryCodeStorage {
    /// Creates an empty code store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStorage for MemoryCodeStorage {
    async fn create(&self, code: &AuthorizationCode) -> AuthResult<()> {
        self.codes.write().unwrap().insert(code.id, code.clone());
        Ok(())
    }

    async fn find_by_hash(
        &self,
        app_id: Uuid,
        code_hash: &str,
    ) -> AuthResult<Option<AuthorizationCode>> {
        Ok(self
            .codes
            .read()
            .unwrap()
            .values()
            .find(|c| c.app_id == app_id && c.code_hash == code_hash)
            .cloned())
    }

    async fn mark_used(&self, id: Uuid) -> AuthResult<bool> {
        // Check-and-set under one write lock: the equivalent of
        // "UPDATE ... SET used_at = now() WHERE id = $1 AND used_at IS NULL".
        let mut codes = self.codes.write().unwrap();
        let code = codes
            .get_mut(&id)
            .ok_or_else(|| AuthError::storage(format!("code not found: {id}")))?;
        if code.used_at.is_some() {
            return Ok(false);
        }
        code.used_at = Some(OffsetDateTime::now_utc());
        Ok(true)
    }

    async fn delete_by_app(&self, app_id: Uuid) -> AuthResult<u64> {
        let mut codes = self.codes.write().unwrap();
        let before = codes.len();
        codes.retain(|_, c| c.app_id != app_id);
        Ok((before - codes.len()) as u64)
    }

    async fn delete_by_app_user(&self, app_id: Uuid, user_id: Uuid) -> AuthResult<u64> {
        let mut codes = self.codes.write().unwrap();
        let before = codes.len();
        codes.retain(|_, c| !(c.app_id == app_id && c.user_id == user_id));
        Ok((before - codes.len()) as u64)
    }
}

/// In-memory [`TokenStorage`] implementation.
#[derive(Default)]
pub struct MemoryTokenStorage {
    tokens: RwLock<HashMap<Uuid, IssuedToken>>,
}

impl MemoryTokenStorage {
    /// Creates an empty token store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn create(&self, token: &IssuedToken) -> AuthResult<()> {
        self.tokens.write().unwrap().insert(token.id, token.clone());
        Ok(())
    }

    async fn find_by_access_hash(&self, access_hash: &str) -> AuthResult<Option<IssuedToken>> {
        Ok(self
            .tokens
            .read()
            .unwrap()
            .values()
            .find(|t| t.access_token_hash == access_hash)
            .cloned())
    }

    async fn find_by_refresh_hash(&self, refresh_hash: &str) -> AuthResult<Option<IssuedToken>> {
        Ok(self
            .tokens
            .read()
            .unwrap()
            .values()
            .find(|t| t.refresh_token_hash == refresh_hash)
            .cloned())
    }

    async fn revoke(&self, id: Uuid) -> AuthResult<bool> {
        // Check-and-set under one write lock, matching
        // "UPDATE ... SET revoked_at = now() WHERE id = $1 AND revoked_at IS NULL".
        let mut tokens = self.tokens.write().unwrap();
        let token = tokens
            .get_mut(&id)
            .ok_or_else(|| AuthError::storage(format!("token not found: {id}")))?;
        if token.revoked_at.is_some() {
            return Ok(false);
        }
        token.revoked_at = Some(OffsetDateTime::now_utc());
        Ok(true)
    }

    async fn revoke_by_app(&self, app_id: Uuid) -> AuthResult<u64> {
        let mut tokens = self.tokens.write().unwrap();
        let mut count = 0u64;
        for token in tokens.values_mut() {
            if token.app_id == app_id && token.revoked_at.is_none() {
                token.revoked_at = Some(OffsetDateTime::now_utc());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn revoke_by_app_user(&self, app_id: Uuid, user_id: Uuid) -> AuthResult<u64> {
        let mut tokens = self.tokens.write().unwrap();
        let mut count = 0u64;
        for token in tokens.values_mut() {
            if token.app_id == app_id && token.user_id == user_id && token.revoked_at.is_none() {
                token.revoked_at = Some(OffsetDateTime::now_utc());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn list_active_by_user(&self, user_id: Uuid) -> AuthResult<Vec<IssuedToken>> {
        let mut tokens: Vec<IssuedToken> = self
            .tokens
            .read()
            .unwrap()
            .values()
            .filter(|t| t.user_id == user_id && t.is_refreshable())
            .cloned()
            .collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tokens)
    }
}
