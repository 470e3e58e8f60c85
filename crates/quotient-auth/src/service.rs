//! Authorization server façade.
//!
//! [`OAuthService`] wires the app registry, the authorization code issuer,
//! and the token service together behind the operations the external HTTP
//! layer calls: `authorize`, `token`, `revoke`, `validate`, and the
//! connected-apps views. The HTTP layer parses and validates requests into
//! the typed calls here; this crate owns everything from that point down
//! to the storage traits.
//!
//! # Usage
//!
//! ```ignore
//! use quotient_auth::{AuthConfig, OAuthService};
//!
//! let service = OAuthService::new(app_storage, code_storage, token_storage, config);
//!
//! let redirect = service.authorize(&authorize_request, session_user).await?;
//! let tokens = service.token(&token_request).await?;
//! let context = service.validate(&bearer_token).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::oauth::authorize::{AuthorizeRequest, AuthorizeResponse};
use crate::oauth::service::AuthorizationService;
use crate::oauth::token::{RevocationRequest, TokenRequest, TokenResponse};
use crate::registry::AppRegistry;
use crate::storage::{AppStorage, CodeStorage, TokenStorage};
use crate::token::service::{AccessContext, TokenService};
use crate::types::{IssuedToken, RegisteredApp};

/// An app a user has granted access to, as shown on the connected-apps
/// screen.
#[derive(Debug, Clone)]
pub struct AuthorizedApp {
    /// The connected app.
    pub app: RegisteredApp,

    /// Scopes of the most recent live issuance.
    pub scopes: Vec<String>,

    /// When the most recent live issuance was created.
    pub authorized_at: OffsetDateTime,
}

/// Façade over the authorization server's operations.
pub struct OAuthService {
    app_storage: Arc<dyn AppStorage>,
    token_storage: Arc<dyn TokenStorage>,
    registry: AppRegistry,
    authorization: AuthorizationService,
    tokens: TokenService,
}

impl OAuthService {
    /// Creates the façade from the storage trio and configuration.
    #[must_use]
    pub fn new(
        app_storage: Arc<dyn AppStorage>,
        code_storage: Arc<dyn CodeStorage>,
        token_storage: Arc<dyn TokenStorage>,
        config: AuthConfig,
    ) -> Self {
        let registry = AppRegistry::new(
            app_storage.clone(),
            code_storage.clone(),
            token_storage.clone(),
        );
        let authorization = AuthorizationService::new(
            app_storage.clone(),
            code_storage.clone(),
            config.clone(),
        );
        let tokens = TokenService::new(
            app_storage.clone(),
            code_storage,
            token_storage.clone(),
            config,
        );

        Self {
            app_storage,
            token_storage,
            registry,
            authorization,
            tokens,
        }
    }

    /// App registration, listing, deletion, and secret rotation.
    #[must_use]
    pub fn apps(&self) -> &AppRegistry {
        &self.registry
    }

    /// Issues an authorization code for a grant approved by `user_id` and
    /// returns the redirect back to the client.
    ///
    /// # Errors
    ///
    /// See [`AuthorizationService::authorize`].
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
        user_id: Uuid,
    ) -> AuthResult<AuthorizeResponse> {
        self.authorization.authorize(request, user_id).await
    }

    /// Handles a token request (code exchange or refresh rotation).
    ///
    /// # Errors
    ///
    /// See [`TokenService::exchange`].
    pub async fn token(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        self.tokens.exchange(request).await
    }

    /// Revokes a token; always succeeds for protocol-level misses.
    ///
    /// # Errors
    ///
    /// Only storage faults surface.
    pub async fn revoke(&self, request: &RevocationRequest) -> AuthResult<()> {
        self.tokens.revoke(request).await
    }

    /// Validates a presented access token.
    ///
    /// # Errors
    ///
    /// See [`TokenService::validate`].
    pub async fn validate(&self, access_token: &str) -> AuthResult<AccessContext> {
        self.tokens.validate(access_token).await
    }

    /// Lists the apps `user_id` currently has live grants for.
    ///
    /// Grouped per app from the user's live token records; the most
    /// recent issuance supplies the scopes and timestamp. Apps deleted
    /// since issuance are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub async fn authorized_apps(&self, user_id: Uuid) -> AuthResult<Vec<AuthorizedApp>> {
        let tokens = self.token_storage.list_active_by_user(user_id).await?;

        let mut authorized = Vec::new();
        for (app_id, scopes, authorized_at) in latest_grant_per_app(tokens) {
            if let Some(app) = self.app_storage.find_by_id(app_id).await? {
                authorized.push(AuthorizedApp {
                    app,
                    scopes,
                    authorized_at,
                });
            }
        }

        authorized.sort_by(|a, b| b.authorized_at.cmp(&a.authorized_at));
        Ok(authorized)
    }

    /// Withdraws `user_id`'s consent for an app: bulk-revokes the pair's
    /// tokens and discards its outstanding codes.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub async fn revoke_app_authorization(&self, user_id: Uuid, app_id: Uuid) -> AuthResult<()> {
        self.tokens.revoke_app_authorization(user_id, app_id).await
    }
}

/// Collapses a user's live token records to one entry per app, keeping
/// the most recent issuance's scopes and timestamp.
fn latest_grant_per_app(tokens: Vec<IssuedToken>) -> Vec<(Uuid, Vec<String>, OffsetDateTime)> {
    let mut latest: HashMap<Uuid, IssuedToken> = HashMap::new();
    for token in tokens {
        match latest.get(&token.app_id) {
            Some(existing) if existing.created_at >= token.created_at => {}
            _ => {
                latest.insert(token.app_id, token);
            }
        }
    }

    latest
        .into_values()
        .map(|t| (t.app_id, t.scopes, t.created_at))
        .collect()
}
