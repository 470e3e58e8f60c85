//! Token service: exchange, refresh, validation, and revocation.
//!
//! This is the server-to-server half of the authorization-code flow. The
//! service authenticates the client app, consumes grants, and manages the
//! issued access/refresh token pairs.
//!
//! # Usage
//!
//! ```ignore
//! use quotient_auth::token::TokenService;
//!
//! let service = TokenService::new(app_storage, code_storage, token_storage, config);
//! let response = service.exchange(&request).await?;
//! ```
//!
//! # Security
//!
//! - Client secrets are verified in constant time
//! - Grant failures collapse into a single message per grant type, so the
//!   response does not reveal which specific check failed
//! - Codes are consumed and refresh tokens rotated through conditional
//!   writes: concurrent replays have exactly one winner
//! - Rotation revokes the old record before issuing the new pair; if the
//!   issuance then fails the old refresh token stays revoked
//! - Token and code values are never logged

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::oauth::pkce::PkceChallenge;
use crate::oauth::token::{RevocationRequest, TokenRequest, TokenResponse, TokenTypeHint};
use crate::storage::{AppStorage, CodeStorage, TokenStorage};
use crate::token::claims::{AccessTokenClaims, ClaimsService};
use crate::types::{AuthorizationCode, CodeChallengeMethod, IssuedToken, RegisteredApp};

/// Collapsed failure message for the authorization_code grant.
const INVALID_CODE_GRANT: &str = "invalid or expired authorization code";

/// Collapsed failure message for the refresh_token grant.
const INVALID_REFRESH_GRANT: &str = "invalid or expired refresh token";

/// The identity a validated access token grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    /// User who authorized the grant.
    pub user_id: Uuid,

    /// Client the token was issued to.
    pub client_id: String,

    /// Granted scopes.
    pub scopes: Vec<String>,
}

/// Service handling token exchange, validation, and revocation.
pub struct TokenService {
    /// App storage for client authentication.
    app_storage: Arc<dyn AppStorage>,

    /// Code storage for consuming authorization codes.
    code_storage: Arc<dyn CodeStorage>,

    /// Token storage for issued pairs.
    token_storage: Arc<dyn TokenStorage>,

    /// Signed-claims issuer/verifier.
    claims: ClaimsService,

    /// Service configuration.
    config: AuthConfig,
}

impl TokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        app_storage: Arc<dyn AppStorage>,
        code_storage: Arc<dyn CodeStorage>,
        token_storage: Arc<dyn TokenStorage>,
        config: AuthConfig,
    ) -> Self {
        let claims = ClaimsService::new(config.issuer.clone(), config.signing_key.as_bytes());
        Self {
            app_storage,
            code_storage,
            token_storage,
            claims,
            config,
        }
    }

    /// Handles a token request, dispatching on `grant_type`.
    ///
    /// # Errors
    ///
    /// - `InvalidClient` - client authentication failed
    /// - `InvalidRequest` - a required field for the grant is missing
    /// - `InvalidGrant` - the code or refresh token cannot be redeemed
    /// - `UnsupportedGrantType` - any grant other than the two supported
    pub async fn exchange(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        match request.grant_type.as_str() {
            "authorization_code" => self.exchange_code(request).await,
            "refresh_token" => self.refresh(request).await,
            other => Err(AuthError::unsupported_grant_type(other)),
        }
    }

    /// Exchanges an authorization code for a token pair.
    async fn exchange_code(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        // 1. Authenticate the client.
        let app = self
            .authenticate_app(&request.client_id, &request.client_secret)
            .await?;

        let code_value = request
            .code
            .as_deref()
            .ok_or_else(|| AuthError::invalid_request("Missing code parameter"))?;

        // 2. Locate the code for this app. Wrong app, consumed, and
        // expired all collapse into the same answer.
        let code_hash = AuthorizationCode::hash_code(code_value);
        let code = self
            .code_storage
            .find_by_hash(app.id, &code_hash)
            .await?
            .ok_or_else(|| AuthError::invalid_grant(INVALID_CODE_GRANT))?;

        if !code.is_exchangeable() {
            return Err(AuthError::invalid_grant(INVALID_CODE_GRANT));
        }

        // 3. A redirect URI supplied at exchange time must equal the one
        // bound at authorize time.
        if let Some(redirect_uri) = request.redirect_uri.as_deref() {
            if redirect_uri != code.redirect_uri {
                return Err(AuthError::invalid_grant(INVALID_CODE_GRANT));
            }
        }

        // 4. Verify proof of possession when the code carries a challenge.
        self.verify_pkce(&code, request.code_verifier.as_deref())?;

        // 5. Claim the code. The conditional write is what enforces
        // single use: when two exchanges race, exactly one gets `true`.
        if !self.code_storage.mark_used(code.id).await? {
            return Err(AuthError::invalid_grant(INVALID_CODE_GRANT));
        }

        tracing::debug!(
            client_id = %app.client_id,
            code_id = %code.id,
            "authorization code consumed"
        );

        // 6. Issue the pair bound to the code's user and scopes.
        self.issue_pair(&app, code.user_id, code.scopes).await
    }

    /// Exchanges a refresh token for a new pair, rotating the old record.
    async fn refresh(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        // 1. Authenticate the client.
        let app = self
            .authenticate_app(&request.client_id, &request.client_secret)
            .await?;

        let refresh_value = request
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::invalid_request("Missing refresh_token parameter"))?;

        // 2. Locate the record. Wrong app, revoked, and expired collapse
        // into the same answer.
        let refresh_hash = IssuedToken::hash_token(refresh_value);
        let token = self
            .token_storage
            .find_by_refresh_hash(&refresh_hash)
            .await?
            .ok_or_else(|| AuthError::invalid_grant(INVALID_REFRESH_GRANT))?;

        if token.app_id != app.id || !token.is_refreshable() {
            return Err(AuthError::invalid_grant(INVALID_REFRESH_GRANT));
        }

        // 3. Rotate: revoke the consumed record before issuing anything.
        // If issuance fails below, the old refresh token stays revoked;
        // a replayed refresh token must never succeed twice.
        if !self.token_storage.revoke(token.id).await? {
            return Err(AuthError::invalid_grant(INVALID_REFRESH_GRANT));
        }

        tracing::debug!(
            client_id = %app.client_id,
            token_id = %token.id,
            "refresh token rotated"
        );

        // 4. Issue the replacement pair under the same user and scopes.
        self.issue_pair(&app, token.user_id, token.scopes).await
    }

    /// Validates a presented access token.
    ///
    /// Signature verification alone is not sufficient: the backing record
    /// must exist, be unrevoked, and be unexpired. This closes the gap
    /// where a token is cryptographically valid but has been revoked.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for every failure mode (bad signature,
    /// wrong token type, expired, revoked, or no backing record).
    pub async fn validate(&self, access_token: &str) -> AuthResult<AccessContext> {
        let claims = self.claims.verify(access_token).map_err(|e| {
            tracing::debug!(reason = %e, "access token rejected");
            AuthError::unauthorized("Invalid access token")
        })?;

        let access_hash = IssuedToken::hash_token(access_token);
        let record = self
            .token_storage
            .find_by_access_hash(&access_hash)
            .await?
            .ok_or_else(|| AuthError::unauthorized("Invalid access token"))?;

        if !record.is_active() {
            return Err(AuthError::unauthorized("Invalid access token"));
        }

        Ok(AccessContext {
            user_id: record.user_id,
            client_id: claims.client_id,
            scopes: record.scopes,
        })
    }

    /// Revokes a token (RFC 7009).
    ///
    /// Always reports success: an unknown or already-revoked token is
    /// treated as already being in the desired end state. The
    /// `token_type_hint` picks which digest column to try first; a miss
    /// falls through to the other.
    ///
    /// # Errors
    ///
    /// Only storage faults surface; protocol-level misses never error.
    pub async fn revoke(&self, request: &RevocationRequest) -> AuthResult<()> {
        let hash = IssuedToken::hash_token(&request.token);

        let record = match request.token_type_hint {
            Some(TokenTypeHint::RefreshToken) => match self
                .token_storage
                .find_by_refresh_hash(&hash)
                .await?
            {
                Some(record) => Some(record),
                None => self.token_storage.find_by_access_hash(&hash).await?,
            },
            _ => match self.token_storage.find_by_access_hash(&hash).await? {
                Some(record) => Some(record),
                None => self.token_storage.find_by_refresh_hash(&hash).await?,
            },
        };

        if let Some(record) = record {
            // Already-revoked records return false here; both outcomes
            // are the desired end state.
            let newly_revoked = self.token_storage.revoke(record.id).await?;
            if newly_revoked {
                tracing::debug!(token_id = %record.id, "token revoked");
            }
        }

        Ok(())
    }

    /// Revokes every live token and discards every outstanding code for
    /// an `(app, user)` pair.
    ///
    /// Used when a user withdraws consent for a connected app.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage operation fails.
    pub async fn revoke_app_authorization(&self, user_id: Uuid, app_id: Uuid) -> AuthResult<()> {
        let tokens = self.token_storage.revoke_by_app_user(app_id, user_id).await?;
        let codes = self.code_storage.delete_by_app_user(app_id, user_id).await?;

        tracing::info!(
            app_id = %app_id,
            revoked_tokens = tokens,
            discarded_codes = codes,
            "app authorization withdrawn"
        );

        Ok(())
    }

    /// Resolves and authenticates a client app.
    ///
    /// Unknown client, inactive app, and secret mismatch all collapse
    /// into the same `InvalidClient` answer.
    async fn authenticate_app(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> AuthResult<RegisteredApp> {
        let app = self
            .app_storage
            .find_by_client_id(client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("Client authentication failed"))?;

        if !app.is_active {
            return Err(AuthError::invalid_client("Client authentication failed"));
        }

        if !crate::secret::verify_secret(client_secret, &app.client_secret_hash) {
            return Err(AuthError::invalid_client("Client authentication failed"));
        }

        Ok(app)
    }

    /// Verifies the PKCE binding of a code, when present.
    fn verify_pkce(
        &self,
        code: &AuthorizationCode,
        code_verifier: Option<&str>,
    ) -> AuthResult<()> {
        let Some(challenge) = code.code_challenge.as_deref() else {
            return Ok(());
        };

        let verifier = code_verifier
            .ok_or_else(|| AuthError::invalid_grant(INVALID_CODE_GRANT))?;

        let method = code
            .code_challenge_method
            .unwrap_or(CodeChallengeMethod::Plain);

        PkceChallenge::new(challenge.to_string())
            .verify(verifier, method)
            .map_err(|_| AuthError::invalid_grant(INVALID_CODE_GRANT))
    }

    /// Issues a new access/refresh pair and persists its record.
    ///
    /// Shared by both grants. The record carries digests of both values;
    /// the plaintext pair goes back to the client exactly once.
    async fn issue_pair(
        &self,
        app: &RegisteredApp,
        user_id: Uuid,
        scopes: Vec<String>,
    ) -> AuthResult<TokenResponse> {
        let now = OffsetDateTime::now_utc();
        let scope = scopes.join(" ");

        let claims = AccessTokenClaims::new(
            self.claims.issuer(),
            user_id,
            app.client_id.clone(),
            scope.clone(),
            self.config.access_token_lifetime,
        );

        let access_token = self
            .claims
            .issue(&claims)
            .map_err(|e| AuthError::internal(format!("Failed to sign access token: {e}")))?;

        let refresh_token = IssuedToken::generate_token();

        let record = IssuedToken {
            id: Uuid::new_v4(),
            app_id: app.id,
            user_id,
            scopes,
            access_token_hash: IssuedToken::hash_token(&access_token),
            refresh_token_hash: IssuedToken::hash_token(&refresh_token),
            created_at: now,
            expires_at: now + self.config.access_token_lifetime,
            refresh_expires_at: now + self.config.refresh_token_lifetime,
            revoked_at: None,
        };

        self.token_storage.create(&record).await?;

        Ok(TokenResponse::new(
            access_token,
            self.config.access_token_lifetime.as_secs(),
            refresh_token,
            scope,
        ))
    }
}
