//! Authorization code issuer.
//!
//! Validates an authorization request from an authenticated end-user,
//! issues a single-use code bound to the approved grant, and builds the
//! redirect back to the client.
//!
//! # Security Requirements
//!
//! - The redirect URI must match the registration byte-for-byte
//! - Codes are 256-bit random values, stored only as digests
//! - Codes expire after a configurable lifetime (default 10 minutes)
//! - Code values are never logged

use std::sync::Arc;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::AuthResult;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::oauth::authorize::{AuthorizeRequest, AuthorizeResponse};
use crate::storage::{AppStorage, CodeStorage};
use crate::types::{AuthorizationCode, CodeChallengeMethod};

/// Service handling the authorize step of the authorization-code flow.
pub struct AuthorizationService {
    /// App storage for resolving the requesting client.
    app_storage: Arc<dyn AppStorage>,

    /// Code storage for persisting issued codes.
    code_storage: Arc<dyn CodeStorage>,

    /// Server configuration (code lifetime).
    config: AuthConfig,
}

impl AuthorizationService {
    /// Creates a new authorization service.
    #[must_use]
    pub fn new(
        app_storage: Arc<dyn AppStorage>,
        code_storage: Arc<dyn CodeStorage>,
        config: AuthConfig,
    ) -> Self {
        Self {
            app_storage,
            code_storage,
            config,
        }
    }

    /// Processes an authorization request approved by `user_id`.
    ///
    /// The caller must already be an authenticated end-user; this method
    /// has no unauthenticated path.
    ///
    /// # Returns
    ///
    /// The redirect URL carrying the freshly issued code (and the echoed
    /// `state`, if the client supplied one).
    ///
    /// # Errors
    ///
    /// - `InvalidClient` - unknown `client_id` or inactive app
    /// - `InvalidRequest` - redirect URI not matching the registration, or
    ///   malformed PKCE parameters
    /// - `UnsupportedResponseType` - `response_type` is not "code"
    pub async fn authorize(
        &self,
        request: &AuthorizeRequest,
        user_id: Uuid,
    ) -> AuthResult<AuthorizeResponse> {
        // 1. Resolve the app; it must exist and be active.
        let app = self
            .app_storage
            .find_by_client_id(&request.client_id)
            .await?
            .ok_or_else(|| AuthError::invalid_client("Unknown client"))?;

        if !app.is_active {
            return Err(AuthError::invalid_client("Client is inactive"));
        }

        // 2. The presented redirect URI must equal the registered one.
        // No prefix or wildcard matching.
        if request.redirect_uri != app.redirect_uri {
            return Err(AuthError::invalid_request(
                "redirect_uri does not match the registered redirect URI",
            ));
        }

        // 3. Only the authorization-code grant is supported.
        if request.response_type != "code" {
            return Err(AuthError::unsupported_response_type(&request.response_type));
        }

        // 4. Requested scopes are granted verbatim.
        let scopes = request.scope_set();

        // 5. Validate PKCE parameters when present. A challenge without a
        // method defaults to "plain" per RFC 7636 section 4.3.
        let (code_challenge, code_challenge_method) = match (
            request.code_challenge.as_deref(),
            request.code_challenge_method.as_deref(),
        ) {
            (None, None) => (None, None),
            (None, Some(_)) => {
                return Err(AuthError::invalid_request(
                    "code_challenge_method supplied without code_challenge",
                ));
            }
            (Some(challenge), None) => {
                (Some(challenge.to_string()), Some(CodeChallengeMethod::Plain))
            }
            (Some(challenge), Some(method)) => {
                let method = CodeChallengeMethod::parse(method).ok_or_else(|| {
                    AuthError::invalid_request(
                        "code_challenge_method must be \"S256\" or \"plain\"",
                    )
                })?;
                (Some(challenge.to_string()), Some(method))
            }
        };

        // 6. Issue the code: random value, persist digest plus binding.
        let code_value = AuthorizationCode::generate_code();
        let now = OffsetDateTime::now_utc();

        let code = AuthorizationCode {
            id: Uuid::new_v4(),
            app_id: app.id,
            user_id,
            code_hash: AuthorizationCode::hash_code(&code_value),
            redirect_uri: request.redirect_uri.clone(),
            scopes,
            code_challenge,
            code_challenge_method,
            created_at: now,
            expires_at: now + self.config.authorization_code_lifetime,
            used_at: None,
        };

        self.code_storage.create(&code).await?;

        tracing::debug!(
            client_id = %request.client_id,
            code_id = %code.id,
            pkce = code.code_challenge_method.map(|m| m.as_str()).unwrap_or("none"),
            "issued authorization code"
        );

        AuthorizeResponse::build(&request.redirect_uri, &code_value, request.state.as_deref())
            .map_err(|e| AuthError::internal(format!("Failed to build redirect URL: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret;
    use crate::types::RegisteredApp;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::RwLock;

    struct MockAppStorage {
        apps: RwLock<HashMap<String, RegisteredApp>>,
    }

    impl MockAppStorage {
        fn new() -> Self {
            Self {
                apps: RwLock::new(HashMap::new()),
            }
        }

        fn add_app(&self, app: RegisteredApp) {
            self.apps.write().unwrap().insert(app.client_id.clone(), app);
        }
    }

    #[async_trait]
    impl AppStorage for MockAppStorage {
        async fn create(&self, app: &RegisteredApp) -> AuthResult<()> {
            self.add_app(app.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<RegisteredApp>> {
            Ok(self
                .apps
                .read()
                .unwrap()
                .values()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn find_by_client_id(&self, client_id: &str) -> AuthResult<Option<RegisteredApp>> {
            Ok(self.apps.read().unwrap().get(client_id).cloned())
        }

        async fn list_by_owner(&self, owner_user_id: Uuid) -> AuthResult<Vec<RegisteredApp>> {
            Ok(self
                .apps
                .read()
                .unwrap()
                .values()
                .filter(|a| a.owner_user_id == owner_user_id)
                .cloned()
                .collect())
        }

        async fn update_secret_hash(&self, id: Uuid, secret_hash: &str) -> AuthResult<()> {
            let mut apps = self.apps.write().unwrap();
            let app = apps
                .values_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| AuthError::not_found("App not found"))?;
            app.client_secret_hash = secret_hash.to_string();
            Ok(())
        }

        async fn delete(&self, id: Uuid) -> AuthResult<()> {
            self.apps.write().unwrap().retain(|_, a| a.id != id);
            Ok(())
        }
    }

    struct MockCodeStorage {
        codes: RwLock<Vec<AuthorizationCode>>,
    }

    impl MockCodeStorage {
        fn new() -> Self {
            Self {
                codes: RwLock::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CodeStorage for MockCodeStorage {
        async fn create(&self, code: &AuthorizationCode) -> AuthResult<()> {
            self.codes.write().unwrap().push(code.clone());
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
                .iter()
                .find(|c| c.app_id == app_id && c.code_hash == code_hash)
                .cloned())
        }

        async fn mark_used(&self, id: Uuid) -> AuthResult<bool> {
            let mut codes = self.codes.write().unwrap();
            let code = codes
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| AuthError::invalid_grant("invalid or expired authorization code"))?;
            if code.used_at.is_some() {
                return Ok(false);
            }
            code.used_at = Some(OffsetDateTime::now_utc());
            Ok(true)
        }

        async fn delete_by_app(&self, app_id: Uuid) -> AuthResult<u64> {
            let mut codes = self.codes.write().unwrap();
            let before = codes.len();
            codes.retain(|c| c.app_id != app_id);
            Ok((before - codes.len()) as u64)
        }

        async fn delete_by_app_user(&self, app_id: Uuid, user_id: Uuid) -> AuthResult<u64> {
            let mut codes = self.codes.write().unwrap();
            let before = codes.len();
            codes.retain(|c| !(c.app_id == app_id && c.user_id == user_id));
            Ok((before - codes.len()) as u64)
        }
    }

    fn create_test_app() -> RegisteredApp {
        RegisteredApp {
            id: Uuid::new_v4(),
            owner_user_id: Uuid::new_v4(),
            name: "Test App".to_string(),
            client_id: "ca_test".to_string(),
            client_secret_hash: secret::hash_secret("sk_test"),
            redirect_uri: "https://client.example/cb".to_string(),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn create_test_request() -> AuthorizeRequest {
        AuthorizeRequest {
            client_id: "ca_test".to_string(),
            redirect_uri: "https://client.example/cb".to_string(),
            response_type: "code".to_string(),
            state: Some("opaque-state".to_string()),
            scope: Some("proposals:read proposals:write".to_string()),
            code_challenge: None,
            code_challenge_method: None,
        }
    }

    fn create_test_service() -> (AuthorizationService, Arc<MockAppStorage>, Arc<MockCodeStorage>)
    {
        let app_storage = Arc::new(MockAppStorage::new());
        let code_storage = Arc::new(MockCodeStorage::new());
        let service = AuthorizationService::new(
            app_storage.clone(),
            code_storage.clone(),
            AuthConfig::default(),
        );
        (service, app_storage, code_storage)
    }

    #[tokio::test]
    async fn test_authorize_success() {
        let (service, app_storage, code_storage) = create_test_service();
        app_storage.add_app(create_test_app());

        let response = service
            .authorize(&create_test_request(), Uuid::new_v4())
            .await
            .unwrap();

        assert!(
            response
                .redirect_url
                .starts_with("https://client.example/cb?code=")
        );
        assert!(response.redirect_url.contains("state=opaque-state"));

        let codes = code_storage.codes.read().unwrap();
        assert_eq!(codes.len(), 1);
        assert_eq!(
            codes[0].scopes,
            vec!["proposals:read".to_string(), "proposals:write".to_string()]
        );
        assert!(codes[0].used_at.is_none());
    }

    #[tokio::test]
    async fn test_authorize_unknown_client() {
        let (service, _, _) = create_test_service();

        let result = service.authorize(&create_test_request(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::InvalidClient { .. })));
    }

    #[tokio::test]
    async fn test_authorize_inactive_client() {
        let (service, app_storage, _) = create_test_service();
        let mut app = create_test_app();
        app.is_active = false;
        app_storage.add_app(app);

        let result = service.authorize(&create_test_request(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::InvalidClient { .. })));
    }

    #[tokio::test]
    async fn test_authorize_redirect_uri_mismatch() {
        let (service, app_storage, _) = create_test_service();
        app_storage.add_app(create_test_app());

        let mut request = create_test_request();
        request.redirect_uri = "https://client.example/cb/extra".to_string();

        let result = service.authorize(&request, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_authorize_unsupported_response_type() {
        let (service, app_storage, _) = create_test_service();
        app_storage.add_app(create_test_app());

        let mut request = create_test_request();
        request.response_type = "token".to_string();

        let result = service.authorize(&request, Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(AuthError::UnsupportedResponseType { .. })
        ));
    }

    #[tokio::test]
    async fn test_authorize_stores_pkce_binding() {
        let (service, app_storage, code_storage) = create_test_service();
        app_storage.add_app(create_test_app());

        let mut request = create_test_request();
        request.code_challenge = Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".to_string());
        request.code_challenge_method = Some("S256".to_string());

        service.authorize(&request, Uuid::new_v4()).await.unwrap();

        let codes = code_storage.codes.read().unwrap();
        assert_eq!(
            codes[0].code_challenge.as_deref(),
            Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM")
        );
        assert_eq!(
            codes[0].code_challenge_method,
            Some(CodeChallengeMethod::S256)
        );
    }

    #[tokio::test]
    async fn test_authorize_challenge_without_method_defaults_to_plain() {
        let (service, app_storage, code_storage) = create_test_service();
        app_storage.add_app(create_test_app());

        let mut request = create_test_request();
        request.code_challenge = Some("verbatim-challenge-value-with-enough-length".to_string());

        service.authorize(&request, Uuid::new_v4()).await.unwrap();

        let codes = code_storage.codes.read().unwrap();
        assert_eq!(
            codes[0].code_challenge_method,
            Some(CodeChallengeMethod::Plain)
        );
    }

    #[tokio::test]
    async fn test_authorize_method_without_challenge_rejected() {
        let (service, app_storage, _) = create_test_service();
        app_storage.add_app(create_test_app());

        let mut request = create_test_request();
        request.code_challenge_method = Some("S256".to_string());

        let result = service.authorize(&request, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_authorize_unknown_challenge_method_rejected() {
        let (service, app_storage, _) = create_test_service();
        app_storage.add_app(create_test_app());

        let mut request = create_test_request();
        request.code_challenge = Some("challenge".to_string());
        request.code_challenge_method = Some("S512".to_string());

        let result = service.authorize(&request, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::InvalidRequest { .. })));
    }

    #[tokio::test]
    async fn test_authorize_code_lifetime_from_config() {
        let config = AuthConfig::default()
            .with_authorization_code_lifetime(std::time::Duration::from_secs(60));
        let app_storage = Arc::new(MockAppStorage::new());
        let code_storage = Arc::new(MockCodeStorage::new());
        let service =
            AuthorizationService::new(app_storage.clone(), code_storage.clone(), config);
        app_storage.add_app(create_test_app());

        service
            .authorize(&create_test_request(), Uuid::new_v4())
            .await
            .unwrap();

        let codes = code_storage.codes.read().unwrap();
        let lifetime = codes[0].expires_at - codes[0].created_at;
        assert_eq!(lifetime.whole_seconds(), 60);
    }
}
