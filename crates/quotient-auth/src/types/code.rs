//! Authorization code domain type.
//!
//! An authorization code binds an approved grant (app, user, redirect URI,
//! scopes, optional PKCE challenge) to a short-lived, single-use value the
//! client exchanges for tokens.
//!
//! # Storage Security
//!
//! The code value itself is never stored. Only a SHA-256 digest is
//! persisted; the token endpoint hashes the presented code and looks it up
//! by digest.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::secret;

/// PKCE code challenge method bound to an authorization code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// SHA-256 of the verifier, base64url-encoded.
    #[serde(rename = "S256")]
    S256,
    /// The verifier is compared verbatim against the challenge.
    #[serde(rename = "plain")]
    Plain,
}

impl CodeChallengeMethod {
    /// Parses a challenge method from its wire representation.
    ///
    /// Returns `None` for anything other than `"S256"` or `"plain"`.
    #[must_use]
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "S256" => Some(Self::S256),
            "plain" => Some(Self::Plain),
            _ => None,
        }
    }

    /// Returns the method as its wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

impl std::fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authorization code stored by the authorize step.
///
/// A code is consumed exactly once: setting `used_at` is a conditional
/// write, and once set no exchange may succeed against the code again,
/// even inside its lifetime window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationCode {
    /// Unique identifier for this code record.
    pub id: Uuid,

    /// App the code was issued to.
    pub app_id: Uuid,

    /// Resource owner who approved the grant.
    pub user_id: Uuid,

    /// SHA-256 digest of the code value.
    pub code_hash: String,

    /// Redirect URI the client presented at authorize time.
    /// If the client supplies one again at exchange time it must match.
    pub redirect_uri: String,

    /// Granted scopes. Order is irrelevant; duplicates are not stored.
    pub scopes: Vec<String>,

    /// PKCE code challenge, if the client supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE challenge method accompanying `code_challenge`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<CodeChallengeMethod>,

    /// When this code was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When this code expires (issuance + 10 minutes by default).
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,

    /// When this code was consumed (None until the single exchange).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub used_at: Option<OffsetDateTime>,
}

impl AuthorizationCode {
    /// Returns `true` if this code has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() > self.expires_at
    }

    /// Returns `true` if this code has already been consumed.
    #[must_use]
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Returns `true` if this code may still be exchanged.
    #[must_use]
    pub fn is_exchangeable(&self) -> bool {
        !self.is_expired() && !self.is_used()
    }

    /// Hashes a code value for storage or lookup.
    #[must_use]
    pub fn hash_code(code: &str) -> String {
        secret::hash_secret(code)
    }

    /// Generates a cryptographically secure random code value.
    ///
    /// Returns a 256-bit random value encoded as base64url (43 characters).
    #[must_use]
    pub fn generate_code() -> String {
        use base64::Engine;
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;

        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn create_test_code(
        expires_at: OffsetDateTime,
        used_at: Option<OffsetDateTime>,
    ) -> AuthorizationCode {
        AuthorizationCode {
            id: Uuid::new_v4(),
            app_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            code_hash: AuthorizationCode::hash_code("test-code"),
            redirect_uri: "https://client.example/cb".to_string(),
            scopes: vec!["proposals:read".to_string()],
            code_challenge: None,
            code_challenge_method: None,
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            used_at,
        }
    }

    #[test]
    fn test_challenge_method_parse() {
        assert_eq!(
            CodeChallengeMethod::parse("S256"),
            Some(CodeChallengeMethod::S256)
        );
        assert_eq!(
            CodeChallengeMethod::parse("plain"),
            Some(CodeChallengeMethod::Plain)
        );
        assert_eq!(CodeChallengeMethod::parse("s256"), None);
        assert_eq!(CodeChallengeMethod::parse("unknown"), None);
    }

    #[test]
    fn test_challenge_method_display() {
        assert_eq!(CodeChallengeMethod::S256.to_string(), "S256");
        assert_eq!(CodeChallengeMethod::Plain.to_string(), "plain");
    }

    #[test]
    fn test_generate_code() {
        let code = AuthorizationCode::generate_code();
        assert_eq!(code.len(), 43);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_hash_code_deterministic() {
        let code = AuthorizationCode::generate_code();
        assert_eq!(
            AuthorizationCode::hash_code(&code),
            AuthorizationCode::hash_code(&code)
        );
        assert_ne!(
            AuthorizationCode::hash_code(&code),
            AuthorizationCode::hash_code("other")
        );
    }

    #[test]
    fn test_is_exchangeable() {
        let now = OffsetDateTime::now_utc();

        let code = create_test_code(now + Duration::minutes(10), None);
        assert!(code.is_exchangeable());

        // Expired
        let code = create_test_code(now - Duration::minutes(1), None);
        assert!(code.is_expired());
        assert!(!code.is_exchangeable());

        // Used, even inside the lifetime window
        let code = create_test_code(now + Duration::minutes(10), Some(now));
        assert!(code.is_used());
        assert!(!code.is_exchangeable());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let code = create_test_code(OffsetDateTime::now_utc() + Duration::minutes(10), None);
        let json = serde_json::to_string(&code).unwrap();
        assert!(json.contains("\"codeHash\""));
        assert!(!json.contains("usedAt"), "unset usedAt should be omitted");

        let deserialized: AuthorizationCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code.id, deserialized.id);
        assert_eq!(code.code_hash, deserialized.code_hash);
        assert_eq!(code.scopes, deserialized.scopes);
    }
}
