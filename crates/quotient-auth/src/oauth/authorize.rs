//! Authorization endpoint types.
//!
//! The authorization endpoint is the first step in the authorization-code
//! flow:
//!
//! 1. An authenticated end-user approves a client app's access request
//! 2. The server issues a short-lived, single-use code bound to the app,
//!    the user, the redirect URI, and the granted scopes
//! 3. The user-agent is redirected back to the client with the code
//! 4. The client exchanges the code for tokens at the token endpoint

use serde::{Deserialize, Serialize};

/// Authorization request parameters.
///
/// Parsed from the request body by the external HTTP layer. The caller is
/// always an authenticated end-user (the resource owner); there is no
/// unauthenticated path to this endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeRequest {
    /// Public client identifier of the requesting app.
    pub client_id: String,

    /// Redirect URI where the code will be delivered.
    /// Must exactly match the app's registered redirect URI.
    pub redirect_uri: String,

    /// Must be "code"; this server supports only the authorization-code
    /// grant.
    pub response_type: String,

    /// Opaque client state echoed back on the redirect (CSRF protection).
    #[serde(default)]
    pub state: Option<String>,

    /// Requested scopes (space-separated).
    #[serde(default)]
    pub scope: Option<String>,

    /// PKCE code challenge.
    #[serde(default)]
    pub code_challenge: Option<String>,

    /// PKCE challenge method, "S256" or "plain".
    #[serde(default)]
    pub code_challenge_method: Option<String>,
}

impl AuthorizeRequest {
    /// Splits the requested scope string into a deduplicated scope set.
    ///
    /// Order is irrelevant to scope semantics; duplicates are dropped
    /// while the first-seen order is kept for readability.
    #[must_use]
    pub fn scope_set(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .filter(|s| seen.insert(s.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// Authorization response: the redirect target carrying the code.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeResponse {
    /// Complete redirect URL with `code` (and `state`, if supplied) query
    /// parameters appended to the client's redirect URI.
    pub redirect_url: String,
}

impl AuthorizeResponse {
    /// Builds the redirect URL for a freshly issued code.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the redirect URI is not a valid URL.
    /// The issuer validates the URI against the registration before
    /// calling this, so a failure here means a malformed registration.
    pub fn build(
        redirect_uri: &str,
        code: &str,
        state: Option<&str>,
    ) -> Result<Self, url::ParseError> {
        let mut url = url::Url::parse(redirect_uri)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("code", code);
            if let Some(state) = state {
                pairs.append_pair("state", state);
            }
        }
        Ok(Self {
            redirect_url: url.to_string(),
        })
    }
}
