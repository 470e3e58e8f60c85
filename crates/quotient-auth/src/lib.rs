//! # quotient-auth
//!
//! Third-party authorization server for the Quotient platform.
//!
//! This crate lets an end-user's account grant a registered client
//! application scoped, revocable, time-bounded access via the OAuth 2.0
//! authorization-code grant (with optional PKCE) and refresh-token
//! rotation.
//!
//! ## Overview
//!
//! The protocol surface is four operations plus the app registry:
//!
//! - `authorize` - an authenticated end-user approves a grant; a
//!   single-use code bound to the app, user, redirect URI, and scopes is
//!   issued
//! - `token` - the client exchanges a code (or rotates a refresh token)
//!   for an access/refresh pair
//! - `validate` - a presented access token is checked against both its
//!   signature and its backing storage record
//! - `revoke` - a token is idempotently revoked
//!
//! Persistence sits behind small storage traits so the protocol logic
//! runs unchanged against an in-memory fake (`quotient-auth-memory`) or a
//! production store.
//!
//! ## Modules
//!
//! - [`config`] - lifetimes and signing configuration
//! - [`error`] - the error taxonomy every operation returns
//! - [`secret`] - secret generation and digesting
//! - [`types`] - persisted records (apps, codes, token pairs)
//! - [`storage`] - repository traits
//! - [`oauth`] - endpoint types, PKCE, and the code issuer
//! - [`registry`] - owner-scoped app management
//! - [`token`] - signed claims and the token service
//! - [`service`] - the façade the HTTP layer calls

pub mod config;
pub mod error;
pub mod oauth;
pub mod registry;
pub mod secret;
pub mod service;
pub mod storage;
pub mod token;
pub mod types;

pub use config::AuthConfig;
pub use error::{AuthError, ErrorCategory};
pub use oauth::{
    AuthorizationService, AuthorizeRequest, AuthorizeResponse, RevocationRequest, TokenErrorBody,
    TokenRequest, TokenResponse, TokenTypeHint,
};
pub use registry::AppRegistry;
pub use service::{AuthorizedApp, OAuthService};
pub use storage::{AppStorage, CodeStorage, TokenStorage};
pub use token::{AccessContext, AccessTokenClaims, ClaimsService, TokenService};
pub use types::{AuthorizationCode, CodeChallengeMethod, IssuedToken, RegisteredApp};

/// Type alias for authorization server results.
pub type AuthResult<T> = Result<T, AuthError>;
