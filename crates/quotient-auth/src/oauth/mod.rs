//! OAuth 2.0 endpoint types and the authorization code issuer.

pub mod authorize;
pub mod pkce;
pub mod service;
pub mod token;

pub use authorize::{AuthorizeRequest, AuthorizeResponse};
pub use pkce::{PkceChallenge, PkceError, PkceVerifier};
pub use service::AuthorizationService;
pub use token::{RevocationRequest, TokenErrorBody, TokenRequest, TokenResponse, TokenTypeHint};
