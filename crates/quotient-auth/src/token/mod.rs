//! Access token claims and the token service.

pub mod claims;
pub mod service;

pub use claims::{AccessTokenClaims, ClaimsError, ClaimsService, OAUTH_ACCESS_TOKEN_TYPE};
pub use service::{AccessContext, TokenService};
