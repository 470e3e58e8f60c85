//! Domain types persisted by the authorization server.

pub mod app;
pub mod code;
pub mod token;

pub use app::RegisteredApp;
pub use code::{AuthorizationCode, CodeChallengeMethod};
pub use token::IssuedToken;
