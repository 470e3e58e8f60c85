//! PKCE (Proof Key for Code Exchange) implementation.
//!
//! Implements RFC 7636 with both the S256 and plain methods. PKCE is
//! optional for the authorization-code grant: a code issued with a
//! challenge can only be exchanged by a caller presenting the matching
//! verifier.
//!
//! The exchange step compares whatever verifier the client presents
//! against the stored challenge; RFC 7636's verifier shape (43-128
//! unreserved characters) is enforced by [`PkceVerifier`], the helper
//! clients use to generate one, not re-imposed on the wire.
//!
//! # Example
//!
//! ```
//! use quotient_auth::oauth::pkce::{PkceChallenge, PkceVerifier};
//! use quotient_auth::types::CodeChallengeMethod;
//!
//! // Client generates a verifier and derives the S256 challenge
//! let verifier = PkceVerifier::generate();
//! let challenge = PkceChallenge::from_verifier(verifier.as_str());
//!
//! // Server stores the challenge at authorize time, verifies at exchange
//! assert!(
//!     challenge
//!         .verify(verifier.as_str(), CodeChallengeMethod::S256)
//!         .is_ok()
//! );
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::types::CodeChallengeMethod;

/// Errors that can occur during PKCE operations.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// Verifier length is outside the valid range (43-128 characters).
    #[error("Invalid verifier length: must be 43-128 characters, got {0}")]
    InvalidVerifierLength(usize),

    /// Verifier contains invalid characters.
    #[error("Invalid verifier characters: must be unreserved URI characters ([A-Za-z0-9-._~])")]
    InvalidVerifierCharacters,

    /// PKCE verification failed (verifier does not match the challenge).
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

/// PKCE code verifier.
///
/// A high-entropy random string using the unreserved characters
/// `[A-Z] / [a-z] / [0-9] / "-" / "." / "_" / "~"`, 43 to 128 characters
/// long (RFC 7636 section 4.1). This is the client-side half of PKCE;
/// servers only ever see the derived challenge and, later, the raw
/// verifier string.
#[derive(Debug, Clone)]
pub struct PkceVerifier(String);

impl PkceVerifier {
    /// Creates a verifier from a string, enforcing the RFC 7636 shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the length is not between 43 and 128
    /// characters, or the string contains characters outside
    /// `[A-Za-z0-9-._~]`.
    pub fn new(verifier: String) -> Result<Self, PkceError> {
        let len = verifier.len();
        if !(43..=128).contains(&len) {
            return Err(PkceError::InvalidVerifierLength(len));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' || c == '~')
        {
            return Err(PkceError::InvalidVerifierCharacters);
        }

        Ok(Self(verifier))
    }

    /// Generates a cryptographically random verifier.
    ///
    /// 32 random bytes encoded as base64url (43 characters).
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Returns the verifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PkceVerifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// PKCE code challenge bound to an authorization code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Creates a challenge from a raw string received at authorize time.
    #[must_use]
    pub fn new(challenge: String) -> Self {
        Self(challenge)
    }

    /// Derives the S256 challenge from a verifier.
    ///
    /// Computes `BASE64URL(SHA256(ASCII(code_verifier)))` per RFC 7636
    /// section 4.2.
    #[must_use]
    pub fn from_verifier(verifier: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    /// Verifies a presented verifier against this challenge.
    ///
    /// For `S256` the verifier is hashed and compared to the challenge;
    /// for `plain` the verifier is compared verbatim. Both comparisons run
    /// in constant time.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::VerificationFailed` if the verifier does not
    /// match.
    pub fn verify(&self, verifier: &str, method: CodeChallengeMethod) -> Result<(), PkceError> {
        let matches: bool = match method {
            CodeChallengeMethod::S256 => {
                let expected = Self::from_verifier(verifier);
                self.0.as_bytes().ct_eq(expected.0.as_bytes()).into()
            }
            CodeChallengeMethod::Plain => self.0.as_bytes().ct_eq(verifier.as_bytes()).into(),
        };

        if matches {
            Ok(())
        } else {
            Err(PkceError::VerificationFailed)
        }
    }

    /// Returns the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the challenge and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkceChallenge {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
