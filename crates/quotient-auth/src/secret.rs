//! Secret generation and verification.
//!
//! This module provides cryptographically secure generation of client
//! identifiers and app secrets, plus the deterministic digest used wherever
//! a secret or token value touches storage.
//!
//! # Security
//!
//! - Secrets are 256-bit random values (32 bytes) with an "sk_" prefix
//! - Client identifiers are 128-bit random values with a "ca_" prefix
//! - Digests are plain SHA-256: all hashed inputs are high-entropy values
//!   generated by this server, so no salt or work factor is needed. Never
//!   hash user-chosen passwords or PINs through this module.
//! - Verification compares digests in constant time so comparison latency
//!   does not depend on how many leading bytes match
//!
//! # Example
//!
//! ```
//! use quotient_auth::secret::{generate_app_secret, hash_secret, verify_secret};
//!
//! let secret = generate_app_secret();
//! assert!(secret.starts_with("sk_"));
//!
//! let digest = hash_secret(&secret);
//! assert!(verify_secret(&secret, &digest));
//! assert!(!verify_secret("sk_wrong", &digest));
//! ```

use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generates a new client identifier.
///
/// The identifier is a 128-bit (16 bytes) random value encoded as
/// hexadecimal with a "ca_" prefix. It is public, stable, and never
/// rotated after registration.
///
/// # Format
///
/// `ca_{32 hex characters}` (35 characters total)
#[must_use]
pub fn generate_client_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    format!("ca_{}", hex::encode(bytes))
}

/// Generates a new cryptographically secure app secret.
///
/// The secret is a 256-bit (32 bytes) random value encoded as hexadecimal
/// with an "sk_" prefix for easy identification. The plaintext value is
/// shown to the app owner exactly once; only its digest is persisted.
///
/// # Format
///
/// `sk_{64 hex characters}` (67 characters total)
#[must_use]
pub fn generate_app_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes);
    format!("sk_{}", hex::encode(bytes))
}

/// Hashes a secret or token value for storage.
///
/// Produces a hex-encoded SHA-256 digest. The digest doubles as the lookup
/// key for codes and tokens, so the function must stay deterministic.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verifies a plaintext secret against a stored digest.
///
/// Recomputes the digest and compares it to the stored one in constant
/// time. Returns `false` for any mismatch, including a malformed stored
/// digest.
#[must_use]
pub fn verify_secret(secret: &str, digest: &str) -> bool {
    let computed = hash_secret(secret);
    computed.as_bytes().ct_eq(digest.as_bytes()).into()
}
