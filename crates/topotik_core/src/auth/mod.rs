//! Credential hashing and signed access tokens.
//!
//! # Responsibility
//! - Hash and verify passwords with a slow, salted, adaptive hash.
//! - Issue and verify expiring HMAC-signed tokens carrying a user id.
//!
//! # Invariants
//! - Raw passwords are only held in zeroizing buffers.
//! - Neither passwords, hashes nor tokens are ever logged.

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordHasher, RawPassword, MIN_HASH_COST};
pub use token::{SignedToken, TokenError, TokenSigner};
