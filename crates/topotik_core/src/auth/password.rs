//! bcrypt-backed password hashing.

use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use zeroize::Zeroizing;

/// Lowest and highest cost accepted by bcrypt.
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;
pub const DEFAULT_HASH_COST: u32 = 12;

/// Plain-text password wiped from memory on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct RawPassword(Zeroizing<String>);

impl RawPassword {
    pub fn new(value: &str) -> Self {
        Self(Zeroizing::new(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for RawPassword {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RawPassword {
    fn from(value: String) -> Self {
        Self(Zeroizing::new(value))
    }
}

impl Debug for RawPassword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawPassword(<redacted>)")
    }
}

#[derive(Debug)]
pub enum PasswordError {
    /// Cost factor outside `4..=31`.
    InvalidCost(u32),
    /// Backend failure while hashing or parsing a stored hash.
    Backend(bcrypt::BcryptError),
}

impl Display for PasswordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCost(cost) => write!(
                f,
                "password hash cost {cost} outside {MIN_HASH_COST}..={MAX_HASH_COST}"
            ),
            Self::Backend(err) => write!(f, "password hashing failed: {err}"),
        }
    }
}

impl Error for PasswordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::InvalidCost(_) => None,
        }
    }
}

impl From<bcrypt::BcryptError> for PasswordError {
    fn from(value: bcrypt::BcryptError) -> Self {
        Self::Backend(value)
    }
}

/// Hashes and verifies passwords at a fixed bcrypt cost.
#[derive(Debug)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: OnceCell<String>,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self {
            cost,
            dummy_hash: OnceCell::new(),
        })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Produces a salted hash in modular crypt format.
    pub fn hash(&self, password: &RawPassword) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password.as_str(), self.cost)?)
    }

    /// Compares `password` against a stored hash.
    pub fn verify(&self, password: &RawPassword, stored_hash: &str) -> Result<bool, PasswordError> {
        Ok(bcrypt::verify(password.as_str(), stored_hash)?)
    }

    /// Runs a full comparison against a throwaway hash of the same cost.
    ///
    /// Used when no account matches so that unknown accounts and wrong
    /// passwords take comparable time. Always returns `false`.
    pub fn verify_dummy(&self, password: &RawPassword) -> Result<bool, PasswordError> {
        let dummy = self
            .dummy_hash
            .get_or_try_init(|| bcrypt::hash("topotik-dummy-password", self.cost))?;
        bcrypt::verify(password.as_str(), dummy)?;
        Ok(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_HASH_COST,
            dummy_hash: OnceCell::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PasswordError, PasswordHasher, RawPassword, MIN_HASH_COST};

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(MIN_HASH_COST).unwrap()
    }

    #[test]
    fn hash_is_salted_and_verifiable() {
        let hasher = fast_hasher();
        let password = RawPassword::from("correct horse");
        let first = hasher.hash(&password).unwrap();
        let second = hasher.hash(&password).unwrap();

        assert_ne!(first, second);
        assert!(!first.contains("correct horse"));
        assert!(hasher.verify(&password, &first).unwrap());
        assert!(!hasher.verify(&RawPassword::from("wrong"), &first).unwrap());
    }

    #[test]
    fn dummy_verification_never_succeeds() {
        let hasher = fast_hasher();
        assert!(!hasher
            .verify_dummy(&RawPassword::from("topotik-dummy-password"))
            .unwrap());
    }

    #[test]
    fn cost_outside_range_is_rejected() {
        assert!(matches!(
            PasswordHasher::new(3),
            Err(PasswordError::InvalidCost(3))
        ));
        assert!(PasswordHasher::new(32).is_err());
    }

    #[test]
    fn raw_password_debug_is_redacted() {
        let rendered = format!("{:?}", RawPassword::from("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}
