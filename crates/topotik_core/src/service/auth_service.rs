//! Registration, credential checks and token issuance.
//!
//! # Responsibility
//! - Register users with hashed passwords.
//! - Verify credentials without revealing whether an email is registered.
//! - Issue and verify access tokens.
//!
//! # Invariants
//! - Unknown email and wrong password yield the same `InvalidCredentials`
//!   error after a comparable amount of hashing work.
//! - Raw passwords never reach the repository or the log.

use crate::auth::{PasswordError, PasswordHasher, RawPassword, SignedToken, TokenError, TokenSigner};
use crate::model::user::{NewUser, User, UserId};
use crate::model::ValidationError;
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Authentication failure.
#[derive(Debug)]
pub enum AuthError {
    /// Username, email or password input is invalid.
    Validation(ValidationError),
    /// Email already registered.
    Conflict(String),
    /// Unknown email or wrong password.
    InvalidCredentials,
    /// Token could not be issued or verified.
    Token(TokenError),
    /// Hashing backend failed.
    Hashing(PasswordError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Token(err) => write!(f, "{err}"),
            Self::Hashing(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Token(err) => Some(err),
            Self::Hashing(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Conflict(_) | Self::InvalidCredentials => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<TokenError> for AuthError {
    fn from(value: TokenError) -> Self {
        Self::Token(value)
    }
}

impl From<PasswordError> for AuthError {
    fn from(value: PasswordError) -> Self {
        Self::Hashing(value)
    }
}

/// Authentication service over a user repository.
pub struct AuthService<'a, R: UserRepository> {
    repo: R,
    hasher: &'a PasswordHasher,
    signer: &'a TokenSigner,
}

impl<'a, R: UserRepository> AuthService<'a, R> {
    pub fn new(repo: R, hasher: &'a PasswordHasher, signer: &'a TokenSigner) -> Self {
        Self {
            repo,
            hasher,
            signer,
        }
    }

    /// Registers a user. Fails with `Conflict` when the email is taken.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &RawPassword,
    ) -> Result<User, AuthError> {
        let new_user = NewUser::new(username, email)?;
        if password.is_empty() {
            return Err(AuthError::Validation(ValidationError::EmptyField("password")));
        }

        let password_hash = self.hasher.hash(password)?;
        match self.repo.create_user(&new_user, &password_hash) {
            Ok(user) => {
                info!("event=user_create module=auth status=ok user_id={}", user.id);
                Ok(user)
            }
            Err(err) => {
                warn!("event=user_create module=auth status=error");
                Err(err.into())
            }
        }
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    pub fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.repo.get_user_by_email(email)
    }

    /// Returns the user owning `email` when `password` matches.
    pub fn verify_credentials(
        &self,
        email: &str,
        password: &RawPassword,
    ) -> Result<User, AuthError> {
        let matched = match self.repo.find_credentials(email)? {
            Some(stored) => self
                .hasher
                .verify(password, &stored.password_hash)?
                .then_some(stored.user),
            None => {
                self.hasher.verify_dummy(password)?;
                None
            }
        };

        match matched {
            Some(user) => {
                info!("event=login module=auth status=ok user_id={}", user.id);
                Ok(user)
            }
            None => {
                warn!("event=login module=auth status=rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<SignedToken, AuthError> {
        Ok(self.signer.issue(user.id)?)
    }

    /// Resolves a token to the id of an existing user.
    pub fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let user_id = self.signer.verify(token).map_err(|err| {
            warn!("event=token_verify module=auth status=rejected reason={err}");
            AuthError::Token(err)
        })?;
        Ok(user_id)
    }

    /// Verifies credentials and issues a token in one step.
    pub fn login(&self, email: &str, password: &RawPassword) -> Result<SignedToken, AuthError> {
        let user = self.verify_credentials(email, password)?;
        self.issue_token(&user)
    }
}
