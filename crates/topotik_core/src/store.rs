//! Single entry point wiring storage, auth and services together.
//!
//! # Responsibility
//! - Own the SQLite connection and the configured auth collaborators.
//! - Hand out services borrowing that connection.
//!
//! # Invariants
//! - The connection is migrated before any service is created.
//! - Every service from one `TopotikCore` shares the same connection.

use crate::auth::{PasswordError, PasswordHasher, TokenSigner};
use crate::config::{ConfigError, CoreConfig, ALGORITHM};
use crate::db::migrations::schema_version;
use crate::db::{open_db_location, DbError};
use crate::repo::access_repo::SqliteAccessRepository;
use crate::repo::article_repo::SqliteArticleRepository;
use crate::repo::collection_repo::SqliteCollectionRepository;
use crate::repo::image_repo::SqliteImageRepository;
use crate::repo::map_repo::SqliteMapRepository;
use crate::repo::marker_repo::SqliteMarkerRepository;
use crate::repo::sharing_repo::SqliteSharingRepository;
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::RepoError;
use crate::service::access_service::{AccessError, AccessService};
use crate::service::article_service::ArticleService;
use crate::service::auth_service::{AuthError, AuthService};
use crate::service::collection_service::CollectionService;
use crate::service::image_service::ImageService;
use crate::service::map_service::MapService;
use crate::service::marker_service::MarkerService;
use crate::service::sharing_service::SharingService;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Any failure surfaced by the core.
#[derive(Debug)]
pub enum CoreError {
    Config(ConfigError),
    Db(DbError),
    Repo(RepoError),
    Auth(AuthError),
    Access(AccessError),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Auth(err) => write!(f, "{err}"),
            Self::Access(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Auth(err) => Some(err),
            Self::Access(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<AuthError> for CoreError {
    fn from(value: AuthError) -> Self {
        Self::Auth(value)
    }
}

impl From<AccessError> for CoreError {
    fn from(value: AccessError) -> Self {
        Self::Access(value)
    }
}

impl From<PasswordError> for CoreError {
    fn from(value: PasswordError) -> Self {
        Self::Auth(AuthError::Hashing(value))
    }
}

/// Opened store plus auth collaborators.
pub struct TopotikCore {
    conn: Connection,
    hasher: PasswordHasher,
    signer: TokenSigner,
}

impl TopotikCore {
    /// Opens (and migrates) the configured database.
    pub fn open(config: &CoreConfig) -> Result<Self, CoreError> {
        let conn = open_db_location(&config.database)?;
        Self::from_connection(conn, config)
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(conn: Connection, config: &CoreConfig) -> Result<Self, CoreError> {
        let hasher = PasswordHasher::new(config.password_hash_cost)?;
        let signer = TokenSigner::new(
            config.secret_key.as_bytes(),
            config.algorithm,
            config.access_token_expire_minutes,
        )
        .ok_or_else(|| ConfigError::Invalid {
            key: ALGORITHM,
            reason: format!("{:?} is not an HMAC algorithm", config.algorithm),
        })?;

        info!(
            "event=core_open module=core status=ok algorithm={:?} token_minutes={}",
            config.algorithm, config.access_token_expire_minutes
        );
        Ok(Self {
            conn,
            hasher,
            signer,
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Schema version recorded in `PRAGMA user_version`.
    pub fn schema_version(&self) -> Result<u32, CoreError> {
        Ok(schema_version(&self.conn)?)
    }

    pub fn auth(&self) -> Result<AuthService<'_, SqliteUserRepository<'_>>, CoreError> {
        let repo = SqliteUserRepository::try_new(&self.conn)?;
        Ok(AuthService::new(repo, &self.hasher, &self.signer))
    }

    pub fn maps(&self) -> Result<MapService<SqliteMapRepository<'_>>, CoreError> {
        Ok(MapService::new(SqliteMapRepository::try_new(&self.conn)?))
    }

    pub fn markers(&self) -> Result<MarkerService<SqliteMarkerRepository<'_>>, CoreError> {
        Ok(MarkerService::new(SqliteMarkerRepository::try_new(&self.conn)?))
    }

    pub fn collections(
        &self,
    ) -> Result<CollectionService<SqliteCollectionRepository<'_>>, CoreError> {
        Ok(CollectionService::new(SqliteCollectionRepository::try_new(
            &self.conn,
        )?))
    }

    pub fn articles(&self) -> Result<ArticleService<SqliteArticleRepository<'_>>, CoreError> {
        Ok(ArticleService::new(SqliteArticleRepository::try_new(
            &self.conn,
        )?))
    }

    pub fn images(&self) -> Result<ImageService<SqliteImageRepository<'_>>, CoreError> {
        Ok(ImageService::new(SqliteImageRepository::try_new(&self.conn)?))
    }

    pub fn sharings(&self) -> Result<SharingService<SqliteSharingRepository<'_>>, CoreError> {
        Ok(SharingService::new(SqliteSharingRepository::try_new(
            &self.conn,
        )?))
    }

    pub fn access(&self) -> Result<AccessService<SqliteAccessRepository<'_>>, CoreError> {
        Ok(AccessService::new(SqliteAccessRepository::try_new(
            &self.conn,
        )?))
    }
}
