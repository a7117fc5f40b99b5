//! Persistence and access-control core for Topotik maps.
//!
//! Users create maps, place markers on them, group markers into
//! collections and attach articles made of ordered blocks. Maps and
//! collections can be shared with users, link holders or everyone; the
//! access resolver turns those grants into an effective permission.

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use crate::auth::{RawPassword, SignedToken, TokenError};
pub use crate::config::{ConfigError, CoreConfig};
pub use crate::db::{open_db, open_db_in_memory, DbError, DbLocation};
pub use crate::logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use crate::model::sharing::{Permission, ResourceRef};
pub use crate::model::{AccessLevel, ValidationError};
pub use crate::repo::{EntityKind, Page, RepoError, RepoResult};
pub use crate::service::access_service::{AccessError, AccessTarget, Requester};
pub use crate::service::auth_service::AuthError;
pub use crate::store::{CoreError, TopotikCore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
