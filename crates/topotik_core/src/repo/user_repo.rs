//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Email uniqueness is enforced by the store; violations surface as
//!   `RepoError::Conflict`.
//! - Password hashes only leave this module inside `StoredCredentials`.

use super::schema::{ensure_connection_ready, parse_uuid, USERS};
use super::{RepoError, RepoResult};
use crate::model::user::{normalize_email, NewUser, User, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    email,
    password_hash,
    created_at
FROM users";

/// User record paired with its stored password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub user: User,
    pub password_hash: String,
}

pub trait UserRepository {
    fn create_user(&self, user: &NewUser, password_hash: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn find_credentials(&self, email: &str) -> RepoResult<Option<StoredCredentials>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[&USERS])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser, password_hash: &str) -> RepoResult<User> {
        if self.find_credentials(&user.email)?.is_some() {
            return Err(RepoError::Conflict(format!(
                "email already registered: {}",
                user.email
            )));
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO users (id, username, email, password_hash)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                user.username.as_str(),
                user.email.as_str(),
                password_hash
            ],
        )?;

        self.get_user(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("created user {id} missing on read-back")))
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let found = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
                [id.to_string()],
                |row| Ok(parse_credentials_row(row)),
            )
            .optional()?;
        found.transpose().map(|value| value.map(|stored| stored.user))
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        Ok(self.find_credentials(email)?.map(|stored| stored.user))
    }

    fn find_credentials(&self, email: &str) -> RepoResult<Option<StoredCredentials>> {
        let Ok(normalized) = normalize_email(email) else {
            return Ok(None);
        };
        let found = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
                [normalized],
                |row| Ok(parse_credentials_row(row)),
            )
            .optional()?;
        found.transpose()
    }
}

fn parse_credentials_row(row: &Row<'_>) -> RepoResult<StoredCredentials> {
    let id_text: String = row.get("id")?;
    Ok(StoredCredentials {
        user: User {
            id: parse_uuid(&id_text, "users.id")?,
            username: row.get("username")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        },
        password_hash: row.get("password_hash")?,
    })
}
