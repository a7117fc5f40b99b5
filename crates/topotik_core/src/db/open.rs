//! Connection bootstrap.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON` and a 5s busy timeout.
//! - Returned connections are at the latest schema version.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the store lives, as resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// Private in-memory database, discarded when the connection drops.
    Memory,
    /// On-disk database file.
    File(PathBuf),
}

impl DbLocation {
    fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

/// Opens (creating if needed) a database file and migrates it.
///
/// Missing parent directories are created.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_db_location(&DbLocation::File(path.as_ref().to_path_buf()))
}

/// Opens a private in-memory database and migrates it.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_db_location(&DbLocation::Memory)
}

/// Opens the database described by a configured location.
///
/// # Side effects
/// - Emits `db_open` events with mode, duration and schema versions.
pub fn open_db_location(location: &DbLocation) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = location.mode();

    match connect(location) {
        Ok((conn, report)) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={} from_version={} to_version={}",
                started_at.elapsed().as_millis(),
                report.from_version,
                report.to_version
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            Err(err)
        }
    }
}

fn connect(location: &DbLocation) -> DbResult<(Connection, super::MigrationReport)> {
    let mut conn = match location {
        DbLocation::Memory => Connection::open_in_memory()?,
        DbLocation::File(path) => {
            ensure_parent_dir(path)?;
            Connection::open(path)?
        }
    };
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    let report = apply_migrations(&mut conn)?;
    Ok((conn, report))
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    })
}
