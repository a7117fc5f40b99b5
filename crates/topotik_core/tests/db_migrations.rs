use rusqlite::Connection;
use topotik_core::db::migrations::{apply_migrations, latest_version};
use topotik_core::db::{open_db, open_db_in_memory, DbError};
use topotik_core::repo::map_repo::SqliteMapRepository;
use topotik_core::RepoError;

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get(0))
        .unwrap()
        .map(Result::unwrap)
        .collect();
    names
}

#[test]
fn in_memory_database_is_fully_migrated() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());

    let tables = table_names(&conn);
    for expected in [
        "articles",
        "blocks",
        "collections",
        "images",
        "maps",
        "marker_collections",
        "markers",
        "sharings",
        "users",
    ] {
        assert!(tables.iter().any(|name| name == expected), "missing {expected}");
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO markers (id, map_id, latitude_e6, longitude_e6) VALUES ('m', 'nope', 0, 0);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().to_lowercase().contains("foreign key"));
}

#[test]
fn reopening_file_database_keeps_data_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("topotik.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash) VALUES ('u1', 'ann', 'ann@example.org', 'x');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let users: i64 = conn
        .query_row("SELECT COUNT(*) FROM users;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(users, 1);
}

#[test]
fn newer_schema_is_rejected_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", latest_version() + 1)
            .unwrap();
    }

    assert!(matches!(
        open_db(&path),
        Err(DbError::UnsupportedSchemaVersion { .. })
    ));
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    assert!(matches!(
        SqliteMapRepository::try_new(&conn),
        Err(RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        })
    ));
}

#[test]
fn repositories_refuse_connections_missing_tables() {
    let mut conn = Connection::open_in_memory().unwrap();
    apply_migrations(&mut conn).unwrap();
    conn.execute_batch("DROP TABLE marker_collections;").unwrap();

    assert!(matches!(
        SqliteMapRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("marker_collections"))
    ));
}
