#![allow(dead_code)]

use topotik_core::auth::MIN_HASH_COST;
use topotik_core::model::map::{Map, MapType};
use topotik_core::model::marker::{GeoPoint, Marker};
use topotik_core::model::user::User;
use topotik_core::{open_db_in_memory, AccessLevel, CoreConfig, DbLocation, RawPassword, TopotikCore};

pub const SECRET: &str = "integration-secret";

pub fn test_config() -> CoreConfig {
    let mut config = CoreConfig::new(DbLocation::Memory, SECRET).unwrap();
    config.password_hash_cost = MIN_HASH_COST;
    config
}

pub fn core() -> TopotikCore {
    TopotikCore::from_connection(open_db_in_memory().unwrap(), &test_config()).unwrap()
}

pub fn user(core: &TopotikCore, name: &str) -> User {
    core.auth()
        .unwrap()
        .create_user(
            name,
            &format!("{name}@example.org"),
            &RawPassword::from("pa55word"),
        )
        .unwrap()
}

pub fn map(core: &TopotikCore, owner: &User, level: AccessLevel) -> Map {
    core.maps()
        .unwrap()
        .create_map(owner.id, "Walking routes", MapType::Osm, level, None)
        .unwrap()
}

pub fn marker(core: &TopotikCore, map: &Map, title: &str) -> Marker {
    core.markers()
        .unwrap()
        .create_marker(
            map.id,
            GeoPoint::parse("55.751244", "37.618423").unwrap(),
            Some(title),
            None,
        )
        .unwrap()
}

pub fn count_rows(core: &TopotikCore, sql: &str, id: &str) -> i64 {
    core.connection()
        .query_row(sql, [id], |row| row.get(0))
        .unwrap()
}
