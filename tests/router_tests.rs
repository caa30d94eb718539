//! Router integration tests

use std::fs;
use std::sync::Arc;
use std::thread;

use tempfile::tempdir;

use shardplan::router::mock::{mock_config, mock_router, mock_table_a_config};
use shardplan::router::{
    PartitionConfig, Router, RouterConfig, RouterError, ShardValue, TableConfig, TableKind,
    DEFAULT_SLOTS,
};

fn single_table(name: &str, backend: &str) -> TableConfig {
    TableConfig {
        name: name.to_string(),
        kind: TableKind::Single,
        shard_key: None,
        partitions: vec![PartitionConfig {
            backend: backend.to_string(),
            suffix: String::new(),
            segment: None,
        }],
    }
}

// ============ Config Loading ============

#[test]
fn test_load_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.json");
    fs::write(&path, mock_config("sbtest").to_json().unwrap()).unwrap();

    let config = RouterConfig::load(&path).unwrap();
    assert_eq!(config, mock_config("sbtest"));

    let router = Router::from_config(&config).unwrap();
    assert_eq!(router.databases(), vec!["sbtest"]);
    assert_eq!(router.tables("sbtest").unwrap(), vec!["A", "G", "S"]);
}

#[test]
fn test_load_missing_file() {
    let dir = tempdir().unwrap();
    let err = RouterConfig::load(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, RouterError::Io(_)));
}

#[test]
fn test_load_malformed_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("router.json");
    fs::write(&path, "{ \"schemas\": [ ").unwrap();
    assert!(matches!(
        RouterConfig::load(&path),
        Err(RouterError::Parse(_))
    ));

    fs::write(&path, r#"{ "schemas": [{ "database": "d", "tables": [{ "name": "t", "kind": "hashed", "partitions": [] }] }] }"#).unwrap();
    assert!(matches!(
        RouterConfig::load(&path),
        Err(RouterError::Parse(_))
    ));
}

#[test]
fn test_config_defaults() {
    let config = RouterConfig::from_json(r#"{ "schemas": [{ "database": "d" }] }"#).unwrap();
    assert_eq!(config.slots, DEFAULT_SLOTS);
    assert!(config.schemas[0].tables.is_empty());
}

// ============ Validation ============

#[test]
fn test_invalid_configs() {
    let mut zero_slots = mock_config("sbtest");
    zero_slots.slots = 0;

    let mut overlap = mock_config("sbtest");
    overlap.schemas[0].tables[0].partitions[1].segment = Some("16-64".to_string());

    let mut duplicate_suffix = mock_config("sbtest");
    duplicate_suffix.schemas[0].tables[0].partitions[1].suffix = "1".to_string();

    let mut segment_on_global = mock_config("sbtest");
    segment_on_global.schemas[0].tables[1].partitions[0].segment = Some("0-4096".to_string());

    let mut global_twice = mock_config("sbtest");
    global_twice.schemas[0].tables[1].partitions[1].backend = "backend1".to_string();

    let mut empty_database = mock_config("");
    empty_database.schemas[0].tables.clear();

    for (label, config) in [
        ("zero slots", zero_slots),
        ("overlap", overlap),
        ("duplicate suffix", duplicate_suffix),
        ("segment on global", segment_on_global),
        ("global twice", global_twice),
        ("empty database", empty_database),
    ] {
        assert!(Router::from_config(&config).is_err(), "{}", label);
    }
}

#[test]
fn test_duplicate_database() {
    let mut config = mock_config("sbtest");
    config.schemas.push(config.schemas[0].clone());
    assert_eq!(
        Router::from_config(&config).unwrap_err(),
        RouterError::DatabaseExists("sbtest".to_string())
    );
}

#[test]
fn test_custom_slot_space() {
    let mut table = mock_table_a_config();
    table.partitions.truncate(2);
    table.partitions[1].segment = Some("32-64".to_string());

    let mut config = mock_config("sbtest");
    config.slots = 64;
    config.schemas[0].tables = vec![table];
    let router = Router::from_config(&config).unwrap();
    assert_eq!(router.slots(), 64);

    let meta = router.resolve_table("sbtest", "A").unwrap();
    let index = router.locate_partition(&meta, &ShardValue::Int(1)).unwrap();
    let expected = if ShardValue::Int(1).slot(64) < 32 { 0 } else { 1 };
    assert_eq!(index, expected);
}

// ============ Topology Changes ============

#[test]
fn test_database_lifecycle() {
    let router = Router::new();
    router.create_database("app").unwrap();
    router.add_table("app", &single_table("users", "b1")).unwrap();
    assert_eq!(router.tables("app").unwrap(), vec!["users"]);

    assert_eq!(
        router.add_table("missing", &single_table("users", "b1")),
        Err(RouterError::DatabaseNotFound("missing".to_string()))
    );

    router.drop_database("app").unwrap();
    assert!(router.databases().is_empty());
    assert!(router.drop_database("app").is_err());
}

#[test]
fn test_failed_reload_keeps_topology() {
    let router = mock_router("sbtest");
    let mut bad = mock_config("sbtest");
    bad.schemas[0].tables[0].shard_key = None;

    assert!(router.reload(&bad).is_err());
    assert!(router.resolve_table("sbtest", "A").is_ok());
}

#[test]
fn test_concurrent_lookups_during_reload() {
    let router = Arc::new(mock_router("sbtest"));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                for _ in 0..200 {
                    let meta = router.resolve_table("sbtest", "A").unwrap();
                    let index = router.locate_partition(&meta, &ShardValue::Int(156)).unwrap();
                    assert_eq!(router.all_partitions(&meta)[index].backend, "backend1");
                }
            })
        })
        .collect();

    for _ in 0..50 {
        router.reload(&mock_config("sbtest")).unwrap();
    }
    for reader in readers {
        reader.join().unwrap();
    }
}
