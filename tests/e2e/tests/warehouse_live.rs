//! End-to-end round trip against a real MariaDB/ColumnStore instance.
//!
//! Ignored by default — there is no database in a plain `cargo test` run.
//! Point `ENERGYLABEL_TEST_MARIADB_HOST` (and friends) at a disposable
//! instance and run with `cargo test -- --ignored` to exercise it.

use energylabel_core::{Run, Warehouse, WarehouseConfig};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn live_config() -> WarehouseConfig {
    WarehouseConfig {
        host: env_or("ENERGYLABEL_TEST_MARIADB_HOST", "127.0.0.1"),
        port: env_or("ENERGYLABEL_TEST_MARIADB_PORT", "3306").parse().unwrap(),
        user: env_or("ENERGYLABEL_TEST_MARIADB_USER", "root"),
        password: env_or("ENERGYLABEL_TEST_MARIADB_PASSWORD", ""),
        database: env_or("ENERGYLABEL_TEST_MARIADB_DATABASE", "energylabel_test"),
        ..WarehouseConfig::default()
    }
}

fn sample_run(path: &str) -> Run {
    Run {
        score: 91,
        status_code: 200,
        error_message: None,
        plugin_version: "3.0.0".to_string(),
        plugin_name: "DBTest".to_string(),
        extension_version: "1.2.0".to_string(),
        browser_version: "124.0".to_string(),
        browser_name: "Chrome".to_string(),
        path: path.to_string(),
        url: "https://example.com".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a live MariaDB/ColumnStore instance"]
async fn init_insert_and_drop_round_trips_cleanly() {
    let warehouse = Warehouse::new(live_config()).await.expect("connect to warehouse");

    warehouse.drop_tables().await.expect("drop any leftover tables");
    warehouse.init().await.expect("create tables");

    warehouse
        .insert_runs(&[sample_run("/a"), sample_run("/b")])
        .await
        .expect("insert records");

    warehouse.drop_tables().await.expect("clean up tables");
}

#[tokio::test]
#[ignore = "requires a live MariaDB/ColumnStore instance"]
async fn repeated_dimension_values_deduplicate_across_records() {
    let warehouse = Warehouse::new(live_config()).await.expect("connect to warehouse");
    warehouse.drop_tables().await.expect("drop any leftover tables");
    warehouse.init().await.expect("create tables");

    let runs: Vec<Run> = (0..5).map(|i| sample_run(&format!("/same-browser/{i}"))).collect();
    warehouse.insert_runs(&runs).await.expect("insert records");

    warehouse.drop_tables().await.expect("clean up tables");
}
