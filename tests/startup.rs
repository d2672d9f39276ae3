//! Startup failures are fatal and reported with context.

use std::path::PathBuf;

use geostat::{run_pipeline, Config, DbSettings, Settings, Transport};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn config_in(dir: &TempDir, geo_db: PathBuf) -> Config {
    Config {
        log_file: dir.path().join("access.log"),
        geo_db,
        settings: Settings {
            db: DbSettings {
                transport: Transport::Http,
                ..Default::default()
            },
            ..Default::default()
        },
    }
}

#[tokio::test]
async fn test_missing_geo_database_fails_startup() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let config = config_in(&dir, dir.path().join("GeoLite2-City.mmdb"));

    let err = run_pipeline(config, CancellationToken::new())
        .await
        .expect_err("missing database is fatal");
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to open GeoIP database"), "{}", message);
}

#[tokio::test]
async fn test_corrupt_geo_database_fails_startup() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let geo_db = dir.path().join("corrupt.mmdb");
    std::fs::write(&geo_db, b"definitely not a maxmind database").expect("Failed to write file");
    let config = config_in(&dir, geo_db);

    let err = run_pipeline(config, CancellationToken::new())
        .await
        .expect_err("corrupt database is fatal");
    assert!(format!("{:#}", err).contains("Failed to parse GeoIP database"));
}

#[tokio::test]
async fn test_unresolvable_udp_host_fails_startup() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let mut config = config_in(&dir, dir.path().join("GeoLite2-City.mmdb"));
    config.settings.db.transport = Transport::Udp;
    config.settings.db.host = "influx.invalid".to_string();

    let err = run_pipeline(config, CancellationToken::new())
        .await
        .expect_err("unresolvable store host is fatal");
    assert!(format!("{:#}", err).contains("Failed to initialize InfluxDB writer"));
}

#[test]
fn test_settings_file_feeds_config() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("geostat.yaml");
    std::fs::write(
        &path,
        "db:\n  host: influx.internal\n  full_size: 500\n  insert_tim_int: 30\n  retention_policy:\n    name: two_weeks\n    value: 14d\n",
    )
    .expect("Failed to write settings");

    let settings = Settings::load(Some(&path)).expect("settings should load");
    assert_eq!(settings.db.host, "influx.internal");
    assert_eq!(settings.db.full_size, 500);
    assert_eq!(settings.db.insert_time_interval, 30);
    assert_eq!(settings.db.retention_policy.name, "two_weeks");
    assert_eq!(settings.db.port, 8089);
    assert_eq!(settings.geo.precision, 12);
}
