use whitestone_core::db::migrations::{latest_version, schema_version};
use whitestone_core::{ConfigError, CoreConfig, DatabaseLocation};

#[test]
fn empty_document_uses_defaults() {
    let config = CoreConfig::from_json_str("{}").unwrap();

    assert_eq!(config, CoreConfig::default());
    assert_eq!(config.database, DatabaseLocation::Memory);
    assert_eq!(config.trend_window_days, 14);
    assert_eq!(config.past_weeks, 5);
    assert_eq!(config.log_dir, None);
}

#[test]
fn file_database_and_log_level_are_parsed() {
    let config = CoreConfig::from_json_str(
        r#"{
            "database": { "file": "/var/lib/whitestone/stones.db" },
            "log_level": "warn",
            "trend_window_days": 28
        }"#,
    )
    .unwrap();

    assert_eq!(
        config.database,
        DatabaseLocation::File("/var/lib/whitestone/stones.db".into())
    );
    assert_eq!(config.effective_log_level(), "warn");
    assert_eq!(config.trend_window_days, 28);
}

#[test]
fn zero_windows_are_rejected() {
    let err = CoreConfig::from_json_str(r#"{ "trend_window_days": 0 }"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "trend_window_days",
            ..
        }
    ));

    let err = CoreConfig::from_json_str(r#"{ "past_weeks": 0 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "past_weeks", .. }));
}

#[test]
fn windows_above_analytics_caps_are_rejected() {
    let err = CoreConfig::from_json_str(r#"{ "trend_window_days": 4294967295 }"#).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            field: "trend_window_days",
            ..
        }
    ));

    let err = CoreConfig::from_json_str(r#"{ "past_weeks": 523 }"#).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { field: "past_weeks", .. }));

    let config = CoreConfig::from_json_str(r#"{ "trend_window_days": 3660, "past_weeks": 522 }"#)
        .unwrap();
    assert_eq!(config.trend_window_days, 3660);
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = CoreConfig::from_json_str(r#"{ "database": "disk" }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn logging_is_skipped_without_log_dir() {
    assert!(!CoreConfig::default().init_logging().unwrap());
}

#[test]
fn open_connection_applies_migrations_for_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let config = CoreConfig {
        database: DatabaseLocation::File(dir.path().join("stones.db")),
        ..CoreConfig::default()
    };

    let conn = config.open_connection().unwrap();
    assert_eq!(schema_version(&conn).unwrap(), latest_version());
}
