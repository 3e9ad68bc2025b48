//! Configuration loading tests.

mod common;

use std::io::Write;
use std::path::Path;

use common::{minimal_stub_resolver, stub_resolver, STUB_PATH};
use edge_transport::config::env_vars;
use edge_transport::status;
use edge_transport::{Connection, EdgeError, TransportConfig};

use edge_transport_stub as stub;

const SAMPLE: &str = r#"
library = "/opt/transports/libstub.so"

[policy]
allowed_dirs = ["/opt/transports"]
check_extension = true
max_file_size = 1048576

[info]
device_name = "gateway-01"
mode = "fast"
"#;

#[test]
fn test_parse_full_config() {
    let config = TransportConfig::from_toml_str(SAMPLE).unwrap();

    assert_eq!(config.library_path().unwrap(), Path::new(STUB_PATH));
    assert_eq!(config.policy.allowed_dirs.len(), 1);
    assert!(config.policy.check_extension);
    assert_eq!(config.policy.max_file_size, Some(1_048_576));
    assert_eq!(config.info.get("device_name").map(String::as_str), Some("gateway-01"));
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();

    let config = TransportConfig::from_file(file.path()).unwrap();
    assert_eq!(config.info.len(), 2);

    let text = config.to_toml_string().unwrap();
    assert_eq!(TransportConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TransportConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, EdgeError::Config(_)));
}

#[test]
fn test_env_override_of_library() {
    let mut config = TransportConfig::from_toml_str(SAMPLE).unwrap();
    config.apply_env_from(|name| {
        (name == env_vars::LIBRARY).then(|| "/srv/other/libother.so".to_string())
    });
    assert_eq!(config.library_path().unwrap(), Path::new("/srv/other/libother.so"));
}

#[test]
fn test_from_config_applies_info() {
    let (resolver, counters) = stub_resolver();
    let mut config = TransportConfig::new(STUB_PATH);
    config.info.insert("mode".to_string(), "fast".to_string());
    config.info.insert("region".to_string(), "eu".to_string());

    let conn = Connection::from_config_with(resolver, &config).unwrap();
    assert_eq!(conn.get_info("mode").unwrap(), "fast");
    assert_eq!(conn.get_info("region").unwrap(), "eu");
    assert_eq!(stub::count("set_info"), 2);

    drop(conn);
    assert_eq!(counters.live(), 0);
}

#[test]
fn test_from_config_releases_on_info_failure() {
    let (resolver, counters) = minimal_stub_resolver();
    let mut config = TransportConfig::new(STUB_PATH);
    config.info.insert("mode".to_string(), "fast".to_string());

    let err = Connection::from_config_with(resolver, &config).unwrap_err();
    assert_eq!(err, EdgeError::NotSupported);
    assert_eq!(stub::calls(), vec!["create", "close"]);
    assert_eq!(counters.live(), 0);
}

#[test]
fn test_close_failure_after_info_failure_is_logged() {
    let (resolver, counters) = minimal_stub_resolver();
    stub::fail("close", status::IO);
    let mut config = TransportConfig::new(STUB_PATH);
    config.info.insert("mode".to_string(), "fast".to_string());

    let (result, logs) = common::capture_logs(|| Connection::from_config_with(resolver, &config));

    assert_eq!(result.unwrap_err(), EdgeError::NotSupported);
    assert!(logs.contains("Release after info failure failed"), "{}", logs);
    assert_eq!(stub::count("close"), 1);
    assert_eq!(counters.live(), 0);
}

#[test]
fn test_from_config_without_library() {
    let (resolver, counters) = stub_resolver();
    let err = Connection::from_config_with(resolver, &TransportConfig::default()).unwrap_err();
    assert!(matches!(err, EdgeError::Config(_)));
    assert_eq!(counters.opens.get(), 0);
}
