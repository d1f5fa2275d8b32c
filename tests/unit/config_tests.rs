use std::io::Write;
use std::time::Duration;

use agi_link::{config::GlobalConfig, AppError};

fn sample_toml() -> &'static str {
    r#"
listen_addr = "127.0.0.1:4574"
deadline_seconds = 10
max_block_bytes = 65536
default_command = "HANGUP"

[routes]
"1234567890" = "EXEC TRANSFER \"SIP/abc@somehost.com\""
"0123456789" = "EXEC TRANSFER \"SIP/bca@somehost.com\""
"#
}

#[test]
fn parses_valid_config() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");

    assert_eq!(config.listen_addr, "127.0.0.1:4574");
    assert_eq!(config.deadline_seconds, 10);
    assert_eq!(config.max_block_bytes, Some(65536));
    assert_eq!(config.routes.len(), 2);
    assert_eq!(
        config.routes["1234567890"],
        "EXEC TRANSFER \"SIP/abc@somehost.com\""
    );
}

#[test]
fn empty_document_uses_defaults() {
    let config = GlobalConfig::from_toml_str("").expect("empty config parses");

    assert_eq!(config, GlobalConfig::default());
    assert_eq!(config.listen_addr, "0.0.0.0:4573");
    assert_eq!(config.deadline_seconds, 5);
    assert_eq!(config.max_block_bytes, None);
    assert_eq!(config.default_command, "HANGUP");
    assert!(config.routes.is_empty());
}

#[test]
fn default_config_is_valid() {
    GlobalConfig::default()
        .validate()
        .expect("defaults validate");
}

#[test]
fn connection_deadline_follows_seconds() {
    let config = GlobalConfig::default();
    assert_eq!(config.connection_deadline(), Some(Duration::from_secs(5)));

    let disabled = GlobalConfig::from_toml_str("deadline_seconds = 0").expect("parses");
    assert_eq!(disabled.connection_deadline(), None);
}

#[test]
fn socket_addr_parses_listen_addr() {
    let config = GlobalConfig::from_toml_str(sample_toml()).expect("config parses");
    let addr = config.socket_addr().expect("valid address");
    assert_eq!(addr.port(), 4574);
}

#[test]
fn invalid_listen_addr_is_rejected() {
    let result = GlobalConfig::from_toml_str(r#"listen_addr = "not an address""#);
    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.contains("listen_addr")
    ));
}

#[test]
fn zero_max_block_bytes_is_rejected() {
    let result = GlobalConfig::from_toml_str("max_block_bytes = 0");
    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.contains("max_block_bytes")
    ));
}

#[test]
fn empty_default_command_is_rejected() {
    let result = GlobalConfig::from_toml_str(r#"default_command = "  ""#);
    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.contains("default_command")
    ));
}

#[test]
fn multi_line_route_command_is_rejected() {
    let toml = r#"
[routes]
"100" = "EXEC Dial SIP/100\nHANGUP"
"#;
    let result = GlobalConfig::from_toml_str(toml);
    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.contains("routes.100")
    ));
}

#[test]
fn unknown_field_is_rejected() {
    let result = GlobalConfig::from_toml_str("http_port = 3000");
    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.starts_with("invalid config")
    ));
}

#[test]
fn negative_deadline_is_rejected() {
    let result = GlobalConfig::from_toml_str("deadline_seconds = -1");
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn loads_from_path() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file
        .write_all(sample_toml().as_bytes())
        .expect("write config");

    let config = GlobalConfig::load_from_path(file.path()).expect("config loads");

    assert_eq!(config.routes.len(), 2);
}

#[test]
fn missing_file_is_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");

    let result = GlobalConfig::load_from_path(dir.path().join("absent.toml"));

    assert!(matches!(
        result,
        Err(AppError::Config(msg)) if msg.contains("failed to read config")
    ));
}
