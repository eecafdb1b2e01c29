use reverse_rewrite::config::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(!config.reverse.reverse_only);
    assert!(!config.reverse.reverse_magic);
    assert!(config.reverse.rules.is_empty());
    assert!(config.gateway.enabled);
    assert_eq!(config.gateway.port, 8888);
    assert_eq!(config.healthcheck.port, 8889);
    assert_eq!(config.healthcheck.path, "/health");
    assert_eq!(config.upstream.timeout_secs, 30);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_toml() {
    let file = write_config(
        r#"
[reverse]
reverse_only = true
reverse_magic = true

[[reverse.rules]]
path = "/api"
url = "http://api-backend:8080/"

[[reverse.rules]]
host = "shop.example.com"
url = "https://shop-backend/"

[[reverse.rules]]
url = "http://default-backend/"

[gateway]
bind_address = "127.0.0.1"
port = 9000

[healthcheck]
enabled = false

[upstream]
timeout_secs = 5

[logging]
level = "debug"
json = true
"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    assert!(config.reverse.reverse_only);
    assert!(config.reverse.reverse_magic);
    assert_eq!(config.reverse.rules.len(), 3);
    assert_eq!(
        config.reverse.rules[0],
        RuleConfig::path("/api", "http://api-backend:8080/")
    );
    assert_eq!(
        config.reverse.rules[1],
        RuleConfig::host("shop.example.com", "https://shop-backend/")
    );
    assert_eq!(config.reverse.rules[2].path, None);
    assert_eq!(config.gateway.bind_address, "127.0.0.1");
    assert_eq!(config.gateway.port, 9000);
    assert!(config.gateway.enabled);
    assert!(!config.healthcheck.enabled);
    assert_eq!(config.upstream.timeout_secs, 5);
    // Unset fields keep their defaults
    assert_eq!(config.upstream.keepalive_secs, 60);
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json);
    assert!(config.validate().is_ok());
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = write_config("");
    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.gateway.port, 8888);
    assert!(config.reverse.rules.is_empty());
}

#[test]
fn test_invalid_toml_is_an_error() {
    let file = write_config("[reverse\nreverse_only = ");
    assert!(AppConfig::from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let err = AppConfig::from_file("/nonexistent/reverse-rewrite.toml").unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config file"));
}

#[test]
fn test_load_or_default() {
    let config = AppConfig::load_or_default("/nonexistent/reverse-rewrite.toml");
    assert_eq!(config.gateway.port, 8888);

    let file = write_config("[gateway]\nport = 7000\n");
    let config = AppConfig::load_or_default(file.path());
    assert_eq!(config.gateway.port, 7000);
}

#[test]
fn test_broken_rules_pass_validation() {
    let mut config = AppConfig::default();
    config.reverse.rules.push(RuleConfig::path("no-slash", "not-a-url"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_zero_port() {
    let mut config = AppConfig::default();
    config.gateway.port = 0;
    assert!(config.validate().is_err());

    // Disabled listeners are not checked
    config.gateway.enabled = false;
    assert!(config.validate().is_ok());

    config.healthcheck.port = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_address() {
    let mut config = AppConfig::default();
    config.gateway.bind_address = "not an address".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("not an address"));
}

#[test]
fn test_validate_rejects_relative_health_path() {
    let mut config = AppConfig::default();
    config.healthcheck.path = "health".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_timeout() {
    let mut config = AppConfig::default();
    config.upstream.timeout_secs = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_body_limit() {
    let mut config = AppConfig::default();
    config.upstream.max_request_body_bytes = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.upstream.max_response_body_bytes = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "reverse_rewrite=[".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_socket_addr() {
    let config = ServerPortConfig {
        enabled: true,
        bind_address: "127.0.0.1".to_string(),
        port: 8080,
    };
    assert_eq!(
        config.socket_addr().unwrap(),
        "127.0.0.1:8080".parse().unwrap()
    );
}

#[test]
fn test_upstream_durations() {
    let config = UpstreamConfig::default();
    assert_eq!(config.timeout().as_secs(), 30);
    assert_eq!(config.keepalive().as_secs(), 60);
    assert_eq!(config.connect_timeout().as_secs(), 10);
    assert_eq!(config.max_request_body_bytes, 10 * 1024 * 1024);
    assert_eq!(config.max_response_body_bytes, 64 * 1024 * 1024);
}
