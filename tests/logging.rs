use reverse_rewrite::config::LoggingConfig;
use reverse_rewrite::logging::init_logging;

// Only one test per binary can install the global subscriber
#[test]
fn test_init_logging_to_file() {
    // The configured level must apply
    unsafe { std::env::remove_var("RUST_LOG") };
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("gateway.log");
    let config = LoggingConfig {
        level: "info".to_string(),
        file: Some(log_file.to_string_lossy().to_string()),
        json: true,
        rotation: false,
    };

    let guard = init_logging(&config).unwrap();
    assert!(guard.is_some());
    tracing::info!(rules = 3, "Reverse proxy rules loaded");
    drop(guard);

    let content = std::fs::read_to_string(&log_file).unwrap();
    let line = content.lines().last().unwrap();
    let json: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(json["fields"]["message"], "Reverse proxy rules loaded");
    assert_eq!(json["level"], "INFO");

    // A second subscriber cannot be installed
    assert!(init_logging(&LoggingConfig::default()).is_err());
}
