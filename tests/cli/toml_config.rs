//! Configuration file tests

use msgbroker::app::cli::args::Args;
use msgbroker::broker::{BrokerConfig, ConfigError, Severity};
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_file() {
    let file = config_file(
        r#"
overall_verbosity = "everything"
shutdown_timeout_ms = 40
color = true

[sources]
Net = "errors"
Indexer = "2"
"#,
    );
    let config = BrokerConfig::load(file.path()).unwrap();
    assert_eq!(config.overall_verbosity, Severity::Everything);
    assert_eq!(config.shutdown_timeout_ms, 40);
    assert!(config.color);
    assert_eq!(config.sources["Net"], Severity::Errors);
    assert_eq!(config.sources["Indexer"], Severity::MajorSteps);
}

#[test]
fn test_unknown_keys_are_rejected() {
    let file = config_file("verbosity = \"errors\"\n");
    assert!(matches!(
        BrokerConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_bad_severity_is_rejected() {
    let file = config_file("[sources]\nNet = \"loud\"\n");
    assert!(BrokerConfig::load(file.path()).is_err());
}

#[test]
fn test_config_file_flag_feeds_resolution() {
    let file = config_file("overall_verbosity = \"errors\"\n");
    let args = Args {
        config_file: Some(file.path().to_path_buf()),
        ..Args::new()
    };
    let config = args.resolve_config().unwrap();
    assert_eq!(config.overall_verbosity, Severity::Errors);
}
