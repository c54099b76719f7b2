//! Command line parsing tests

use clap::Parser;
use msgbroker::app::cli::args::Args;
use msgbroker::broker::{BrokerConfig, Severity};
use msgbroker::core::logging::LogFormat;
use std::time::Duration;

#[test]
fn test_defaults_leave_config_untouched() {
    let args = Args::try_parse_from(["msgbroker"]).unwrap();
    assert_eq!(args.verbosity, None);
    assert!(args.sources.is_empty());
    assert_eq!(args.color_override(), None);
    assert_eq!(args.log_format(), LogFormat::Text);

    let config = BrokerConfig::default();
    assert_eq!(args.apply_overrides(config.clone()), config);
}

#[test]
fn test_verbosity_accepts_names_and_numbers() {
    let by_name = Args::try_parse_from(["msgbroker", "--verbosity", "Major-Steps"]).unwrap();
    assert_eq!(by_name.verbosity, Some(Severity::MajorSteps));

    let by_number = Args::try_parse_from(["msgbroker", "-v", "0"]).unwrap();
    assert_eq!(by_number.verbosity, Some(Severity::Quiet));

    assert!(Args::try_parse_from(["msgbroker", "-v", "7"]).is_err());
    assert!(Args::try_parse_from(["msgbroker", "-v", "loud"]).is_err());
}

#[test]
fn test_repeated_source_overrides() {
    let args = Args::try_parse_from([
        "msgbroker",
        "--source",
        "Net=errors",
        "-s",
        "Disk=everything",
        "--source",
        "Net=quiet",
    ])
    .unwrap();
    assert_eq!(args.sources.len(), 3);

    // Later flags win for the same name
    let config = args.apply_overrides(BrokerConfig::default());
    assert_eq!(config.sources["Net"], Severity::Quiet);
    assert_eq!(config.sources["Disk"], Severity::Everything);
}

#[test]
fn test_color_flags_conflict() {
    assert!(Args::try_parse_from(["msgbroker", "--color", "--no-color"]).is_err());

    let args = Args::try_parse_from(["msgbroker", "--no-color"]).unwrap();
    let config = args.apply_overrides(BrokerConfig::default().with_color(true));
    assert!(!config.color);
}

#[test]
fn test_shutdown_timeout_override() {
    let args = Args::try_parse_from(["msgbroker", "--shutdown-timeout-ms", "750"]).unwrap();
    let config = args.apply_overrides(BrokerConfig::default());
    assert_eq!(config.shutdown_timeout(), Duration::from_millis(750));
}

#[test]
fn test_log_options() {
    let args = Args::try_parse_from([
        "msgbroker",
        "--log-level",
        "debug",
        "--log-format",
        "json",
        "--log-file",
        "none",
    ])
    .unwrap();
    assert_eq!(args.log_level.as_deref(), Some("debug"));
    assert_eq!(args.log_format(), LogFormat::Json);
    assert_eq!(args.log_file(), None);

    assert!(Args::try_parse_from(["msgbroker", "--log-format", "xml"]).is_err());
}
