//! Relay of line-oriented input through the broker

use crate::common::{capture_broker, untagged_lines};
use msgbroker::app::relay::{Relay, RelayStats, STDIN_SOURCE_NAME};
use msgbroker::broker::{BrokerConfig, Severity, ShutdownMode};
use serial_test::serial;
use std::io::Cursor;

fn errors_only() -> BrokerConfig {
    BrokerConfig::default().with_overall_verbosity(Severity::Errors)
}

#[test]
#[serial]
fn test_relay_mixed_input() {
    let config = BrokerConfig::default()
        .with_overall_verbosity(Severity::MajorSteps)
        .with_source("Noisy", Severity::Errors);
    let (guard, output) = capture_broker(config);

    let input = "\
plain line
@errors Net connect failed
@minor-steps Net hidden
@major-steps Noisy also hidden
@major-steps Store ::open - done
@bogus not annotated
";
    let stats = Relay::new(guard.broker())
        .unwrap()
        .run(Cursor::new(input))
        .unwrap();
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    assert_eq!(
        stats,
        RelayStats {
            lines: 6,
            queued: 4,
            filtered: 2,
        }
    );
    assert_eq!(
        untagged_lines(&output.contents()),
        vec![
            "plain line",
            "Error: Net - connect failed",
            "Info:  Store::open - done",
            "@bogus not annotated",
        ]
    );
}

#[test]
#[serial]
fn test_relay_pass_through_keeps_line_structure() {
    let (guard, output) = capture_broker(errors_only());

    let input = "first\n\nsecond\n@errors Net failed\nthird\n";
    Relay::new(guard.broker())
        .unwrap()
        .run(Cursor::new(input))
        .unwrap();
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    let text = output.contents();
    assert!(text.starts_with("first\n\nsecond\n["));
    assert!(text.ends_with("] Error: Net - failed\nthird\n"));
}

#[test]
#[serial]
fn test_relay_finish_terminates_open_pass_through_line() {
    let (guard, output) = capture_broker(errors_only());

    let mut relay = Relay::new(guard.broker()).unwrap();
    relay.relay_line("partial").unwrap();
    relay.finish().unwrap();
    relay.finish().unwrap();
    assert_eq!(relay.stats().lines, 1);
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    assert_eq!(output.contents(), "partial\n");
}

#[test]
#[serial]
fn test_relay_registers_each_source_once() {
    let (guard, _output) = capture_broker(BrokerConfig::default());

    let mut relay = Relay::new(guard.broker()).unwrap();
    relay.relay_line("@errors Net one").unwrap();
    relay.relay_line("@errors Net two").unwrap();
    relay.relay_line("@errors Disk three").unwrap();

    let sources = guard.sources().unwrap();
    let names: Vec<&str> = sources
        .entries()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(names, vec!["MessageBroker", STDIN_SOURCE_NAME, "Net", "Disk"]);
    assert_eq!(relay.stats().queued, 3);
}

#[test]
#[serial]
fn test_relay_after_shutdown_fails() {
    let (guard, _output) = capture_broker(BrokerConfig::default());
    let broker = guard.broker();
    let mut relay = Relay::new(broker).unwrap();

    guard.shutdown_with(ShutdownMode::Join).unwrap();
    assert!(relay.relay_line("too late").is_err());
}
