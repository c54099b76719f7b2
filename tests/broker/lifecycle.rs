//! End-to-end rendering through the installed broker

use crate::common::{capture_broker, untagged_lines, verbose_config};
use msgbroker::broker::{BrokerConfig, Severity, ShutdownMode, ShutdownOutcome};
use serial_test::serial;
use std::thread;

fn major_steps() -> BrokerConfig {
    BrokerConfig::default().with_overall_verbosity(Severity::MajorSteps)
}

#[test]
#[serial]
fn test_single_thread_output_follows_call_order() {
    let (guard, output) = capture_broker(major_steps());
    let a = guard.register_source(Severity::Everything, "Alpha").unwrap();
    let b = guard.register_source(Severity::Everything, "Beta").unwrap();

    for i in 0..20 {
        let source = if i % 2 == 0 { a } else { b };
        guard
            .process_message(source, Severity::MajorSteps, format!("event {}", i))
            .unwrap();
    }
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    let expected: Vec<String> = (0..20)
        .map(|i| {
            let name = if i % 2 == 0 { "Alpha" } else { "Beta" };
            format!("Info:  {} - event {}", name, i)
        })
        .collect();
    assert_eq!(untagged_lines(&output.contents()), expected);
}

#[test]
#[serial]
fn test_ticker_interrupted_by_other_source() {
    let (guard, output) = capture_broker(major_steps());
    let a = guard.register_source(Severity::Everything, "A").unwrap();
    let b = guard.register_source(Severity::Everything, "B").unwrap();

    guard.process_message(a, Severity::MajorSteps, "load .").unwrap();
    guard.process_message(a, Severity::MajorSteps, "load .").unwrap();
    guard.process_message(b, Severity::MajorSteps, "sync .").unwrap();
    guard.process_message(a, Severity::MajorSteps, "load .").unwrap();
    guard.process_message(a, Severity::MajorSteps, "done").unwrap();
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    assert_eq!(
        untagged_lines(&output.contents()),
        vec![
            "Info:  A - load .\u{8}|\u{8}/\u{8}=\u{8}\\".to_string(),
            "Info:  A - done".to_string(),
        ]
    );
}

#[test]
#[serial]
fn test_pass_through_text_is_separated_from_annotated_lines() {
    let (guard, output) = capture_broker(major_steps());
    let a = guard.register_source(Severity::Everything, "A").unwrap();

    guard.process_message(a, Severity::Quiet, "raw output\n").unwrap();
    guard.process_message(a, Severity::Errors, "after").unwrap();
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    let text = output.contents();
    assert!(text.starts_with("raw output\n\n["));
    assert_eq!(
        untagged_lines(&text),
        vec!["raw output", "", "Error: A - after"]
    );
}

#[test]
#[serial]
fn test_everything_queued_before_shutdown_is_rendered() {
    let (guard, output) = capture_broker(verbose_config());
    let bulk = guard.register_source(Severity::Everything, "Bulk").unwrap();

    for i in 0..1000 {
        guard
            .process_message(bulk, Severity::MinorSteps, format!("item {}", i))
            .unwrap();
    }
    assert_eq!(
        guard.shutdown_with(ShutdownMode::Join).unwrap(),
        ShutdownOutcome::Stopped
    );

    let text = output.contents();
    let last_item = text.find("Bulk - item 999\n").unwrap();
    let exit = text.find("MessageBroker::run - exit\n").unwrap();
    assert!(last_item < exit);
    assert_eq!(text.matches("Bulk - item ").count(), 1000);
}

#[test]
#[serial]
fn test_messages_carry_the_producing_thread() {
    let (guard, output) = capture_broker(major_steps());
    let broker = guard.broker();
    let src = guard.register_source(Severity::Everything, "Src").unwrap();

    guard.process_message(src, Severity::Errors, "from main").unwrap();
    thread::spawn(move || {
        broker
            .process_message(src, Severity::Errors, "from worker")
            .unwrap();
    })
    .join()
    .unwrap();
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    let text = output.contents();
    let tag_of = |needle: &str| {
        let line = text.lines().find(|line| line.ends_with(needle)).unwrap();
        line[..line.find(']').unwrap()].to_string()
    };
    assert_ne!(tag_of("from main"), tag_of("from worker"));
}

#[test]
#[serial]
fn test_colored_labels() {
    let (guard, output) = capture_broker(major_steps().with_color(true));
    let net = guard.register_source(Severity::Everything, "Net").unwrap();

    guard.process_message(net, Severity::Errors, "boom").unwrap();
    guard.shutdown_with(ShutdownMode::Join).unwrap();

    assert!(output.contents().contains("\x1b[31mError:\x1b[0m Net - boom\n"));
}
