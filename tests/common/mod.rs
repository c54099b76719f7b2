//! Common test utilities and helpers

#![allow(dead_code)]

use msgbroker::broker::{BrokerConfig, BrokerGuard, MessageBroker, Severity, SharedBuffer};

/// Install a broker that writes into an in-memory buffer
pub fn capture_broker(config: BrokerConfig) -> (BrokerGuard, SharedBuffer) {
    let output = SharedBuffer::new();
    let guard = MessageBroker::init(config, output.boxed()).expect("broker installs");
    (guard, output)
}

pub fn verbose_config() -> BrokerConfig {
    BrokerConfig::default().with_overall_verbosity(Severity::Everything)
}

/// Lines of rendered output with the `[tag] ` prefix removed
pub fn untagged_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(|line| match line.split_once("] ") {
            Some((tag, rest)) if tag.starts_with('[') => rest.to_string(),
            _ => line.to_string(),
        })
        .collect()
}
