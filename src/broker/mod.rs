//! Message Broker Component
//!
//! Serialises diagnostic output from many threads onto one stream. Producer
//! threads filter and enqueue; a single consumer thread owns formatting and
//! the output sink.
//!
//! # Overview
//!
//! - **Two-level verbosity**: a message is shown only when its severity is at
//!   or below both the overall ceiling and its source's ceiling
//! - **Per-source names**: sources register once and get a small integer id
//! - **Ticker coalescing**: text ending in `" ."` becomes a rotating glyph
//! - **Bounded shutdown**: everything queued before shutdown is rendered, but
//!   a stuck consumer cannot hold the caller past the configured timeout
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐
//! │  Producer A  │   │  Producer B  │   process_message: filter, tag thread
//! └──────┬───────┘   └──────┬───────┘
//!        ▼                  ▼
//! ┌──────────────────────────────────┐
//! │     BlockingQueue<Message>       │
//! └────────────────┬─────────────────┘
//!                  ▼
//! ┌──────────────────────────────────┐   re-filter, format, tick,
//! │  ConsumerLoop (msgbroker-consumer)│──▶ write to sink
//! └──────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use msgbroker::broker::{BrokerConfig, MessageBroker, SharedBuffer, Severity, ShutdownMode};
//!
//! let output = SharedBuffer::new();
//! let broker = MessageBroker::init(
//!     BrokerConfig::default().with_overall_verbosity(Severity::Everything),
//!     output.boxed(),
//! )
//! .unwrap();
//!
//! let net = broker.register_source(Severity::Everything, "Net").unwrap();
//! broker.process_message(net, Severity::Errors, "connect failed").unwrap();
//! broker.shutdown_with(ShutdownMode::Join).unwrap();
//!
//! assert!(output.contents().contains("Error: Net - connect failed\n"));
//! ```

mod config;
mod consumer;
mod error;
mod manager;
mod message;
mod registry;
mod render;
mod severity;
mod sink;
mod state;

pub use config::{BrokerConfig, DEFAULT_SHUTDOWN_TIMEOUT_MS};
pub use error::{BrokerError, BrokerResult, ConfigError};
pub use manager::{BrokerGuard, MessageBroker, ShutdownMode, ShutdownOutcome};
pub use message::{Action, Message, SourceId, ThreadTag, MEMBER_PREFIX, TICKER_SUFFIX};
pub use registry::{SourceEntry, SourceRegistry, BROKER_SOURCE_CEILING, BROKER_SOURCE_NAME};
pub use render::{format_message, Renderer, TickerState, INTERRUPTED_TICK_GLYPHS, TICK_GLYPHS};
pub use severity::{ParseSeverityError, Severity};
pub use sink::{stderr_sink, SharedBuffer, Sink};

#[cfg(test)]
mod tests;
