//! Standard input relay
//!
//! Feeds text lines into the broker. A line of the form
//! `@<level> <source> <text>` becomes an annotated message from `<source>`,
//! registered the first time it is seen; any other line is passed through
//! verbatim from the `stdin` source at `Quiet`.
//!
//! Pass-through text is sent without its terminator. The line break is added
//! in front of the next pass-through line, or at end of input, so that an
//! annotated line following plain text is not preceded by a blank line.

use crate::broker::{BrokerError, MessageBroker, Severity, SourceId};
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

/// Source name used for pass-through lines
pub const STDIN_SOURCE_NAME: &str = "stdin";

const ANNOTATION_PREFIX: char = '@';

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// One classified input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayLine<'a> {
    Plain(&'a str),
    Annotated {
        severity: Severity,
        source: &'a str,
        text: &'a str,
    },
}

impl<'a> RelayLine<'a> {
    /// Classify a line; malformed annotations fall back to plain text
    pub fn parse(line: &'a str) -> Self {
        let Some(rest) = line.strip_prefix(ANNOTATION_PREFIX) else {
            return RelayLine::Plain(line);
        };
        let mut parts = rest.splitn(3, ' ');
        let (Some(level), Some(source)) = (parts.next(), parts.next()) else {
            return RelayLine::Plain(line);
        };
        match Severity::parse(level) {
            Ok(severity) if !source.is_empty() => RelayLine::Annotated {
                severity,
                source,
                text: parts.next().unwrap_or(""),
            },
            _ => RelayLine::Plain(line),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub lines: u64,
    /// Lines accepted by the broker
    pub queued: u64,
    /// Lines dropped by verbosity filtering
    pub filtered: u64,
}

pub struct Relay {
    broker: Arc<MessageBroker>,
    stdin_source: SourceId,
    sources: HashMap<String, SourceId>,
    stats: RelayStats,
    /// Last queued line was pass-through text still missing its line break
    line_open: bool,
}

impl Relay {
    pub fn new(broker: Arc<MessageBroker>) -> Result<Self, RelayError> {
        let stdin_source = broker.register_source(Severity::Everything, STDIN_SOURCE_NAME)?;
        Ok(Self {
            broker,
            stdin_source,
            sources: HashMap::new(),
            stats: RelayStats::default(),
            line_open: false,
        })
    }

    fn source_id(&mut self, name: &str) -> Result<SourceId, RelayError> {
        if let Some(id) = self.sources.get(name) {
            return Ok(*id);
        }
        let id = self.broker.register_source(Severity::Everything, name)?;
        self.sources.insert(name.to_string(), id);
        Ok(id)
    }

    /// Hand one line (without its terminator) to the broker
    pub fn relay_line(&mut self, line: &str) -> Result<bool, RelayError> {
        let queued = match RelayLine::parse(line) {
            RelayLine::Plain(text) => {
                let text = if self.line_open {
                    format!("\n{}", text)
                } else {
                    text.to_string()
                };
                let queued = self
                    .broker
                    .process_message(self.stdin_source, Severity::Quiet, text)?;
                if queued {
                    self.line_open = true;
                }
                queued
            }
            RelayLine::Annotated {
                severity,
                source,
                text,
            } => {
                let id = self.source_id(source)?;
                let queued = self.broker.process_message(id, severity, text)?;
                if queued {
                    self.line_open = false;
                }
                queued
            }
        };

        self.stats.lines += 1;
        if queued {
            self.stats.queued += 1;
        } else {
            self.stats.filtered += 1;
        }
        Ok(queued)
    }

    /// Relay every line from `reader` until end of input
    pub fn run(mut self, reader: impl BufRead) -> Result<RelayStats, RelayError> {
        for line in reader.lines() {
            let line = line?;
            self.relay_line(line.trim_end_matches('\r'))?;
        }
        self.finish()?;
        log::debug!("relay finished: {:?}", self.stats);
        Ok(self.stats)
    }

    /// Terminate trailing pass-through text; not counted as a line
    pub fn finish(&mut self) -> Result<(), RelayError> {
        if self.line_open {
            self.broker
                .process_message(self.stdin_source, Severity::Quiet, "\n")?;
            self.line_open = false;
        }
        Ok(())
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }
}
