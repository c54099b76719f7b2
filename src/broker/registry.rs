//! Source registry: source id to display name and verbosity ceiling
//!
//! Ids are handed out sequentially and never reused. Id 0 always belongs to
//! the broker itself.

use crate::broker::message::SourceId;
use crate::broker::severity::Severity;

/// Display name of the broker's own source
pub const BROKER_SOURCE_NAME: &str = "MessageBroker";

/// Ceiling of the broker's own source
pub const BROKER_SOURCE_CEILING: Severity = Severity::Everything;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub id: SourceId,
    pub name: String,
    pub ceiling: Severity,
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    entries: Vec<SourceEntry>,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Registry holding only the broker's own source
    pub fn new() -> Self {
        let mut registry = Self {
            entries: Vec::new(),
        };
        registry.register(BROKER_SOURCE_CEILING, BROKER_SOURCE_NAME);
        registry
    }

    pub fn register(&mut self, ceiling: Severity, name: impl Into<String>) -> SourceId {
        let id = SourceId::new(self.entries.len());
        self.entries.push(SourceEntry {
            id,
            name: name.into(),
            ceiling,
        });
        id
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceEntry> {
        self.entries.get(id.index())
    }

    pub fn name(&self, id: SourceId) -> Option<&str> {
        self.get(id).map(|entry| entry.name.as_str())
    }

    /// Ceiling for `id`; unregistered ids only let `Quiet` output through
    pub fn ceiling(&self, id: SourceId) -> Severity {
        self.get(id)
            .map(|entry| entry.ceiling)
            .unwrap_or(Severity::Quiet)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SourceEntry] {
        &self.entries
    }
}
