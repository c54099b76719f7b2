//! Messages carried from producer threads to the consumer thread

use crate::broker::severity::Severity;
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Text suffix marking a progress (ticker) message
pub const TICKER_SUFFIX: &str = " .";

/// Text prefix meaning the text continues the source name, e.g. `::method - ...`
pub const MEMBER_PREFIX: &str = "::";

static NEXT_THREAD_TAG: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TAG: Cell<Option<ThreadTag>> = const { Cell::new(None) };
}

/// Small integer identifying the OS thread that produced a message
///
/// Tags are handed out sequentially the first time a thread asks for one, so
/// they stay short enough to read in rendered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadTag(u64);

impl ThreadTag {
    /// Tag of the calling thread
    pub fn current() -> Self {
        THREAD_TAG.with(|slot| match slot.get() {
            Some(tag) => tag,
            None => {
                let tag = ThreadTag(NEXT_THREAD_TAG.fetch_add(1, Ordering::Relaxed));
                slot.set(Some(tag));
                tag
            }
        })
    }

    pub fn from_raw(raw: u64) -> Self {
        ThreadTag(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of a registered message source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(usize);

impl SourceId {
    /// The broker's own diagnostics
    pub const BROKER: SourceId = SourceId(0);

    pub fn new(raw: usize) -> Self {
        SourceId(raw)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// What the consumer should do with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Display,
    /// Stop the consumer; always the last message it handles
    Kill,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    action: Action,
    thread: ThreadTag,
    source: SourceId,
    severity: Severity,
    text: String,
}

impl Message {
    /// Display message tagged with the calling thread
    pub fn display(source: SourceId, severity: Severity, text: impl Into<String>) -> Self {
        Self::from_thread(ThreadTag::current(), source, severity, text)
    }

    /// Display message tagged with an explicit thread
    pub fn from_thread(
        thread: ThreadTag,
        source: SourceId,
        severity: Severity,
        text: impl Into<String>,
    ) -> Self {
        Self {
            action: Action::Display,
            thread,
            source,
            severity,
            text: text.into(),
        }
    }

    pub fn kill() -> Self {
        Self {
            action: Action::Kill,
            thread: ThreadTag::current(),
            source: SourceId::BROKER,
            severity: Severity::Quiet,
            text: String::new(),
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn thread(&self) -> ThreadTag {
        self.thread
    }

    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_ticker(&self) -> bool {
        self.text.ends_with(TICKER_SUFFIX)
    }

    pub fn continues_source_name(&self) -> bool {
        self.text.starts_with(MEMBER_PREFIX)
    }
}
