//! State shared between producer call sites and the consumer thread
//!
//! Three independent synchronisation domains: the queue's own mutex, the
//! registry `RwLock`, and atomics for the overall ceiling and busy flag.
//! Consumer progress (messages handled, dead flag) sits behind its own mutex
//! and condvar so shutdown and drain can wait on it without polling.

use crate::broker::config::BrokerConfig;
use crate::broker::error::{BrokerError, BrokerResult};
use crate::broker::message::{Message, SourceId};
use crate::broker::registry::SourceRegistry;
use crate::broker::severity::Severity;
use crate::broker::sink::Sink;
use crate::core::sync::{handle_mutex_poison, handle_rwlock_read, handle_rwlock_write};
use crate::queue::BlockingQueue;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Progress {
    /// Messages the consumer has finished with
    handled: u64,
    dead: bool,
}

pub(crate) struct Shared {
    pub(crate) queue: BlockingQueue<Message>,
    registry: RwLock<SourceRegistry>,
    overall_verbosity: AtomicU8,
    processing: AtomicBool,
    /// Rendered output ends at the start of a line
    at_line_start: AtomicBool,
    /// Messages pushed so far, counted before each push
    enqueued: AtomicU64,
    progress: Mutex<Progress>,
    progress_changed: Condvar,
    sink: Mutex<Sink>,
    pub(crate) color: bool,
}

impl Shared {
    pub(crate) fn new(config: &BrokerConfig, sink: Sink) -> Self {
        Self {
            queue: BlockingQueue::new(),
            registry: RwLock::new(SourceRegistry::new()),
            overall_verbosity: AtomicU8::new(config.overall_verbosity.level()),
            processing: AtomicBool::new(false),
            at_line_start: AtomicBool::new(true),
            enqueued: AtomicU64::new(0),
            progress: Mutex::new(Progress::default()),
            progress_changed: Condvar::new(),
            sink: Mutex::new(sink),
            color: config.color,
        }
    }

    pub(crate) fn overall_verbosity(&self) -> Severity {
        Severity::from_level(self.overall_verbosity.load(Ordering::Acquire))
            .unwrap_or(Severity::Everything)
    }

    pub(crate) fn set_overall_verbosity(&self, level: Severity) {
        self.overall_verbosity.store(level.level(), Ordering::Release);
    }

    pub(crate) fn register_source(&self, ceiling: Severity, name: &str) -> BrokerResult<SourceId> {
        let mut registry = handle_rwlock_write(self.registry.write(), |message| {
            BrokerError::Lock { message }
        })?;
        Ok(registry.register(ceiling, name))
    }

    /// Name and ceiling of `source`, read under the registry lock
    pub(crate) fn source_details(&self, source: SourceId) -> BrokerResult<(Option<String>, Severity)> {
        let registry = handle_rwlock_read(self.registry.read(), |message| {
            BrokerError::Lock { message }
        })?;
        Ok((
            registry.name(source).map(str::to_string),
            registry.ceiling(source),
        ))
    }

    pub(crate) fn source_ceiling(&self, source: SourceId) -> BrokerResult<Severity> {
        let registry = handle_rwlock_read(self.registry.read(), |message| {
            BrokerError::Lock { message }
        })?;
        Ok(registry.ceiling(source))
    }

    #[cfg(test)]
    pub(crate) fn hold_registry(&self) -> std::sync::RwLockWriteGuard<'_, SourceRegistry> {
        self.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn registry_snapshot(&self) -> BrokerResult<SourceRegistry> {
        let registry = handle_rwlock_read(self.registry.read(), |message| {
            BrokerError::Lock { message }
        })?;
        Ok(registry.clone())
    }

    /// Whether `severity` clears both the overall and the source ceiling
    pub(crate) fn passes(&self, severity: Severity, source_ceiling: Severity) -> bool {
        severity <= self.overall_verbosity() && severity <= source_ceiling
    }

    pub(crate) fn enqueue(&self, message: Message) -> BrokerResult<()> {
        self.enqueued.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.queue.push(message) {
            self.enqueued.fetch_sub(1, Ordering::AcqRel);
            return Err(e.into());
        }
        Ok(())
    }

    pub(crate) fn set_processing(&self, processing: bool) {
        self.processing.store(processing, Ordering::Release);
    }

    pub(crate) fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub(crate) fn set_at_line_start(&self, at_line_start: bool) {
        self.at_line_start.store(at_line_start, Ordering::Release);
    }

    pub(crate) fn at_line_start(&self) -> bool {
        self.at_line_start.load(Ordering::Acquire)
    }

    pub(crate) fn lock_sink(&self) -> BrokerResult<MutexGuard<'_, Sink>> {
        handle_mutex_poison(self.sink.lock(), |message| BrokerError::Lock { message })
    }

    pub(crate) fn try_lock_sink(&self) -> Option<MutexGuard<'_, Sink>> {
        self.sink.try_lock().ok()
    }

    /// Make the sink usable again after a panic while it was held
    pub(crate) fn recover_sink(&self) {
        self.sink.clear_poison();
    }

    fn lock_progress(&self) -> BrokerResult<MutexGuard<'_, Progress>> {
        handle_mutex_poison(self.progress.lock(), |message| BrokerError::Lock { message })
    }

    pub(crate) fn mark_handled(&self) -> BrokerResult<()> {
        let mut progress = self.lock_progress()?;
        progress.handled += 1;
        self.progress_changed.notify_all();
        Ok(())
    }

    pub(crate) fn mark_dead(&self) -> BrokerResult<()> {
        let mut progress = self.lock_progress()?;
        progress.dead = true;
        self.progress_changed.notify_all();
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn is_dead(&self) -> bool {
        self.lock_progress().map(|p| p.dead).unwrap_or(false)
    }

    /// Wait up to `timeout` for the consumer to stop
    pub(crate) fn wait_dead(&self, timeout: Duration) -> BrokerResult<bool> {
        self.wait_progress(timeout, |progress| progress.dead)
    }

    /// Wait up to `timeout` until every message enqueued so far is handled
    pub(crate) fn wait_handled(&self, timeout: Duration) -> BrokerResult<bool> {
        let target = self.enqueued.load(Ordering::Acquire);
        self.wait_progress(timeout, |progress| progress.handled >= target || progress.dead)
    }

    fn wait_progress(
        &self,
        timeout: Duration,
        done: impl Fn(&Progress) -> bool,
    ) -> BrokerResult<bool> {
        let deadline = Instant::now() + timeout;
        let mut progress = self.lock_progress()?;
        while !done(&progress) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(false);
            }
            let (guard, _) = handle_mutex_poison(
                self.progress_changed.wait_timeout(progress, remaining),
                |message| BrokerError::Lock { message },
            )?;
            progress = guard;
        }
        Ok(true)
    }
}
