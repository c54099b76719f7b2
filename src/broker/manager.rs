//! MessageBroker - process-wide owner of the message queue and consumer thread
//!
//! Exactly one broker can be installed at a time. [`MessageBroker::init`]
//! installs it and returns a [`BrokerGuard`]; dropping the guard runs the
//! shutdown protocol and frees the slot so a new broker can be installed.
//! Call sites that cannot be handed the guard use [`MessageBroker::instance`].

use crate::broker::config::BrokerConfig;
use crate::broker::consumer::ConsumerLoop;
use crate::broker::error::{BrokerError, BrokerResult};
use crate::broker::message::{Message, SourceId, ThreadTag};
use crate::broker::registry::{
    SourceEntry, SourceRegistry, BROKER_SOURCE_CEILING, BROKER_SOURCE_NAME,
};
use crate::broker::render::format_message;
use crate::broker::severity::Severity;
use crate::broker::sink::{stderr_sink, Sink};
use crate::broker::state::Shared;
use crate::core::sync::{handle_mutex_poison, handle_rwlock_read, handle_rwlock_write};
use std::collections::BTreeMap;
use std::io::Write;
use std::ops::Deref;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

static INSTANCE: Mutex<Option<Arc<MessageBroker>>> = Mutex::new(None);

#[cfg(test)]
pub(crate) static FAIL_NEXT_SPAWN: AtomicBool = AtomicBool::new(false);

/// How long shutdown waits for the consumer thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    /// Wait at most this long, then leave the consumer thread running
    Bounded(Duration),
    /// Wait until the consumer thread has finished
    Join,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The consumer handled `Kill` and exited
    Stopped,
    /// The consumer did not finish in time and was left detached
    TimedOut,
    /// Shutdown had already run
    AlreadyShutDown,
}

/// Serialises messages from any number of threads onto one output stream
///
/// # Example
///
/// ```rust,no_run
/// use msgbroker::broker::{BrokerConfig, MessageBroker, Severity};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = MessageBroker::init_stderr(BrokerConfig::default())?;
/// let net = broker.register_source(Severity::Everything, "Net")?;
///
/// std::thread::scope(|scope| {
///     scope.spawn(|| broker.process_message(net, Severity::Errors, "connect failed"));
/// });
/// # Ok(())
/// # }
/// ```
pub struct MessageBroker {
    shared: Arc<Shared>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    source_overrides: BTreeMap<String, Severity>,
    shutdown_timeout: Duration,
    /// Producers hold the read side from the check until the push, so no
    /// accepted message can land behind `Kill`
    shutting_down: RwLock<bool>,
}

impl MessageBroker {
    /// Install the process-wide broker, writing to `sink`
    pub fn init(config: BrokerConfig, sink: Sink) -> BrokerResult<BrokerGuard> {
        let mut slot = handle_mutex_poison(INSTANCE.lock(), |message| BrokerError::Lock {
            message,
        })?;
        if slot.is_some() {
            log::warn!("attempt to initialize a second message broker");
            return Err(BrokerError::AlreadyInitialized);
        }

        let broker = Arc::new(Self::spawn(config, sink)?);
        *slot = Some(Arc::clone(&broker));
        drop(slot);

        let guard = BrokerGuard { broker };
        guard.process_message(
            SourceId::BROKER,
            Severity::Everything,
            "::init - started message broker",
        )?;
        log::debug!("message broker installed");
        Ok(guard)
    }

    /// Install the process-wide broker, writing to standard error
    pub fn init_stderr(config: BrokerConfig) -> BrokerResult<BrokerGuard> {
        Self::init(config, stderr_sink())
    }

    /// The installed broker
    pub fn instance() -> BrokerResult<Arc<MessageBroker>> {
        let slot = handle_mutex_poison(INSTANCE.lock(), |message| BrokerError::Lock {
            message,
        })?;
        slot.as_ref().map(Arc::clone).ok_or(BrokerError::NotInitialized)
    }

    pub fn is_initialized() -> bool {
        INSTANCE.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Start a consumer thread without touching the process-wide slot
    fn spawn(config: BrokerConfig, sink: Sink) -> BrokerResult<Self> {
        let shared = Arc::new(Shared::new(&config, sink));
        let consumer = Self::spawn_consumer(Arc::clone(&shared))?;
        Ok(Self {
            shared,
            consumer: Mutex::new(Some(consumer)),
            source_overrides: config.sources.clone(),
            shutdown_timeout: config.shutdown_timeout(),
            shutting_down: RwLock::new(false),
        })
    }

    fn spawn_consumer(shared: Arc<Shared>) -> BrokerResult<JoinHandle<()>> {
        #[cfg(test)]
        if FAIL_NEXT_SPAWN.swap(false, Ordering::SeqCst) {
            return Err(BrokerError::Spawn {
                source: std::io::Error::other("simulated spawn failure"),
            });
        }

        thread::Builder::new()
            .name("msgbroker-consumer".to_string())
            .spawn(move || ConsumerLoop::new(shared).run())
            .map_err(|source| BrokerError::Spawn { source })
    }

    /// Register a message source and return its id
    ///
    /// A ceiling configured for `name` replaces `ceiling`.
    pub fn register_source(&self, ceiling: Severity, name: &str) -> BrokerResult<SourceId> {
        let ceiling = self.source_overrides.get(name).copied().unwrap_or(ceiling);
        let id = self.shared.register_source(ceiling, name)?;
        log::debug!("registered message source {} '{}' at {}", id, name, ceiling);
        Ok(id)
    }

    /// Queue a message for rendering
    ///
    /// Returns `Ok(false)` when the message is above the overall or source
    /// ceiling and was dropped without being queued.
    pub fn process_message(
        &self,
        source: SourceId,
        severity: Severity,
        text: impl Into<String>,
    ) -> BrokerResult<bool> {
        let shutting_down = handle_rwlock_read(self.shutting_down.read(), |message| {
            BrokerError::Lock { message }
        })?;
        if *shutting_down {
            return Err(BrokerError::ShutDown);
        }
        let ceiling = self.shared.source_ceiling(source)?;
        if !self.shared.passes(severity, ceiling) {
            return Ok(false);
        }
        self.shared.enqueue(Message::display(source, severity, text))?;
        Ok(true)
    }

    /// Change the overall ceiling
    ///
    /// Messages already queued are checked against the new ceiling when they
    /// are rendered; messages dropped earlier stay dropped.
    pub fn set_overall_verbosity(&self, level: Severity) {
        self.shared.set_overall_verbosity(level);
    }

    pub fn overall_verbosity(&self) -> Severity {
        self.shared.overall_verbosity()
    }

    /// Registration details of one source
    pub fn source(&self, id: SourceId) -> BrokerResult<SourceEntry> {
        self.shared
            .registry_snapshot()?
            .get(id)
            .cloned()
            .ok_or(BrokerError::UnknownSource { id: id.index() })
    }

    /// Copy of the registered sources
    pub fn sources(&self) -> BrokerResult<SourceRegistry> {
        self.shared.registry_snapshot()
    }

    /// True when nothing is queued and the consumer is waiting
    pub fn is_idle(&self) -> bool {
        self.shared.queue.is_empty().unwrap_or(false) && !self.shared.is_processing()
    }

    /// Wait up to `timeout` for every message queued so far to be handled
    pub fn drain(&self, timeout: Duration) -> BrokerResult<bool> {
        self.shared.wait_handled(timeout)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutting_down.read().map_or(true, |flag| *flag)
    }

    /// Shut down with the configured bounded wait
    pub fn shutdown(&self) -> BrokerResult<ShutdownOutcome> {
        self.shutdown_with(ShutdownMode::Bounded(self.shutdown_timeout))
    }

    /// Stop the consumer after everything queued so far has been handled
    ///
    /// A status message and then `Kill` go through the queue, so every
    /// earlier message is rendered first. A concurrent `process_message`
    /// either has its message queued ahead of `Kill` or gets
    /// `BrokerError::ShutDown`. With `ShutdownMode::Bounded` a
    /// consumer that does not finish in time is left running and the outcome
    /// is reported as `TimedOut`. The process-wide slot is released either
    /// way.
    pub fn shutdown_with(&self, mode: ShutdownMode) -> BrokerResult<ShutdownOutcome> {
        let queued = {
            let mut shutting_down = handle_rwlock_write(self.shutting_down.write(), |message| {
                BrokerError::Lock { message }
            })?;
            if *shutting_down {
                return Ok(ShutdownOutcome::AlreadyShutDown);
            }
            *shutting_down = true;
            log::debug!("shutting down message broker ({:?})", mode);
            self.queue_kill()
        };

        let result = queued.and_then(|()| self.stop_consumer(mode));
        self.release_slot();

        let outcome = result?;
        self.report_outcome(outcome);
        Ok(outcome)
    }

    fn queue_kill(&self) -> BrokerResult<()> {
        self.shared.enqueue(Message::display(
            SourceId::BROKER,
            Severity::MinorSteps,
            "::shutdown - shutting down message broker",
        ))?;
        self.shared.enqueue(Message::kill())
    }

    fn stop_consumer(&self, mode: ShutdownMode) -> BrokerResult<ShutdownOutcome> {
        let handle = handle_mutex_poison(self.consumer.lock(), |message| BrokerError::Lock {
            message,
        })?
        .take();

        let stopped = match mode {
            ShutdownMode::Bounded(timeout) => self.shared.wait_dead(timeout)?,
            ShutdownMode::Join => true,
        };

        match handle {
            Some(handle) if stopped => {
                if handle.join().is_err() {
                    log::warn!("message broker consumer thread panicked");
                }
            }
            // Dropping the handle detaches the thread
            Some(_) => log::warn!("message broker consumer still alive after timeout"),
            None => {}
        }

        Ok(if stopped {
            ShutdownOutcome::Stopped
        } else {
            ShutdownOutcome::TimedOut
        })
    }

    fn release_slot(&self) {
        match INSTANCE.lock() {
            Ok(mut slot) => {
                if slot
                    .as_ref()
                    .is_some_and(|installed| std::ptr::eq(Arc::as_ptr(installed), self))
                {
                    *slot = None;
                }
            }
            Err(e) => log::error!("cannot release message broker slot: {}", e),
        }
    }

    /// Write the shutdown outcome straight to the sink; the consumer is gone
    fn report_outcome(&self, outcome: ShutdownOutcome) {
        let (severity, text) = match outcome {
            ShutdownOutcome::TimedOut => (
                Severity::Errors,
                "::shutdown - consumer still alive after timeout",
            ),
            _ => (Severity::Everything, "::shutdown - consumer stopped"),
        };
        let message =
            Message::from_thread(ThreadTag::current(), SourceId::BROKER, severity, text);

        // Registry not consulted: a stuck consumer may be blocked inside it
        if !self.shared.passes(severity, BROKER_SOURCE_CEILING) {
            return;
        }

        let mut line = format_message(&message, Some(BROKER_SOURCE_NAME), self.shared.color);
        if !self.shared.at_line_start() {
            line.insert(0, '\n');
        }
        // A stuck consumer may still hold the sink
        let sink = match outcome {
            ShutdownOutcome::TimedOut => self.shared.try_lock_sink(),
            _ => self.shared.lock_sink().ok(),
        };
        match sink {
            Some(mut sink) => {
                if let Err(e) = sink.write_all(line.as_bytes()).and_then(|_| sink.flush()) {
                    log::warn!("cannot write shutdown outcome: {}", e);
                }
            }
            None => log::warn!("output sink busy; shutdown outcome not written"),
        }
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }
}

/// Owning handle returned by [`MessageBroker::init`]
///
/// Dereferences to the broker. Dropping it shuts the broker down with the
/// configured bounded wait.
pub struct BrokerGuard {
    broker: Arc<MessageBroker>,
}

impl BrokerGuard {
    /// Shared handle to the broker, for passing to producer threads
    pub fn broker(&self) -> Arc<MessageBroker> {
        Arc::clone(&self.broker)
    }

    pub fn shutdown(self) -> BrokerResult<ShutdownOutcome> {
        self.broker.shutdown()
    }

    pub fn shutdown_with(self, mode: ShutdownMode) -> BrokerResult<ShutdownOutcome> {
        self.broker.shutdown_with(mode)
    }
}

impl Deref for BrokerGuard {
    type Target = MessageBroker;

    fn deref(&self) -> &MessageBroker {
        &self.broker
    }
}

impl Drop for BrokerGuard {
    fn drop(&mut self) {
        if let Err(e) = self.broker.shutdown() {
            log::error!("message broker shutdown failed: {}", e);
        }
    }
}
