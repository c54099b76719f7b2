//! Consumer loop run by the broker's dedicated thread
//!
//! Pops messages in push order, re-checks them against the current ceilings
//! and hands survivors to the [`Renderer`]. A failure while handling one
//! message is reported as a broker diagnostic and never stops the loop; only
//! a `Kill` message (or a queue that can no longer be locked) ends it.

use crate::broker::error::BrokerResult;
use crate::broker::message::{Action, Message, SourceId, ThreadTag};
use crate::broker::render::Renderer;
use crate::broker::severity::Severity;
use crate::broker::state::Shared;
use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

pub(crate) struct ConsumerLoop {
    shared: Arc<Shared>,
    renderer: Renderer,
}

impl ConsumerLoop {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        let renderer = Renderer::new(shared.color);
        Self { shared, renderer }
    }

    /// Handle messages until `Kill` arrives
    pub(crate) fn run(mut self) {
        log::debug!("message broker consumer started");
        loop {
            self.shared.set_processing(false);
            let message = match self.shared.queue.pop() {
                Ok(message) => message,
                Err(e) => {
                    log::error!("message broker consumer cannot read its queue: {}", e);
                    break;
                }
            };
            self.shared.set_processing(true);

            let action = message.action();
            match action {
                Action::Display => self.handle(&message),
                Action::Kill => {
                    let exit = self.diagnostic(Severity::MinorSteps, "::run - exit");
                    self.handle(&exit);
                }
            }
            if let Err(e) = self.shared.mark_handled() {
                log::warn!("message broker consumer cannot record progress: {}", e);
            }
            if action == Action::Kill {
                break;
            }
        }

        self.shared.set_processing(false);
        if let Err(e) = self.shared.mark_dead() {
            log::error!("message broker consumer cannot signal shutdown: {}", e);
        }
        log::debug!("message broker consumer stopped");
    }

    fn diagnostic(&self, severity: Severity, text: impl Into<String>) -> Message {
        Message::from_thread(ThreadTag::current(), SourceId::BROKER, severity, text)
    }

    /// Render one message, turning any failure into a broker diagnostic
    fn handle(&mut self, message: &Message) {
        if let Some(reason) = self.try_render(message) {
            log::warn!("failed to render message from source {}: {}", message.source(), reason);
            let report =
                self.diagnostic(Severity::Errors, format!("::run - render failed: {}", reason));
            if let Some(reason) = self.try_render(&report) {
                log::error!("dropping render failure diagnostic: {}", reason);
            }
        }
    }

    fn try_render(&mut self, message: &Message) -> Option<String> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.render(message)));
        match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(payload) => {
                self.shared.recover_sink();
                Some(panic_reason(payload.as_ref()))
            }
        }
    }

    fn render(&mut self, message: &Message) -> BrokerResult<()> {
        // Ceilings may have changed since the message was enqueued
        let (name, ceiling) = self.shared.source_details(message.source())?;
        if !self.shared.passes(message.severity(), ceiling) {
            log::trace!("suppressed message from source {} at render time", message.source());
            return Ok(());
        }

        let mut sink = self.shared.lock_sink()?;
        let rendered = self.renderer.render(&mut **sink, message, name.as_deref());
        self.shared.set_at_line_start(self.renderer.at_line_start());
        rendered?;
        sink.flush()?;
        Ok(())
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic while rendering".to_string()
    }
}
