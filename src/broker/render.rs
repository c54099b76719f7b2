//! Rendering policy applied by the consumer thread
//!
//! Turns messages into text and coalesces ticker messages (text ending in
//! `" ."`) into a rotating glyph instead of repeating the full line. Every
//! glyph starts with a backspace so it overwrites the previous glyph, or the
//! trailing `.` of the ticker text the first time round.

use crate::broker::message::{Message, SourceId, ThreadTag};
use crate::broker::severity::Severity;
use crate::core::styles::StyleRole;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Rotation shown while the ticking source keeps reporting
pub const TICK_GLYPHS: [&str; 4] = ["\u{8}|", "\u{8}/", "\u{8}-", "\u{8}\\"];

/// Rotation shown while another source ticks on the owner's line
pub const INTERRUPTED_TICK_GLYPHS: [&str; 4] = ["\u{8}!", "\u{8}X", "\u{8}=", "\u{8}V"];

const LABEL_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum TickerState {
    NotTicking,
    /// A ticker owns the current output line
    Ticking {
        source: SourceId,
        thread: ThreadTag,
        text: String,
        /// Next glyph in the rotation
        glyph: usize,
    },
}

/// Format a message as one chunk of output text
///
/// `Quiet` text is returned verbatim. Everything else gets a
/// `[thread] label source - ` prefix (no ` - ` when the text starts with
/// `::`) and a trailing newline unless it is a ticker.
pub fn format_message(message: &Message, source_name: Option<&str>, color: bool) -> String {
    let text = message.text();
    if message.severity() == Severity::Quiet {
        return text.to_string();
    }

    let mut line = String::with_capacity(text.len() + 32);
    let _ = write!(
        line,
        "[{:>2}] {} ",
        message.thread(),
        paint_label(message.severity(), color)
    );
    if let Some(name) = source_name {
        line.push_str(name);
        if !message.continues_source_name() {
            line.push_str(" - ");
        }
    }
    line.push_str(text);
    if !message.is_ticker() {
        line.push('\n');
    }
    line
}

fn paint_label(severity: Severity, color: bool) -> String {
    let label = format!("{:<width$}", severity.label(), width = LABEL_WIDTH);
    StyleRole::for_severity(severity).paint(&label, color)
}

/// Stateful renderer; one per consumer thread
#[derive(Debug)]
pub struct Renderer {
    ticker: TickerState,
    /// Severity of the last non-ticker message written
    previous_severity: Severity,
    /// Output so far ends with a line break (or is empty)
    at_line_start: bool,
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            ticker: TickerState::NotTicking,
            previous_severity: Severity::Errors,
            at_line_start: true,
            color,
        }
    }

    pub fn ticker(&self) -> &TickerState {
        &self.ticker
    }

    /// Whether the next write would start a fresh output line
    pub fn at_line_start(&self) -> bool {
        self.at_line_start
    }

    /// Write `message` to `out`; the caller has already decided it should render
    pub fn render(
        &mut self,
        out: &mut dyn Write,
        message: &Message,
        source_name: Option<&str>,
    ) -> io::Result<()> {
        let line = format_message(message, source_name, self.color);
        if message.is_ticker() {
            self.at_line_start = false;
            self.render_ticker(out, message, &line)
        } else {
            self.render_line(out, message, &line)
        }
    }

    fn render_ticker(&mut self, out: &mut dyn Write, message: &Message, line: &str) -> io::Result<()> {
        match &mut self.ticker {
            TickerState::Ticking {
                source,
                thread,
                text,
                glyph,
            } if *source == message.source() && *thread == message.thread() => {
                if text == message.text() {
                    out.write_all(TICK_GLYPHS[*glyph].as_bytes())?;
                    *glyph = (*glyph + 1) % TICK_GLYPHS.len();
                } else {
                    write!(out, "\n{}{}", line, TICK_GLYPHS[0])?;
                    *text = message.text().to_string();
                    *glyph = 1;
                }
                return Ok(());
            }
            TickerState::Ticking { glyph, .. } => {
                // The ticker that started the line keeps it
                out.write_all(INTERRUPTED_TICK_GLYPHS[*glyph].as_bytes())?;
                *glyph = (*glyph + 1) % INTERRUPTED_TICK_GLYPHS.len();
                return Ok(());
            }
            TickerState::NotTicking => {}
        }

        write!(out, "{}{}", line, TICK_GLYPHS[0])?;
        self.ticker = TickerState::Ticking {
            source: message.source(),
            thread: message.thread(),
            text: message.text().to_string(),
            glyph: 1,
        };
        Ok(())
    }

    fn render_line(&mut self, out: &mut dyn Write, message: &Message, line: &str) -> io::Result<()> {
        if matches!(self.ticker, TickerState::Ticking { .. }) {
            out.write_all(b"\n")?;
            self.ticker = TickerState::NotTicking;
            self.at_line_start = true;
        } else if self.previous_severity == Severity::Quiet && message.severity() != Severity::Quiet {
            // Separate raw pass-through output from the next annotated line
            out.write_all(b"\n")?;
            self.at_line_start = true;
        }
        out.write_all(line.as_bytes())?;
        if !line.is_empty() {
            self.at_line_start = line.ends_with('\n');
        }
        self.previous_severity = message.severity();
        Ok(())
    }
}
