//! Command line arguments
//!
//! Every option here can also be set in the configuration file; values given
//! on the command line win.

use crate::broker::Severity;
use crate::core::logging::LogFormat;
use crate::core::styles::palette_to_clap;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "msgbroker")]
#[command(about = "Relay standard input through a serialising message broker")]
#[command(version)]
#[command(styles = palette_to_clap(true))]
#[command(after_help = "Input lines of the form '@<level> <source> <text>' are shown as \
annotated messages from <source>; all other lines pass through unchanged.\n\
Levels: quiet, errors, major-steps, minor-steps, everything (or 0-4).")]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Overall verbosity ceiling
    #[arg(short = 'v', long = "verbosity", value_name = "LEVEL", value_parser = parse_severity)]
    pub verbosity: Option<Severity>,

    /// Ceiling for one named source (repeatable)
    #[arg(
        short = 's',
        long = "source",
        value_name = "NAME=LEVEL",
        action = ArgAction::Append,
        value_parser = parse_source_override
    )]
    pub sources: Vec<(String, Severity)>,

    /// Colour severity labels
    #[arg(short = 'g', long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Never colour severity labels
    #[arg(long = "no-color", conflicts_with = "color")]
    pub no_color: bool,

    /// How long shutdown waits for pending output
    #[arg(short = 't', long = "shutdown-timeout-ms", value_name = "MILLIS")]
    pub shutdown_timeout_ms: Option<u64>,

    /// Internal log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Internal log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Internal log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Colour preference from the flags, `None` when neither was given
    pub fn color_override(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
            .as_deref()
            .and_then(|format| format.parse().ok())
            .unwrap_or_default()
    }

    /// Log file path, with 'none' meaning no file
    pub fn log_file(&self) -> Option<String> {
        self.log_file
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned())
            .filter(|path| !path.eq_ignore_ascii_case("none"))
    }
}

fn parse_severity(value: &str) -> Result<Severity, String> {
    Severity::parse(value).map_err(|e| e.to_string())
}

/// Parse `NAME=LEVEL`
pub fn parse_source_override(value: &str) -> Result<(String, Severity), String> {
    let (name, level) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=LEVEL, got '{}'", value))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing source name in '{}'", value));
    }
    Ok((name.to_string(), parse_severity(level.trim())?))
}
