//! Verbosity levels
//!
//! Levels are ordered: a lower level is more important and shows up more
//! readily. A message renders only if its level is at or below both the
//! overall ceiling and its source's ceiling.

use serde::Deserialize;
use std::str::FromStr;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
    strum_macros::Display,
)]
#[serde(try_from = "String")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(u8)]
pub enum Severity {
    /// Plain program output, rendered verbatim
    Quiet = 0,
    Errors = 1,
    MajorSteps = 2,
    MinorSteps = 3,
    /// Debug chatter
    Everything = 4,
}

/// Error returned when a verbosity level cannot be parsed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Unknown verbosity level '{value}' (expected quiet, errors, major-steps, minor-steps, everything or 0-4)"
)]
pub struct ParseSeverityError {
    pub value: String,
}

impl Severity {
    /// Numeric level, 0 (quiet) to 4 (everything)
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Severity::Quiet),
            1 => Some(Severity::Errors),
            2 => Some(Severity::MajorSteps),
            3 => Some(Severity::MinorSteps),
            4 => Some(Severity::Everything),
            _ => None,
        }
    }

    /// Prefix shown in front of rendered messages; empty for `Quiet`
    pub fn label(self) -> &'static str {
        match self {
            Severity::Quiet => "",
            Severity::Errors => "Error:",
            Severity::MajorSteps | Severity::MinorSteps => "Info:",
            Severity::Everything => "Debug:",
        }
    }

    /// Parse a level name (any case) or its numeric value
    pub fn parse(value: &str) -> Result<Self, ParseSeverityError> {
        let trimmed = value.trim();
        if let Ok(level) = trimmed.parse::<u8>() {
            return Self::from_level(level).ok_or_else(|| ParseSeverityError {
                value: value.to_string(),
            });
        }
        <Self as FromStr>::from_str(trimmed).map_err(|_| ParseSeverityError {
            value: value.to_string(),
        })
    }
}

impl TryFrom<String> for Severity {
    type Error = ParseSeverityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Severity::parse(&value)
    }
}
