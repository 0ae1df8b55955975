//! Severity levels and output routing
//!
//! Bundler records carry bunyan's numeric levels. Routing collapses them into
//! three tiers and anything we do not recognise goes to the loudest one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A bunyan log level.
///
/// Ordered numerically so unknown levels still have a well-defined place
/// relative to the named ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(from = "SeverityRepr", into = "u16")]
pub struct Severity(u16);

impl Severity {
    pub const TRACE: Severity = Severity(10);
    pub const DEBUG: Severity = Severity(20);
    pub const INFO: Severity = Severity(30);
    pub const WARN: Severity = Severity(40);
    pub const ERROR: Severity = Severity(50);
    pub const FATAL: Severity = Severity(60);

    /// Wrap a raw numeric level.
    pub const fn from_level(level: u16) -> Self {
        Severity(level)
    }

    /// Raw numeric level
    pub const fn level(self) -> u16 {
        self.0
    }

    /// Parse a level name. Unknown names fail open to [`Severity::ERROR`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Severity::TRACE,
            "debug" => Severity::DEBUG,
            "info" | "log" => Severity::INFO,
            "warn" | "warning" => Severity::WARN,
            "error" => Severity::ERROR,
            "fatal" => Severity::FATAL,
            _ => Severity::ERROR,
        }
    }

    /// Name of the level, if it is one of the six bunyan defines.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Severity::TRACE => Some("trace"),
            Severity::DEBUG => Some("debug"),
            Severity::INFO => Some("info"),
            Severity::WARN => Some("warn"),
            Severity::ERROR => Some("error"),
            Severity::FATAL => Some("fatal"),
            _ => None,
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Severity::INFO
    }
}

impl From<Severity> for u16 {
    fn from(severity: Severity) -> Self {
        severity.0
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "level({})", self.0),
        }
    }
}

/// Wire representation: bunyan writes numbers, Metro's client logs write names.
#[derive(Deserialize)]
#[serde(untagged)]
enum SeverityRepr {
    Numeric(i64),
    Named(String),
}

impl From<SeverityRepr> for Severity {
    fn from(repr: SeverityRepr) -> Self {
        match repr {
            SeverityRepr::Numeric(n) => Severity(n.clamp(0, i64::from(u16::MAX)) as u16),
            SeverityRepr::Named(name) => Severity::from_name(&name),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────────────

/// Console channel a line is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Info,
    Warn,
    Error,
    /// Plain console output not tied to a record's severity
    Default,
}

/// One of the three routing tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SinkKind {
    Info,
    Warn,
    Error,
}

/// Channels used for a record: its own lines and any nested stack frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkPair {
    pub primary: Channel,
    pub nested: Channel,
}

impl SinkKind {
    pub fn channel(self) -> Channel {
        match self {
            SinkKind::Info => Channel::Info,
            SinkKind::Warn => Channel::Warn,
            SinkKind::Error => Channel::Error,
        }
    }

    /// Primary and nested channel for this tier
    pub fn sink_pair(self) -> SinkPair {
        let channel = self.channel();
        SinkPair {
            primary: channel,
            nested: channel,
        }
    }
}

/// Route a severity to its tier.
///
/// Anything that is neither `<= INFO` nor exactly `WARN` is an error, so
/// unknown levels end up on the loudest channel.
pub fn sink_for(severity: Severity) -> SinkKind {
    if severity <= Severity::INFO {
        SinkKind::Info
    } else if severity == Severity::WARN {
        SinkKind::Warn
    } else {
        SinkKind::Error
    }
}
