//! Line protocol for the bundler's stdout
//!
//! Each stdout line is one of:
//! - a Metro reporter event (`{"type":"bundle_build_started","buildID":"1"}`)
//! - a bunyan log record (`{"level":30,"msg":"..."}`)
//! - anything else, shown as a plain info line
//!
//! stderr lines are shown as warnings. Parsing never fails; a line we do not
//! understand is still displayed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use bdemon_core::prelude::*;
use bdemon_core::{BuildEvent, LogRecord, Severity, DEVICE_TAG};

use crate::SourceEvent;

/// Events delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Records(Vec<LogRecord>),
    Build(BuildEvent),
}

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

// ─────────────────────────────────────────────────────────
// Metro reporter events
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReporterEvent {
    BundleBuildStarted {
        #[serde(rename = "buildID", default)]
        build_id: Option<Value>,
    },
    BundleTransformProgressed {
        #[serde(rename = "buildID", default)]
        build_id: Option<Value>,
        #[serde(rename = "transformedFileCount")]
        transformed_file_count: u64,
        #[serde(rename = "totalFileCount")]
        total_file_count: u64,
    },
    BundleBuildDone {
        #[serde(rename = "buildID", default)]
        build_id: Option<Value>,
    },
    BundleBuildFailed {
        #[serde(rename = "buildID", default)]
        build_id: Option<Value>,
        #[serde(default)]
        error: Option<ReporterError>,
    },
    BundlingError {
        error: ReporterError,
    },
    ClientLog {
        #[serde(default)]
        level: Option<String>,
        #[serde(default)]
        data: Vec<Value>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReporterError {
    Detailed {
        message: String,
        #[serde(default)]
        stack: Option<String>,
    },
    Text(String),
}

impl ReporterError {
    fn message(&self) -> &str {
        match self {
            ReporterError::Detailed { message, .. } => message,
            ReporterError::Text(text) => text,
        }
    }
}

fn build_key(build_id: &Option<Value>) -> String {
    match build_id {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Console levels from the device. Grouping calls are plain output.
fn client_log_severity(level: Option<&str>) -> Severity {
    match level {
        None | Some("group") | Some("groupCollapsed") | Some("groupEnd") => Severity::INFO,
        Some(name) => Severity::from_name(name),
    }
}

fn join_client_data(data: &[Value]) -> String {
    data.iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ─────────────────────────────────────────────────────────
// Parser
// ─────────────────────────────────────────────────────────

/// Start times kept for builds that never reported done or failed
const MAX_PENDING_BUILDS: usize = 32;

/// Stateful line parser.
///
/// Remembers when each build started so finish events can report elapsed time.
#[derive(Debug, Default)]
pub struct LineParser {
    build_starts: HashMap<String, DateTime<Utc>>,
}

impl LineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert one source event, stamping build events with the current time.
    pub fn parse(&mut self, event: &SourceEvent) -> Option<StreamEvent> {
        match event {
            SourceEvent::Stdout(line) => {
                self.parse_line_at(line, OutputStream::Stdout, Utc::now())
            }
            SourceEvent::Stderr(line) => {
                self.parse_line_at(line, OutputStream::Stderr, Utc::now())
            }
            SourceEvent::Exited { .. } => None,
        }
    }

    /// Parse a single line received at `now`.
    pub fn parse_line_at(
        &mut self,
        line: &str,
        stream: OutputStream,
        now: DateTime<Utc>,
    ) -> Option<StreamEvent> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.trim().is_empty() {
            return None;
        }

        if stream == OutputStream::Stderr {
            return Some(records(LogRecord::text(Severity::WARN, trimmed)));
        }

        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ Value::Object(_)) => value,
            _ => return Some(records(LogRecord::text(Severity::INFO, trimmed))),
        };

        if value.get("type").is_some_and(Value::is_string) {
            return match serde_json::from_value::<ReporterEvent>(value) {
                Ok(event) => self.reporter_event(event, now),
                Err(e) => {
                    debug!("Malformed reporter event ({}): {}", e, trimmed);
                    Some(records(LogRecord::text(Severity::INFO, trimmed)))
                }
            };
        }

        if value.get("msg").is_some() || value.get("level").is_some() {
            if let Ok(record) = serde_json::from_value::<LogRecord>(value) {
                return Some(records(record));
            }
        }

        Some(records(LogRecord::text(Severity::INFO, trimmed)))
    }

    fn reporter_event(&mut self, event: ReporterEvent, now: DateTime<Utc>) -> Option<StreamEvent> {
        match event {
            ReporterEvent::BundleBuildStarted { build_id } => {
                self.track_build_start(build_key(&build_id), now);
                Some(StreamEvent::Build(BuildEvent::Start))
            }
            ReporterEvent::BundleTransformProgressed {
                transformed_file_count,
                total_file_count,
                ..
            } => BuildEvent::percent_of(transformed_file_count, total_file_count)
                .map(|percent| StreamEvent::Build(BuildEvent::progress(percent))),
            ReporterEvent::BundleBuildDone { build_id } => {
                Some(self.finish(&build_id, None, now))
            }
            ReporterEvent::BundleBuildFailed { build_id, error } => {
                let message = error
                    .map(|e| e.message().to_string())
                    .unwrap_or_else(|| "Bundle build failed".to_string());
                Some(self.finish(&build_id, Some(message), now))
            }
            ReporterEvent::BundlingError { error } => {
                let record = match error {
                    ReporterError::Detailed {
                        message,
                        stack: Some(stack),
                    } => LogRecord::stack(
                        Severity::ERROR,
                        serde_json::json!({ "message": message, "stack": stack }).to_string(),
                    ),
                    other => LogRecord::text(Severity::ERROR, other.message()),
                };
                Some(records(record))
            }
            ReporterEvent::ClientLog { level, data } => {
                let severity = client_log_severity(level.as_deref());
                let record = LogRecord::text(severity, join_client_data(&data)).with_tag(DEVICE_TAG);
                Some(records(record))
            }
            ReporterEvent::Other => {
                trace!("Ignoring reporter event");
                None
            }
        }
    }

    /// Remember a build start, evicting the oldest start once
    /// [`MAX_PENDING_BUILDS`] builds are awaiting a finish.
    fn track_build_start(&mut self, key: String, now: DateTime<Utc>) {
        let full = self.build_starts.len() >= MAX_PENDING_BUILDS;
        if full && !self.build_starts.contains_key(&key) {
            let oldest = self
                .build_starts
                .iter()
                .min_by_key(|(_, started)| **started)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!("Dropping start time of unfinished build {}", oldest);
                self.build_starts.remove(&oldest);
            }
        }
        self.build_starts.insert(key, now);
    }

    #[cfg(test)]
    fn pending_builds(&self) -> usize {
        self.build_starts.len()
    }

    fn finish(
        &mut self,
        build_id: &Option<Value>,
        error: Option<String>,
        now: DateTime<Utc>,
    ) -> StreamEvent {
        let start_time = self.build_starts.remove(&build_key(build_id)).unwrap_or(now);
        StreamEvent::Build(BuildEvent::Finish {
            error,
            start_time,
            end_time: now,
        })
    }
}

fn records(record: LogRecord) -> StreamEvent {
    StreamEvent::Records(vec![record])
}
