//! Structured log records emitted by the bundler
//!
//! Records use bunyan's JSON shape:
//!
//! ```json
//! {"level":50,"msg":"{\"message\":\"boom\",\"stack\":\"App.js:3:7\"}","includesStack":true,"tag":"device"}
//! ```

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Tag the bundler puts on logs forwarded from a running device.
pub const DEVICE_TAG: &str = "device";

/// A record's `msg` field: usually text, sometimes an arbitrary JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordMessage {
    Text(String),
    Structured(serde_json::Value),
}

impl Default for RecordMessage {
    fn default() -> Self {
        RecordMessage::Text(String::new())
    }
}

impl RecordMessage {
    /// True when there is nothing worth printing.
    ///
    /// Mirrors a loose "falsy" check: empty text, null, `false` and zero.
    pub fn is_empty(&self) -> bool {
        match self {
            RecordMessage::Text(text) => text.is_empty(),
            RecordMessage::Structured(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::Bool(b) => !b,
                serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
                serde_json::Value::String(s) => s.is_empty(),
                _ => false,
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RecordMessage::Text(text) => Some(text),
            RecordMessage::Structured(_) => None,
        }
    }
}

impl From<&str> for RecordMessage {
    fn from(text: &str) -> Self {
        RecordMessage::Text(text.to_string())
    }
}

impl From<String> for RecordMessage {
    fn from(text: String) -> Self {
        RecordMessage::Text(text)
    }
}

/// One log record from the bundler's log stream
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default)]
    pub msg: RecordMessage,

    #[serde(default)]
    pub level: Severity,

    /// `msg` is a JSON string of shape `{"message": .., "stack": ..}`
    #[serde(default)]
    pub includes_stack: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,

    /// Set when the record announces that `issue_id` has been resolved
    #[serde(default)]
    pub issue_cleared: bool,

    /// Logger name (bunyan `name`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// ISO-8601 timestamp as written by the bundler
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl LogRecord {
    /// Create a plain text record.
    pub fn text(level: Severity, msg: impl Into<String>) -> Self {
        Self {
            msg: RecordMessage::Text(msg.into()),
            level,
            ..Default::default()
        }
    }

    /// Create a record whose message is a JSON-encoded `{message, stack}` payload.
    pub fn stack(level: Severity, payload: impl Into<String>) -> Self {
        Self {
            msg: RecordMessage::Text(payload.into()),
            level,
            includes_stack: true,
            ..Default::default()
        }
    }

    /// Create a record carrying a structured (non-text) message.
    pub fn structured(level: Severity, value: serde_json::Value) -> Self {
        Self {
            msg: RecordMessage::Structured(value),
            level,
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_issue(mut self, issue_id: impl Into<String>, cleared: bool) -> Self {
        self.issue_id = Some(issue_id.into());
        self.issue_cleared = cleared;
        self
    }

    /// Parse a record from a JSON object.
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// A previously reported issue that has since been resolved.
    ///
    /// These are never displayed.
    pub fn is_cleared_issue(&self) -> bool {
        self.issue_cleared && self.issue_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn is_from_device(&self) -> bool {
        self.tag.as_deref() == Some(DEVICE_TAG)
    }

    pub fn is_empty(&self) -> bool {
        self.msg.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bunyan_record() {
        let json = r#"{"name":"expo","level":40,"msg":"Slow module","tag":"metro","time":"2024-01-08T10:00:00.000Z"}"#;
        let record = LogRecord::from_json(json).unwrap();

        assert_eq!(record.level, Severity::WARN);
        assert_eq!(record.msg, RecordMessage::Text("Slow module".to_string()));
        assert_eq!(record.tag.as_deref(), Some("metro"));
        assert_eq!(record.name.as_deref(), Some("expo"));
        assert!(!record.includes_stack);
        assert!(!record.is_from_device());
    }

    #[test]
    fn test_parse_stack_record() {
        let json = r#"{"level":50,"msg":"{\"message\":\"boom\",\"stack\":\"App.js:1:1\"}","includesStack":true}"#;
        let record = LogRecord::from_json(json).unwrap();

        assert!(record.includes_stack);
        assert_eq!(
            record.msg.as_text(),
            Some(r#"{"message":"boom","stack":"App.js:1:1"}"#)
        );
    }

    #[test]
    fn test_parse_structured_message() {
        let json = r#"{"level":30,"msg":{"bundle":"index.js","size":1024}}"#;
        let record = LogRecord::from_json(json).unwrap();

        assert_eq!(
            record.msg,
            RecordMessage::Structured(json!({"bundle": "index.js", "size": 1024}))
        );
        assert!(!record.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let record = LogRecord::from_json("{}").unwrap();
        assert_eq!(record.level, Severity::INFO);
        assert!(record.is_empty());
        assert!(!record.is_cleared_issue());
    }

    #[test]
    fn test_parse_issue_fields() {
        let json = r#"{"level":50,"msg":"Unable to resolve module","issueId":"resolve-1","issueCleared":true}"#;
        let record = LogRecord::from_json(json).unwrap();
        assert!(record.is_cleared_issue());
    }

    #[test]
    fn test_cleared_issue_requires_id() {
        let record = LogRecord::text(Severity::ERROR, "x");
        assert!(!record.is_cleared_issue());

        let mut record = LogRecord::text(Severity::ERROR, "x");
        record.issue_cleared = true;
        assert!(!record.is_cleared_issue());

        let record = LogRecord::text(Severity::ERROR, "x").with_issue("", true);
        assert!(!record.is_cleared_issue());

        let record = LogRecord::text(Severity::ERROR, "x").with_issue("abc", false);
        assert!(!record.is_cleared_issue());

        let record = LogRecord::text(Severity::ERROR, "x").with_issue("abc", true);
        assert!(record.is_cleared_issue());
    }

    #[test]
    fn test_empty_messages() {
        assert!(RecordMessage::Text(String::new()).is_empty());
        assert!(RecordMessage::Structured(json!(null)).is_empty());
        assert!(RecordMessage::Structured(json!(false)).is_empty());
        assert!(RecordMessage::Structured(json!(0)).is_empty());
        assert!(!RecordMessage::Structured(json!(1)).is_empty());
        assert!(!RecordMessage::Structured(json!([])).is_empty());
        assert!(!RecordMessage::Text(" ".to_string()).is_empty());
    }

    #[test]
    fn test_null_msg_is_empty() {
        let record = LogRecord::from_json(r#"{"level":30,"msg":null}"#).unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_device_tag() {
        let record = LogRecord::text(Severity::INFO, "hello").with_tag(DEVICE_TAG);
        assert!(record.is_from_device());
    }
}
