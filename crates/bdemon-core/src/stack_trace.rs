//! Stack trace rendering for bundler error payloads.
//!
//! A stack-bearing record carries a JSON string `{"message": .., "stack": ..}`.
//! Rendering prints the message in bold, then the frames up to a little past
//! the last frame that belongs to the application. Everything after that is
//! dependency code and gets summarised in a single line.
//!
//! Rendering produces plain data ([`RenderedStack`]); writing it out is up to
//! the caller. A payload that is not valid JSON is echoed back verbatim.

use std::fmt;
use std::sync::Arc;

use regex::RegexSet;
use serde::Deserialize;
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Frames whose text starts with this are dependency code.
pub const DEFAULT_LIBRARY_PREFIX: &str = "node_modules";

/// How many frames to keep after the last application frame.
pub const DEFAULT_FRAMES_AFTER_APP: usize = 2;

/// Frame truncation settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackTracePolicy {
    /// Prefix that marks a frame as library code
    pub library_prefix: String,

    /// Frames shown past the last application frame
    pub frames_after_app: usize,
}

impl Default for StackTracePolicy {
    fn default() -> Self {
        Self {
            library_prefix: DEFAULT_LIBRARY_PREFIX.to_string(),
            frames_after_app: DEFAULT_FRAMES_AFTER_APP,
        }
    }
}

/// Where a stack frame's code lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Library,
    Application,
}

/// Classify a frame by its leading path.
///
/// This is a plain prefix check. Hoisted or symlinked packages whose paths do
/// not start with the prefix are treated as application code.
pub fn classify_frame(frame: &str, library_prefix: &str) -> FrameKind {
    if frame.starts_with(library_prefix) {
        FrameKind::Library
    } else {
        FrameKind::Application
    }
}

/// Which frames of a stack are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameWindow {
    /// Number of non-empty frames in the stack
    pub total: usize,

    /// Index of the last application frame, `None` when every frame is library code
    pub last_application_index: Option<usize>,

    /// Frames printed, always a prefix of the stack
    pub visible: usize,

    /// Frames hidden behind the summary line
    pub unlogged: usize,
}

impl FrameWindow {
    pub fn compute(kinds: &[FrameKind], frames_after_app: usize) -> Self {
        let total = kinds.len();
        let last_application_index = kinds.iter().rposition(|k| *k == FrameKind::Application);

        // With no application frame the first `frames_after_app` frames show
        let mut visible = last_application_index
            .map_or(frames_after_app, |i| {
                i.saturating_add(frames_after_app).saturating_add(1)
            })
            .min(total);
        let mut unlogged = total - visible;

        // A summary line in place of a single frame saves nothing
        if unlogged == 1 {
            visible = total;
            unlogged = 0;
        }

        Self {
            total,
            last_application_index,
            visible,
            unlogged,
        }
    }

    /// Index of the last printed frame
    pub fn cutoff(&self) -> Option<usize> {
        self.visible.checked_sub(1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Callsite filter
// ─────────────────────────────────────────────────────────────────────────────

type CallsitePredicate = dyn Fn(&str) -> bool + Send + Sync;

/// Decides whether a printed frame is an internal callsite to de-emphasise.
///
/// Disabled unless built from a predicate or a non-empty pattern list.
#[derive(Clone, Default)]
pub struct CallsiteFilter {
    predicate: Option<Arc<CallsitePredicate>>,
}

impl CallsiteFilter {
    /// A filter that never matches
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    /// Build a filter that matches any of the given regular expressions.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        if patterns.is_empty() {
            return Ok(Self::disabled());
        }
        let set = RegexSet::new(patterns.iter().map(|p| p.as_ref()))?;
        Ok(Self::new(move |frame| set.is_match(frame)))
    }

    pub fn is_enabled(&self) -> bool {
        self.predicate.is_some()
    }

    pub fn is_collapsed(&self, frame: &str) -> bool {
        self.predicate.as_ref().is_some_and(|p| p(frame))
    }
}

impl fmt::Debug for CallsiteFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallsiteFilter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendered output
// ─────────────────────────────────────────────────────────────────────────────

/// Which of a record's two sinks a line goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTarget {
    Primary,
    Nested,
}

/// Visual treatment of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineStyle {
    #[default]
    Plain,
    Bold,
    Dim,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLine {
    pub target: LineTarget,
    pub style: LineStyle,
    pub text: String,
}

impl RenderedLine {
    fn primary(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            target: LineTarget::Primary,
            style,
            text: text.into(),
        }
    }

    fn nested(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            target: LineTarget::Nested,
            style,
            text: text.into(),
        }
    }
}

/// Result of rendering one stack payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStack {
    pub lines: Vec<RenderedLine>,

    /// `None` when the payload could not be parsed and was echoed verbatim
    pub window: Option<FrameWindow>,
}

impl RenderedStack {
    pub fn is_fallback(&self) -> bool {
        self.window.is_none()
    }

    /// Text of every line, in order
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Line printed in place of the hidden frames
pub fn unlogged_summary(count: usize) -> String {
    format!("- ... {} more stack frames from framework internals", count)
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TraceInfo {
    message: String,
    stack: String,
}

/// Renders `{message, stack}` payloads
#[derive(Debug, Clone, Default)]
pub struct StackTraceRenderer {
    policy: StackTracePolicy,
    filter: CallsiteFilter,
}

impl StackTraceRenderer {
    pub fn new(policy: StackTracePolicy, filter: CallsiteFilter) -> Self {
        Self { policy, filter }
    }

    pub fn policy(&self) -> &StackTracePolicy {
        &self.policy
    }

    /// Render a payload. Never fails: unparseable input comes back as one line.
    pub fn render(&self, payload: &str) -> RenderedStack {
        let info: TraceInfo = match serde_json::from_str(payload) {
            Ok(info) => info,
            Err(e) => {
                debug!("Stack payload is not a trace object ({}), printing raw", e);
                return RenderedStack {
                    lines: vec![RenderedLine::primary(LineStyle::Plain, payload)],
                    window: None,
                };
            }
        };

        let frames: Vec<&str> = info.stack.split('\n').filter(|l| !l.is_empty()).collect();
        let kinds: Vec<FrameKind> = frames
            .iter()
            .map(|f| classify_frame(f, &self.policy.library_prefix))
            .collect();
        let window = FrameWindow::compute(&kinds, self.policy.frames_after_app);

        let mut lines = Vec::with_capacity(window.visible + 2);
        lines.push(RenderedLine::primary(LineStyle::Bold, info.message));

        for frame in &frames[..window.visible] {
            let style = if self.filter.is_collapsed(frame) {
                LineStyle::Dim
            } else {
                LineStyle::Plain
            };
            // `at` prefix matches Node.js traces
            lines.push(RenderedLine::nested(style, format!("at {}", frame)));
        }

        if window.unlogged > 0 {
            lines.push(RenderedLine::nested(
                LineStyle::Plain,
                unlogged_summary(window.unlogged),
            ));
        }

        RenderedStack {
            lines,
            window: Some(window),
        }
    }
}
