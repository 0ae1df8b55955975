//! Log dispatch and bundle progress tracking
//!
//! [`LogDispatcher`] is the subscriber at the end of the log stream. It
//! routes each record to the info, warn or error channel, expands stack
//! payloads through the [`StackTraceRenderer`], and drives the progress bar
//! from build lifecycle events.
//!
//! Build state machine:
//!
//! ```text
//! Idle --start--> Active --progress--> Active --finish--> Idle
//! ```
//!
//! Progress while idle is ignored. Finish while idle still prints the
//! pass/fail line.

use chrono::{DateTime, Utc};

use bdemon_core::prelude::*;
use bdemon_core::{
    elapsed_ms, sink_for, CallsiteFilter, LineTarget, LogRecord, RecordMessage, SinkPair,
    StackTraceRenderer,
};
use bdemon_stream::LogSubscriber;

use crate::config::Settings;
use crate::output::{Channel, ConsoleOutput, LineStyle, StyledLine};
use crate::progress::{BuildProgressState, ProgressFactory, ProgressIndicator, ProgressOptions};

pub const FAILED_BUILD_MESSAGE: &str = "Failed building JavaScript bundle.";

/// Line printed when a bundle build succeeds
pub fn finished_build_message(elapsed_ms: i64) -> String {
    format!("Finished building JavaScript bundle in {}ms.", elapsed_ms)
}

/// Routes log records and build events to the console.
pub struct LogDispatcher<O: ConsoleOutput, P: ProgressFactory> {
    output: O,
    progress_factory: P,
    renderer: StackTraceRenderer,
    progress_label: String,
    progress_options: ProgressOptions,
    state: BuildProgressState,
    indicator: Option<P::Indicator>,
}

impl<O: ConsoleOutput, P: ProgressFactory> LogDispatcher<O, P> {
    /// Dispatcher with default rendering and progress bar settings
    pub fn new(output: O, progress_factory: P) -> Self {
        Self::from_settings(output, progress_factory, &Settings::default())
    }

    /// Dispatcher configured from `.bdemon/config.toml`.
    ///
    /// An invalid collapse pattern disables dimming rather than failing.
    pub fn from_settings(output: O, progress_factory: P, settings: &Settings) -> Self {
        let filter = match CallsiteFilter::from_patterns(&settings.stack.collapse_patterns) {
            Ok(filter) => filter,
            Err(e) => {
                warn!("Invalid stack.collapse_patterns, frame dimming disabled: {}", e);
                CallsiteFilter::disabled()
            }
        };

        Self {
            output,
            progress_factory,
            renderer: StackTraceRenderer::new(settings.stack.policy(), filter),
            progress_label: settings.progress.label.clone(),
            progress_options: settings.progress.options(),
            state: BuildProgressState::default(),
            indicator: None,
        }
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn progress_state(&self) -> BuildProgressState {
        self.state
    }

    pub fn indicator(&self) -> Option<&P::Indicator> {
        self.indicator.as_ref()
    }

    // ─────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────

    /// Handle one record. Never fails; each record is handled in isolation.
    pub fn on_record(&mut self, record: &LogRecord) {
        if record.is_cleared_issue() {
            debug!("Suppressing cleared issue {:?}", record.issue_id);
            return;
        }
        if record.is_empty() {
            return;
        }

        if record.is_from_device() {
            self.output.write_default("");
        }

        let sinks = sink_for(record.level).sink_pair();

        match (&record.msg, record.includes_stack) {
            (RecordMessage::Text(payload), true) => self.write_stack(payload, sinks),
            (RecordMessage::Text(text), false) => {
                for line in text.split('\n') {
                    self.output.write_line(sinks.primary, StyledLine::plain(line));
                }
            }
            // Not text, so nothing to split or parse
            (RecordMessage::Structured(value), _) => {
                self.output
                    .write_line(sinks.primary, StyledLine::plain(value.to_string()));
            }
        }
    }

    fn write_stack(&mut self, payload: &str, sinks: SinkPair) {
        let rendered = self.renderer.render(payload);
        for line in rendered.lines {
            let (channel, nested) = match line.target {
                LineTarget::Primary => (sinks.primary, false),
                LineTarget::Nested => (sinks.nested, true),
            };
            self.output.write_line(
                channel,
                StyledLine {
                    text: line.text,
                    style: line.style,
                    nested,
                },
            );
        }
    }

    // ─────────────────────────────────────────────────────────
    // Build lifecycle
    // ─────────────────────────────────────────────────────────

    pub fn build_started(&mut self) {
        if let Some(mut previous) = self.indicator.take() {
            debug!("Build started while another was in progress, replacing progress bar");
            previous.terminate();
        }

        debug!("Bundle build started");
        self.state = BuildProgressState::started();
        self.indicator = Some(
            self.progress_factory
                .create(&self.progress_label, &self.progress_options),
        );
    }

    pub fn build_progressed(&mut self, percent: u8) {
        let Some(indicator) = self.indicator.as_mut() else {
            return;
        };
        if !self.state.is_active || indicator.is_complete() {
            return;
        }
        if let Some(delta) = self.state.advance_to(percent) {
            trace!("Bundle build at {}% (+{})", percent, delta);
            indicator.advance(delta);
        }
    }

    pub fn build_finished(
        &mut self,
        error: Option<&str>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) {
        if let Some(mut indicator) = self.indicator.take() {
            if self.state.is_active && !indicator.is_complete() {
                if let Some(delta) = self.state.advance_to(100) {
                    indicator.advance(delta);
                }
            }
            indicator.terminate();
        }

        match error {
            Some(error) => {
                debug!("Bundle build failed: {}", error);
                self.output.write_line(
                    Channel::Default,
                    StyledLine::new(FAILED_BUILD_MESSAGE, LineStyle::Failure),
                );
            }
            None => {
                let elapsed = elapsed_ms(start_time, end_time);
                debug!("Bundle build finished in {}ms", elapsed);
                self.output.write_line(
                    Channel::Default,
                    StyledLine::new(finished_build_message(elapsed), LineStyle::Success),
                );
            }
        }

        self.state.finish();
    }
}

impl<O: ConsoleOutput, P: ProgressFactory> LogSubscriber for LogDispatcher<O, P> {
    fn on_build_start(&mut self) {
        self.build_started();
    }

    fn on_build_progress(&mut self, percent: u8) {
        self.build_progressed(percent);
    }

    fn on_build_finish(
        &mut self,
        error: Option<&str>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) {
        self.build_finished(error, start_time, end_time);
    }

    fn on_records(&mut self, batch: Vec<LogRecord>) {
        for record in &batch {
            self.on_record(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingOutput, RecordingProgress};
    use bdemon_core::{Severity, DEVICE_TAG};
    use chrono::Duration;
    use serde_json::json;

    type TestDispatcher = LogDispatcher<RecordingOutput, RecordingProgress>;

    fn dispatcher() -> (TestDispatcher, RecordingProgress) {
        let progress = RecordingProgress::new();
        (LogDispatcher::new(RecordingOutput::new(), progress.clone()), progress)
    }

    fn stack_payload(message: &str, frames: &[&str]) -> String {
        json!({ "message": message, "stack": frames.join("\n") }).to_string()
    }

    // ─────────────────────────────────────────────────────────
    // Routing
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_routes_by_severity() {
        let (mut d, _) = dispatcher();
        d.on_record(&LogRecord::text(Severity::DEBUG, "debug"));
        d.on_record(&LogRecord::text(Severity::INFO, "info"));
        d.on_record(&LogRecord::text(Severity::WARN, "warn"));
        d.on_record(&LogRecord::text(Severity::ERROR, "error"));
        d.on_record(&LogRecord::text(Severity::FATAL, "fatal"));
        d.on_record(&LogRecord::text(Severity::from_level(45), "unknown"));

        assert_eq!(
            d.output().channels(),
            vec![
                Channel::Info,
                Channel::Info,
                Channel::Warn,
                Channel::Error,
                Channel::Error,
                Channel::Error,
            ]
        );
    }

    #[test]
    fn test_splits_text_on_newlines() {
        let (mut d, _) = dispatcher();
        d.on_record(&LogRecord::text(Severity::WARN, "line one\nline two\n\nline four"));

        assert_eq!(
            d.output().texts_on(Channel::Warn),
            vec!["line one", "line two", "", "line four"]
        );
    }

    #[test]
    fn test_structured_message_written_whole() {
        let (mut d, _) = dispatcher();
        d.on_record(&LogRecord::structured(
            Severity::INFO,
            json!({"text": "a\nb"}),
        ));

        assert_eq!(d.output().texts(), vec![r#"{"text":"a\nb"}"#]);
    }

    #[test]
    fn test_empty_message_dropped() {
        let (mut d, _) = dispatcher();
        d.on_record(&LogRecord::text(Severity::ERROR, ""));
        d.on_record(&LogRecord::structured(Severity::ERROR, json!(null)));
        d.on_record(&LogRecord::text(Severity::INFO, "").with_tag(DEVICE_TAG));
        assert!(d.output().is_empty());
    }

    #[test]
    fn test_cleared_issue_never_reaches_output() {
        let (mut d, _) = dispatcher();
        d.on_records(vec![
            LogRecord::text(Severity::ERROR, "Unable to resolve module").with_issue("r1", true),
            LogRecord::stack(Severity::ERROR, stack_payload("boom", &["App.js:1:1"]))
                .with_issue("r2", true)
                .with_tag(DEVICE_TAG),
            LogRecord::text(Severity::ERROR, "still broken").with_issue("r3", false),
        ]);

        assert_eq!(d.output().texts(), vec!["still broken"]);
    }

    #[test]
    fn test_device_records_get_separator() {
        let (mut d, _) = dispatcher();
        d.on_record(&LogRecord::text(Severity::WARN, "from phone").with_tag(DEVICE_TAG));
        d.on_record(&LogRecord::text(Severity::INFO, "from metro").with_tag("metro"));

        assert_eq!(
            d.output().lines,
            vec![
                (Channel::Default, StyledLine::plain("")),
                (Channel::Warn, StyledLine::plain("from phone")),
                (Channel::Info, StyledLine::plain("from metro")),
            ]
        );
    }

    // ─────────────────────────────────────────────────────────
    // Stack payloads
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_stack_record_uses_sink_pair() {
        let (mut d, _) = dispatcher();
        let mut frames = vec!["src/App.js:10:3".to_string()];
        frames.extend(
            (1..10).map(|i| format!("node_modules/react-native/Libraries/f{}.js:1:1", i)),
        );
        let refs: Vec<&str> = frames.iter().map(String::as_str).collect();

        d.on_record(&LogRecord::stack(Severity::WARN, stack_payload("Warning: x", &refs)));

        let lines = &d.output().lines;
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|(c, _)| *c == Channel::Warn));

        assert_eq!(lines[0].1.text, "Warning: x");
        assert_eq!(lines[0].1.style, LineStyle::Bold);
        assert!(!lines[0].1.nested);

        assert_eq!(lines[1].1.text, "at src/App.js:10:3");
        assert!(lines[1..].iter().all(|(_, l)| l.nested));
        assert_eq!(
            lines[4].1.text,
            "- ... 7 more stack frames from framework internals"
        );
    }

    #[test]
    fn test_malformed_stack_payload_prints_raw_and_continues() {
        let (mut d, _) = dispatcher();
        d.on_records(vec![
            LogRecord::stack(Severity::ERROR, "{not json"),
            LogRecord::text(Severity::INFO, "next"),
        ]);

        assert_eq!(d.output().texts(), vec!["{not json", "next"]);
        assert_eq!(d.output().channels(), vec![Channel::Error, Channel::Info]);
    }

    #[test]
    fn test_structured_stack_message_written_whole() {
        let (mut d, _) = dispatcher();
        let mut record =
            LogRecord::structured(Severity::ERROR, json!({"message": "m", "stack": "s"}));
        record.includes_stack = true;
        d.on_record(&record);

        assert_eq!(d.output().lines.len(), 1);
    }

    #[test]
    fn test_collapse_patterns_from_settings() {
        let mut settings = Settings::default();
        settings.stack.collapse_patterns = vec!["Libraries/Core".to_string()];
        let mut d = LogDispatcher::from_settings(
            RecordingOutput::new(),
            RecordingProgress::new(),
            &settings,
        );

        d.on_record(&LogRecord::stack(
            Severity::ERROR,
            stack_payload(
                "boom",
                &["App.js:1:1", "node_modules/react-native/Libraries/Core/x.js:1:1"],
            ),
        ));

        assert_eq!(
            d.output().styles(),
            vec![LineStyle::Bold, LineStyle::Plain, LineStyle::Dim]
        );
    }

    #[test]
    fn test_invalid_collapse_pattern_disables_dimming() {
        let mut settings = Settings::default();
        settings.stack.collapse_patterns = vec!["(".to_string()];
        let mut d = LogDispatcher::from_settings(
            RecordingOutput::new(),
            RecordingProgress::new(),
            &settings,
        );

        d.on_record(&LogRecord::stack(Severity::ERROR, stack_payload("boom", &["App.js:1:1"])));
        assert_eq!(d.output().styles(), vec![LineStyle::Bold, LineStyle::Plain]);
    }

    // ─────────────────────────────────────────────────────────
    // Build progress
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_build_start_creates_indicator() {
        let (mut d, progress) = dispatcher();
        d.on_build_start();

        let log = progress.log();
        assert_eq!(log.created.len(), 1);
        assert_eq!(log.created[0].0, "Building JavaScript bundle");
        assert_eq!(log.created[0].1, ProgressOptions::default());
        assert_eq!(d.progress_state(), BuildProgressState::started());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let (mut d, progress) = dispatcher();
        d.on_build_start();
        for percent in [5, 20, 15, 20, 60, 59, 80] {
            d.on_build_progress(percent);
        }

        let log = progress.log();
        assert_eq!(log.advances, vec![5, 15, 40, 20]);
        assert_eq!(log.total_advanced(), 80);
        assert_eq!(d.progress_state().current_percent, 80);
        assert_eq!(d.indicator().map(|i| i.current()), Some(80));
    }

    #[test]
    fn test_progress_while_idle_is_ignored() {
        let (mut d, progress) = dispatcher();
        d.on_build_progress(50);

        assert!(progress.log().advances.is_empty());
        assert!(!d.progress_state().is_active);
        assert!(d.output().is_empty());
    }

    #[test]
    fn test_finish_completes_and_terminates_bar() {
        let (mut d, progress) = dispatcher();
        let t0 = Utc::now();
        let t1 = t0 + Duration::milliseconds(2500);

        d.on_build_start();
        d.on_build_progress(30);
        d.on_build_finish(None, t0, t1);

        let log = progress.log();
        assert_eq!(log.advances, vec![30, 70]);
        assert_eq!(log.terminated, 1);
        assert!(d.indicator().is_none());
        assert!(!d.progress_state().is_active);

        assert_eq!(
            d.output().lines,
            vec![(
                Channel::Default,
                StyledLine::new(
                    "Finished building JavaScript bundle in 2500ms.",
                    LineStyle::Success
                )
            )]
        );
    }

    #[test]
    fn test_finish_at_100_does_not_advance_again() {
        let (mut d, progress) = dispatcher();
        let now = Utc::now();

        d.on_build_start();
        d.on_build_progress(100);
        d.on_build_progress(100);
        d.on_build_finish(None, now, now);

        assert_eq!(progress.log().advances, vec![100]);
    }

    #[test]
    fn test_failed_build_prints_failure() {
        let (mut d, progress) = dispatcher();
        let now = Utc::now();

        d.on_build_start();
        d.on_build_finish(Some("SyntaxError"), now, now);

        assert_eq!(progress.log().terminated, 1);
        assert_eq!(
            d.output().lines,
            vec![(
                Channel::Default,
                StyledLine::new(FAILED_BUILD_MESSAGE, LineStyle::Failure)
            )]
        );
    }

    #[test]
    fn test_finish_while_idle_still_reports() {
        let (mut d, progress) = dispatcher();
        let t0 = Utc::now();
        let t1 = t0 + Duration::milliseconds(42);

        d.on_build_finish(None, t0, t1);

        let log = progress.log();
        assert!(log.advances.is_empty());
        assert_eq!(log.terminated, 0);
        assert_eq!(
            d.output().texts(),
            vec!["Finished building JavaScript bundle in 42ms."]
        );
    }

    #[test]
    fn test_progress_after_finish_is_ignored() {
        let (mut d, progress) = dispatcher();
        let now = Utc::now();

        d.on_build_start();
        d.on_build_finish(None, now, now);
        d.on_build_progress(50);

        assert_eq!(progress.log().advances, vec![100]);
    }

    #[test]
    fn test_restart_terminates_previous_bar() {
        let (mut d, progress) = dispatcher();
        d.on_build_start();
        d.on_build_progress(40);
        d.on_build_start();
        d.on_build_progress(10);

        let log = progress.log();
        assert_eq!(log.created.len(), 2);
        assert_eq!(log.terminated, 1);
        assert_eq!(log.advances, vec![40, 10]);
        assert_eq!(d.progress_state().current_percent, 10);
    }

    #[test]
    fn test_custom_progress_settings() {
        let mut settings = Settings::default();
        settings.progress.label = "Bundling".to_string();
        settings.progress.width = 30;
        let progress = RecordingProgress::new();
        let mut d =
            LogDispatcher::from_settings(RecordingOutput::new(), progress.clone(), &settings);

        d.on_build_start();

        let log = progress.log();
        assert_eq!(log.created[0].0, "Bundling");
        assert_eq!(log.created[0].1.width, 30);
    }
}
