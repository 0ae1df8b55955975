//! Subscriber interface and the pump that feeds it
//!
//! Source events arrive on an mpsc channel from the reader tasks. The pump
//! parses them on a single task and hands them to the subscriber strictly in
//! arrival order, so a subscriber never needs locking.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use bdemon_core::prelude::*;
use bdemon_core::{BuildEvent, LogRecord};

use crate::protocol::{LineParser, StreamEvent};
use crate::SourceEvent;

/// Receives the bundler's log stream, one method per event kind.
pub trait LogSubscriber {
    fn on_build_start(&mut self);

    fn on_build_progress(&mut self, percent: u8);

    fn on_build_finish(
        &mut self,
        error: Option<&str>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    );

    /// A batch of records, in delivery order
    fn on_records(&mut self, batch: Vec<LogRecord>);

    /// Route a lifecycle event to the matching method
    fn on_build_event(&mut self, event: BuildEvent) {
        match event {
            BuildEvent::Start => self.on_build_start(),
            BuildEvent::Progress { percent } => self.on_build_progress(percent),
            BuildEvent::Finish {
                error,
                start_time,
                end_time,
            } => self.on_build_finish(error.as_deref(), start_time, end_time),
        }
    }
}

/// Deliver parsed events, coalescing adjacent record events into one batch.
pub fn deliver<S: LogSubscriber + ?Sized>(events: Vec<StreamEvent>, subscriber: &mut S) {
    let mut batch: Vec<LogRecord> = Vec::new();

    for event in events {
        match event {
            StreamEvent::Records(records) => batch.extend(records),
            StreamEvent::Build(build) => {
                if !batch.is_empty() {
                    subscriber.on_records(std::mem::take(&mut batch));
                }
                subscriber.on_build_event(build);
            }
        }
    }

    if !batch.is_empty() {
        subscriber.on_records(batch);
    }
}

/// Drives a [`LogSubscriber`] from a channel of source events.
pub struct StreamPump {
    rx: mpsc::Receiver<SourceEvent>,
    parser: LineParser,
}

impl StreamPump {
    pub fn new(rx: mpsc::Receiver<SourceEvent>) -> Self {
        Self {
            rx,
            parser: LineParser::new(),
        }
    }

    /// Run until every sender is gone.
    ///
    /// Returns the bundler's exit code when the source reported one.
    pub async fn run<S: LogSubscriber + ?Sized>(mut self, subscriber: &mut S) -> Option<i32> {
        let mut exit_code = None;

        while let Some(first) = self.rx.recv().await {
            let mut events = Vec::new();
            self.absorb(first, &mut events, &mut exit_code);

            // Whatever else is already queued joins the same delivery
            while let Ok(next) = self.rx.try_recv() {
                self.absorb(next, &mut events, &mut exit_code);
            }

            deliver(events, subscriber);
        }

        debug!("Stream pump finished, exit code {:?}", exit_code);
        exit_code
    }

    fn absorb(
        &mut self,
        event: SourceEvent,
        events: &mut Vec<StreamEvent>,
        exit_code: &mut Option<i32>,
    ) {
        if let SourceEvent::Exited { code } = event {
            info!("Bundler exited with code {:?}", code);
            *exit_code = code;
            return;
        }
        if let Some(parsed) = self.parser.parse(&event) {
            events.push(parsed);
        }
    }
}
