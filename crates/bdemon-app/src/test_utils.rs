//! Test utilities for dispatcher collaborators
//!
//! Recording fakes for [`ConsoleOutput`] and [`ProgressFactory`] so tests can
//! assert on exactly what would have reached the terminal.

use std::cell::RefCell;
use std::rc::Rc;

use crate::output::{Channel, ConsoleOutput, LineStyle, StyledLine};
use crate::progress::{ProgressFactory, ProgressIndicator, ProgressOptions};

/// Console output that keeps every line
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub lines: Vec<(Channel, StyledLine)>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of every line in write order
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, l)| l.text.as_str()).collect()
    }

    /// Text of the lines written to one channel
    pub fn texts_on(&self, channel: Channel) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, l)| l.text.as_str())
            .collect()
    }

    pub fn channels(&self) -> Vec<Channel> {
        self.lines.iter().map(|(c, _)| *c).collect()
    }

    pub fn styles(&self) -> Vec<LineStyle> {
        self.lines.iter().map(|(_, l)| l.style).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl ConsoleOutput for RecordingOutput {
    fn write_line(&mut self, channel: Channel, line: StyledLine) {
        self.lines.push((channel, line));
    }
}

/// Everything a [`RecordingProgress`] indicator was asked to do
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProgressLog {
    pub created: Vec<(String, ProgressOptions)>,
    pub advances: Vec<u32>,
    pub terminated: usize,
}

impl ProgressLog {
    pub fn total_advanced(&self) -> u32 {
        self.advances.iter().sum()
    }
}

/// Factory handing out indicators that write into a shared [`ProgressLog`]
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    log: Rc<RefCell<ProgressLog>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the log so far
    pub fn log(&self) -> ProgressLog {
        self.log.borrow().clone()
    }
}

impl ProgressFactory for RecordingProgress {
    type Indicator = RecordingIndicator;

    fn create(&mut self, label: &str, options: &ProgressOptions) -> Self::Indicator {
        self.log
            .borrow_mut()
            .created
            .push((label.to_string(), options.clone()));
        RecordingIndicator {
            log: Rc::clone(&self.log),
            total: options.total,
            current: 0,
        }
    }
}

#[derive(Debug)]
pub struct RecordingIndicator {
    log: Rc<RefCell<ProgressLog>>,
    total: u32,
    current: u32,
}

impl ProgressIndicator for RecordingIndicator {
    fn advance(&mut self, delta: u32) {
        self.current = (self.current + delta).min(self.total);
        self.log.borrow_mut().advances.push(delta);
    }

    fn is_complete(&self) -> bool {
        self.current >= self.total
    }

    fn current(&self) -> u32 {
        self.current
    }

    fn terminate(&mut self) {
        self.log.borrow_mut().terminated += 1;
    }
}
