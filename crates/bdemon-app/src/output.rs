//! Console output channels

pub use bdemon_core::{Channel, LineStyle};

/// A single line of console output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledLine {
    pub text: String,
    pub style: LineStyle,
    /// Written through a record's nested sink (stack frames)
    pub nested: bool,
}

impl StyledLine {
    pub fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
            nested: false,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, LineStyle::Plain)
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }
}

/// Where rendered lines end up.
///
/// Writes are synchronous and append-only. Implementations swallow their own
/// I/O failures: a broken terminal must not stop the log stream.
pub trait ConsoleOutput {
    fn write_line(&mut self, channel: Channel, line: StyledLine);

    fn write_info(&mut self, text: &str) {
        self.write_line(Channel::Info, StyledLine::plain(text));
    }

    fn write_warn(&mut self, text: &str) {
        self.write_line(Channel::Warn, StyledLine::plain(text));
    }

    fn write_error(&mut self, text: &str) {
        self.write_line(Channel::Error, StyledLine::plain(text));
    }

    fn write_default(&mut self, text: &str) {
        self.write_line(Channel::Default, StyledLine::plain(text));
    }
}

impl<T: ConsoleOutput + ?Sized> ConsoleOutput for &mut T {
    fn write_line(&mut self, channel: Channel, line: StyledLine) {
        (**self).write_line(channel, line);
    }
}

impl<T: ConsoleOutput + ?Sized> ConsoleOutput for Box<T> {
    fn write_line(&mut self, channel: Channel, line: StyledLine) {
        (**self).write_line(channel, line);
    }
}
