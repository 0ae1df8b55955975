//! Styled console output on stdout/stderr

use std::io::{self, Stderr, Stdout, Write};

use crossterm::style::{Attribute, ContentStyle};
use crossterm::tty::IsTty;
use tracing::error;

use bdemon_app::config::OutputSettings;
use bdemon_app::{Channel, ColorMode, ConsoleOutput, LineStyle, StyledLine};

use crate::palette;

/// Decide whether to emit ANSI styling.
///
/// `Auto` colors only when both streams are terminals and `NO_COLOR` is unset.
pub fn color_enabled(mode: ColorMode, is_tty: bool, no_color: bool) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => is_tty && !no_color,
    }
}

fn no_color_env() -> bool {
    std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())
}

/// Crossterm style for a line on a channel
fn content_style(channel: Channel, style: LineStyle) -> ContentStyle {
    let mut content = ContentStyle::new();
    content.foreground_color = match channel {
        Channel::Warn => Some(palette::LOG_WARNING),
        Channel::Error => Some(palette::LOG_ERROR),
        Channel::Info | Channel::Default => None,
    };

    match style {
        LineStyle::Plain => {}
        LineStyle::Bold => content.attributes.set(Attribute::Bold),
        LineStyle::Dim => {
            content.foreground_color = Some(palette::TEXT_MUTED);
            content.attributes.set(Attribute::Dim);
        }
        LineStyle::Success => content.foreground_color = Some(palette::STATUS_GREEN),
        LineStyle::Failure => {
            content.foreground_color = Some(palette::STATUS_RED);
            content.attributes.set(Attribute::Bold);
        }
    }
    content
}

/// Console output backed by two writers.
///
/// Info and default lines go to `out`, warnings and errors to `err`.
pub struct TermOutput<O: Write, E: Write> {
    out: O,
    err: E,
    color: bool,
    nested_indent: usize,
}

impl TermOutput<Stdout, Stderr> {
    /// Output on the process stdout/stderr
    pub fn stdio(settings: &OutputSettings) -> Self {
        let out = io::stdout();
        let err = io::stderr();
        let color = color_enabled(settings.color, out.is_tty() && err.is_tty(), no_color_env());
        Self::new(out, err, color, settings.nested_indent)
    }
}

impl<O: Write, E: Write> TermOutput<O, E> {
    pub fn new(out: O, err: E, color: bool, nested_indent: usize) -> Self {
        Self {
            out,
            err,
            color,
            nested_indent,
        }
    }

    pub fn color(&self) -> bool {
        self.color
    }

    pub fn out(&self) -> &O {
        &self.out
    }

    pub fn err(&self) -> &E {
        &self.err
    }

    fn format_line(&self, channel: Channel, line: &StyledLine) -> String {
        let indent = if line.nested { self.nested_indent } else { 0 };
        let text = format!("{:indent$}{}", "", line.text, indent = indent);

        if !self.color || line.text.is_empty() {
            return text;
        }
        content_style(channel, line.style).apply(text).to_string()
    }
}

impl<O: Write, E: Write> ConsoleOutput for TermOutput<O, E> {
    fn write_line(&mut self, channel: Channel, line: StyledLine) {
        let formatted = self.format_line(channel, &line);

        let writer: &mut dyn Write = match channel {
            Channel::Info | Channel::Default => &mut self.out,
            Channel::Warn | Channel::Error => &mut self.err,
        };

        if let Err(e) = writeln!(writer, "{}", formatted) {
            error!("Failed to write console line: {}", e);
            return;
        }
        if let Err(e) = writer.flush() {
            error!("Failed to flush console: {}", e);
        }
    }
}
