//! In-place progress bar on stderr

use std::io::{self, Stderr, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::tty::IsTty;
use crossterm::QueueableCommand;
use tracing::debug;

use bdemon_app::{ProgressFactory, ProgressIndicator, ProgressOptions};

use crate::palette;

/// The `[===   ]` part of the bar, without brackets
pub fn render_bar(current: u32, options: &ProgressOptions) -> String {
    let total = u64::from(options.total.max(1));
    let current = u64::from(current).min(total);
    let width = usize::from(options.width);
    let filled = (u64::from(options.width) * current / total) as usize;

    let mut bar = String::with_capacity(width);
    bar.extend(std::iter::repeat(options.complete_char).take(filled));
    bar.extend(std::iter::repeat(options.incomplete_char).take(width - filled));
    bar
}

/// Full bar line: `{label} [{bar}] {percent}%`
pub fn render_progress_line(label: &str, current: u32, options: &ProgressOptions) -> String {
    let total = options.total.max(1);
    let percent = u64::from(current.min(total)) * 100 / u64::from(total);
    format!("{} [{}] {}%", label, render_bar(current, options), percent)
}

/// Progress bar drawn on a single terminal line.
///
/// Each advance redraws the line in place. With `draw` off the bar only
/// tracks its value.
pub struct TermProgressBar<W: Write> {
    writer: W,
    label: String,
    options: ProgressOptions,
    current: u32,
    draw: bool,
    terminated: bool,
}

impl<W: Write> TermProgressBar<W> {
    pub fn new(writer: W, label: &str, options: &ProgressOptions, draw: bool) -> Self {
        let mut bar = Self {
            writer,
            label: label.to_string(),
            options: options.clone(),
            current: 0,
            draw,
            terminated: false,
        };
        bar.redraw();
        bar
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn redraw(&mut self) {
        if !self.draw || self.terminated {
            return;
        }
        if let Err(e) = self.draw_line() {
            debug!("Failed to draw progress bar: {}", e);
        }
    }

    fn draw_line(&mut self) -> io::Result<()> {
        let line = render_progress_line(&self.label, self.current, &self.options);
        self.writer.queue(MoveToColumn(0))?;
        self.writer.queue(Clear(ClearType::CurrentLine))?;
        self.writer.queue(Print(line.with(palette::ACCENT)))?;
        self.writer.flush()
    }

    fn erase_line(&mut self) -> io::Result<()> {
        if self.options.clear {
            self.writer.queue(MoveToColumn(0))?;
            self.writer.queue(Clear(ClearType::CurrentLine))?;
        } else {
            self.writer.queue(Print("\n"))?;
        }
        self.writer.flush()
    }
}

impl<W: Write> ProgressIndicator for TermProgressBar<W> {
    fn advance(&mut self, delta: u32) {
        self.current = self.current.saturating_add(delta).min(self.options.total);
        self.redraw();
    }

    fn is_complete(&self) -> bool {
        self.current >= self.options.total
    }

    fn current(&self) -> u32 {
        self.current
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;
        if !self.draw {
            return;
        }

        if let Err(e) = self.erase_line() {
            debug!("Failed to clear progress bar: {}", e);
        }
    }
}

impl<W: Write> Drop for TermProgressBar<W> {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Creates progress bars on stderr
#[derive(Debug, Clone, Copy)]
pub struct TermProgressFactory {
    draw: bool,
}

impl TermProgressFactory {
    /// Draws only when stderr is a terminal
    pub fn stderr() -> Self {
        Self {
            draw: io::stderr().is_tty(),
        }
    }
}

impl ProgressFactory for TermProgressFactory {
    type Indicator = TermProgressBar<Stderr>;

    fn create(&mut self, label: &str, options: &ProgressOptions) -> Self::Indicator {
        TermProgressBar::new(io::stderr(), label, options, self.draw)
    }
}
