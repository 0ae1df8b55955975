//! # bdemon-term - Terminal Rendering
//!
//! Implements the console collaborators of `bdemon-app` on a real terminal:
//!
//! - [`TermOutput`]: writes info and default lines to stdout, warnings and
//!   errors to stderr, styled with crossterm
//! - [`TermProgressBar`] / [`TermProgressFactory`]: single-line progress bar
//!   redrawn in place on stderr

pub mod output;
pub mod palette;
pub mod progress;

pub use output::{color_enabled, TermOutput};
pub use progress::{render_bar, render_progress_line, TermProgressBar, TermProgressFactory};
