//! # bdemon-app - Log Dispatch
//!
//! Consumes the bundler event stream and decides what reaches the console.
//!
//! ## Public API
//!
//! - [`LogDispatcher`]: routes records, renders stack traces, drives progress
//! - [`ConsoleOutput`]: channel-aware line sink implemented by the terminal
//! - [`ProgressFactory`] / [`ProgressIndicator`]: progress bar collaborators
//! - [`Settings`]: `.bdemon/config.toml`
//!
//! Recording fakes for the collaborators live in `test_utils` behind the
//! `test-helpers` feature.

pub mod config;
pub mod dispatcher;
pub mod output;
pub mod progress;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use config::{load_settings, ColorMode, Settings};
pub use dispatcher::{finished_build_message, LogDispatcher, FAILED_BUILD_MESSAGE};
pub use output::{Channel, ConsoleOutput, LineStyle, StyledLine};
pub use progress::{
    BuildProgressState, ProgressFactory, ProgressIndicator, ProgressOptions, PROGRESS_TOTAL,
};
