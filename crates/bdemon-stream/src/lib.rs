//! # bdemon-stream - Bundler Log Stream
//!
//! Turns the bundler's output into the events a [`LogSubscriber`] consumes:
//! batches of log records and build lifecycle notifications.
//!
//! Depends on [`bdemon_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Sources
//! - [`BundlerProcess`] - Spawn the bundler and read its stdout/stderr
//! - [`spawn_stdin_reader()`] - Read a piped log stream from stdin
//!
//! ### Protocol Parsing
//! - [`LineParser`] - Classify lines as Metro reporter events, bunyan records or text
//!
//! ### Delivery
//! - [`LogSubscriber`] - One method per event kind
//! - [`StreamPump`] - Feeds a subscriber in arrival order, batching records

pub mod process;
pub mod protocol;
pub mod stdin;
pub mod subscriber;

pub use process::{BundlerCommand, BundlerProcess};
pub use protocol::{LineParser, OutputStream, StreamEvent};
pub use stdin::{forward_lines, spawn_stdin_reader};
pub use subscriber::{deliver, LogSubscriber, StreamPump};

/// Raw output from a log source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A line from the bundler's stdout (or from piped input)
    Stdout(String),
    /// A line from the bundler's stderr
    Stderr(String),
    /// The bundler process exited
    Exited { code: Option<i32> },
}
