//! # bdemon-core - Core Domain Types
//!
//! Foundation crate for Bundle Demon. Provides the log record model, severity
//! routing, build lifecycle events, error handling, and stack trace rendering.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Records (`record`)
//! - [`LogRecord`] - A bunyan-shaped record from the bundler's log stream
//! - [`RecordMessage`] - Text or structured `msg` payload
//!
//! ### Routing (`types`)
//! - [`Severity`] - Totally ordered bunyan level
//! - [`sink_for()`] - Three-tier routing of a severity to a [`SinkKind`]
//! - [`Channel`], [`SinkPair`] - Console channels a record is written to
//!
//! ### Build Events (`events`)
//! - [`BuildEvent`] - Bundle build start / progress / finish
//!
//! ### Stack Traces (`stack_trace`)
//! - [`StackTraceRenderer`] - Frame filtering, truncation and summary line
//! - [`CallsiteFilter`] - Pluggable predicate for de-emphasised frames
//! - [`FrameWindow`] - Which frames of a stack get printed
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use bdemon_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod record;
pub mod stack_trace;
pub mod types;

/// Prelude for common imports used throughout all Bundle Demon crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use events::{elapsed_ms, BuildEvent};
pub use record::{LogRecord, RecordMessage, DEVICE_TAG};
pub use stack_trace::{
    classify_frame, unlogged_summary, CallsiteFilter, FrameKind, FrameWindow, LineStyle,
    LineTarget, RenderedLine, RenderedStack, StackTracePolicy, StackTraceRenderer,
};
pub use types::{sink_for, Channel, Severity, SinkKind, SinkPair};
