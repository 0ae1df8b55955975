//! Bundle Demon Library
//!
//! Wires the bundler log stream to the terminal: resolves the project,
//! starts the log source and pumps its events through a `LogDispatcher`.

pub mod project;
pub mod runner;

pub use project::ProjectInfo;
pub use runner::{bundler_command, run, LogSource};
