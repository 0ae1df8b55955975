//! Terminal colors for console output

use crossterm::style::Color;

// --- Log level colors ---
pub const LOG_ERROR: Color = Color::Red;
pub const LOG_WARNING: Color = Color::Yellow;

// --- Text ---
pub const TEXT_MUTED: Color = Color::DarkGrey;

// --- Status ---
pub const STATUS_GREEN: Color = Color::Green; // Build finished
pub const STATUS_RED: Color = Color::Red; // Build failed
pub const ACCENT: Color = Color::Cyan; // Banner and progress label
