//! Configuration types for Bundle Demon
//!
//! Defines `Settings` (`.bdemon/config.toml`) and its sections. Every key is
//! optional; defaults reproduce the stock console output.

use serde::{Deserialize, Serialize};

use bdemon_core::stack_trace::{DEFAULT_FRAMES_AFTER_APP, DEFAULT_LIBRARY_PREFIX};
use bdemon_core::StackTracePolicy;

use crate::progress::{ProgressOptions, PROGRESS_TOTAL};

/// Application settings (.bdemon/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub bundler: BundlerSettings,

    #[serde(default)]
    pub progress: ProgressSettings,

    #[serde(default)]
    pub stack: StackSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// How to start the bundler
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BundlerSettings {
    #[serde(default = "default_bundler_command")]
    pub command: String,

    #[serde(default = "default_bundler_args")]
    pub args: Vec<String>,
}

impl Default for BundlerSettings {
    fn default() -> Self {
        Self {
            command: default_bundler_command(),
            args: default_bundler_args(),
        }
    }
}

fn default_bundler_command() -> String {
    "npx".to_string()
}

fn default_bundler_args() -> Vec<String> {
    vec!["expo".to_string(), "start".to_string()]
}

/// Bundle build progress bar
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProgressSettings {
    #[serde(default = "default_progress_label")]
    pub label: String,

    #[serde(default = "default_progress_width")]
    pub width: u16,

    #[serde(default = "default_complete_char")]
    pub complete_char: char,

    #[serde(default = "default_incomplete_char")]
    pub incomplete_char: char,

    /// Remove the bar once the build finishes
    #[serde(default = "default_true")]
    pub clear: bool,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            label: default_progress_label(),
            width: default_progress_width(),
            complete_char: default_complete_char(),
            incomplete_char: default_incomplete_char(),
            clear: true,
        }
    }
}

impl ProgressSettings {
    pub fn options(&self) -> ProgressOptions {
        ProgressOptions {
            width: self.width.max(1),
            total: PROGRESS_TOTAL,
            clear: self.clear,
            complete_char: self.complete_char,
            incomplete_char: self.incomplete_char,
        }
    }
}

fn default_progress_label() -> String {
    "Building JavaScript bundle".to_string()
}

fn default_progress_width() -> u16 {
    64
}

fn default_complete_char() -> char {
    '='
}

fn default_incomplete_char() -> char {
    ' '
}

fn default_true() -> bool {
    true
}

/// Stack trace truncation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StackSettings {
    /// Frames starting with this are dependency code
    #[serde(default = "default_library_prefix")]
    pub library_prefix: String,

    /// Frames kept after the last application frame
    #[serde(default = "default_frames_after_app")]
    pub frames_after_app: usize,

    /// Regexes for internal callsites printed dimmed. Empty disables dimming.
    #[serde(default)]
    pub collapse_patterns: Vec<String>,
}

impl Default for StackSettings {
    fn default() -> Self {
        Self {
            library_prefix: default_library_prefix(),
            frames_after_app: default_frames_after_app(),
            collapse_patterns: Vec::new(),
        }
    }
}

impl StackSettings {
    pub fn policy(&self) -> StackTracePolicy {
        StackTracePolicy {
            library_prefix: self.library_prefix.clone(),
            frames_after_app: self.frames_after_app,
        }
    }
}

fn default_library_prefix() -> String {
    DEFAULT_LIBRARY_PREFIX.to_string()
}

fn default_frames_after_app() -> usize {
    DEFAULT_FRAMES_AFTER_APP
}

/// When to emit ANSI styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color when the stream is a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

/// Console rendering
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct OutputSettings {
    #[serde(default)]
    pub color: ColorMode,

    /// Spaces before nested stack frame lines
    #[serde(default)]
    pub nested_indent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bundler.command, "npx");
        assert_eq!(settings.bundler.args, vec!["expo", "start"]);
        assert_eq!(settings.progress.label, "Building JavaScript bundle");
        assert_eq!(settings.progress.width, 64);
        assert_eq!(settings.stack.library_prefix, "node_modules");
        assert_eq!(settings.stack.frames_after_app, 2);
        assert!(settings.stack.collapse_patterns.is_empty());
        assert_eq!(settings.output.color, ColorMode::Auto);
        assert_eq!(settings.output.nested_indent, 0);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[progress]
width = 40

[stack]
collapse_patterns = ["metro-runtime"]
"#,
        )
        .unwrap();

        assert_eq!(settings.progress.width, 40);
        assert_eq!(settings.progress.complete_char, '=');
        assert!(settings.progress.clear);
        assert_eq!(settings.stack.library_prefix, "node_modules");
        assert_eq!(settings.stack.collapse_patterns, vec!["metro-runtime"]);
    }

    #[test]
    fn test_progress_options_from_settings() {
        let settings = ProgressSettings {
            width: 0,
            complete_char: '#',
            incomplete_char: '-',
            clear: false,
            ..Default::default()
        };
        let options = settings.options();
        assert_eq!(options.width, 1);
        assert_eq!(options.total, 100);
        assert!(!options.clear);
        assert_eq!(options.complete_char, '#');
        assert_eq!(options.incomplete_char, '-');
    }

    #[test]
    fn test_stack_policy_from_settings() {
        let settings = StackSettings {
            library_prefix: "vendor/".to_string(),
            frames_after_app: 5,
            collapse_patterns: Vec::new(),
        };
        let policy = settings.policy();
        assert_eq!(policy.library_prefix, "vendor/");
        assert_eq!(policy.frames_after_app, 5);
    }

    #[test]
    fn test_color_mode_parsing() {
        let output: OutputSettings = toml::from_str("color = \"never\"").unwrap();
        assert_eq!(output.color, ColorMode::Never);
    }
}
