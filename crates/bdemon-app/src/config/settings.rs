//! Settings parser for .bdemon/config.toml

use std::path::{Path, PathBuf};

use super::types::Settings;
use bdemon_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const BDEMON_DIR: &str = ".bdemon";

/// Path of the settings file for a project
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(BDEMON_DIR).join(CONFIG_FILENAME)
}

/// Load settings from .bdemon/config.toml
///
/// Missing or unreadable files fall back to defaults.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_path(project_path);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    let loaded = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {:?}", config_path))
        .and_then(|content| parse_settings(&content));

    match loaded {
        Ok(settings) => {
            debug!("Loaded settings from {:?}", config_path);
            settings
        }
        Err(e) => {
            warn!("Using default settings, {:?} is unusable: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Parse the contents of a config.toml
pub fn parse_settings(content: &str) -> Result<Settings> {
    toml::from_str(content).map_err(|e| Error::config_invalid(e.to_string()))
}

/// Create a default config file in the .bdemon/ directory
///
/// An existing file is left untouched. Returns the config file path.
pub fn init_config_dir(project_path: &Path) -> Result<PathBuf> {
    let bdemon_dir = project_path.join(BDEMON_DIR);

    if !bdemon_dir.exists() {
        std::fs::create_dir_all(&bdemon_dir)
            .with_context(|| format!("Failed to create {:?}", bdemon_dir))?;
    }

    let config_path = bdemon_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r#"# Bundle Demon Configuration

[bundler]
command = "npx"
args = ["expo", "start"]

[progress]
label = "Building JavaScript bundle"
width = 64
complete_char = "="
incomplete_char = " "
clear = true            # Remove the bar when the build finishes

[stack]
library_prefix = "node_modules"
frames_after_app = 2    # Frames shown after the last app frame
collapse_patterns = []  # Regexes for frames to print dimmed

[output]
color = "auto"          # auto | always | never
nested_indent = 0
"#;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(config_path)
}
