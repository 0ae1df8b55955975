//! Configuration loading for Bundle Demon

pub mod settings;
pub mod types;

pub use settings::{config_path, init_config_dir, load_settings};
pub use types::{
    BundlerSettings, ColorMode, OutputSettings, ProgressSettings, Settings, StackSettings,
};
