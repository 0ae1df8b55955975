//! Bundle Demon - terminal log output for JavaScript bundler sessions
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use bdemon_app::config::{init_config_dir, load_settings};
use bundle_demon::{bundler_command, LogSource, ProjectInfo};
use bdemon_core::{Error, Result};
use clap::Parser;
use tracing::{error, info};

/// Bundle Demon - readable bundler logs with stack trace truncation
#[derive(Parser, Debug)]
#[command(name = "bdemon")]
#[command(about = "Readable terminal output for JavaScript bundler sessions", long_about = None)]
struct Args {
    /// Path to the JavaScript project
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Read the NDJSON log stream from stdin instead of spawning the bundler
    #[arg(long, conflicts_with = "command")]
    stdin: bool,

    /// Write a default .bdemon/config.toml and exit
    #[arg(long)]
    init: bool,

    /// Bundler command, overriding [bundler] in the config
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    // Initialize logging (to file, the terminal belongs to the log stream)
    bdemon_core::logging::init()?;

    match run_cli(args).await {
        Ok(()) => {
            info!("Bundle Demon exiting");
            Ok(())
        }
        Err(Error::ProcessExit { code: Some(code) }) => {
            info!("Bundle Demon exiting with bundler code {}", code);
            std::process::exit(code);
        }
        Err(e) if e.is_fatal() => {
            error!("Fatal error: {}", e);
            Err(e.into())
        }
        Err(e) => {
            error!("Application error: {:?}", e);
            Err(e.into())
        }
    }
}

async fn run_cli(args: Args) -> Result<()> {
    let project = ProjectInfo::resolve(args.path)?;
    bdemon_core::logging::log_session(&project.name, &project.root);

    if args.init {
        let path = init_config_dir(&project.root)?;
        eprintln!("Config written to {}", path.display());
        return Ok(());
    }

    let settings = load_settings(&project.root);
    let source = if args.stdin {
        LogSource::Stdin
    } else {
        LogSource::Bundler(bundler_command(&args.command, &settings))
    };

    bundle_demon::run(&project, &settings, source).await
}
