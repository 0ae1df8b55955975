//! Session runner - log source to terminal

use tokio::sync::mpsc;

use bdemon_app::{Channel, ConsoleOutput, LineStyle, LogDispatcher, Settings, StyledLine};
use bdemon_core::prelude::*;
use bdemon_stream::{spawn_stdin_reader, BundlerCommand, BundlerProcess, StreamPump};
use bdemon_term::{TermOutput, TermProgressFactory};

use crate::project::ProjectInfo;

/// Capacity of the source event channel
const EVENT_CHANNEL_SIZE: usize = 256;

/// Where log lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSource {
    /// Spawn the bundler and read its output
    Bundler(BundlerCommand),
    /// Read NDJSON piped into our stdin
    Stdin,
}

/// The bundler command: the CLI words if any, else the configured command
pub fn bundler_command(words: &[String], settings: &Settings) -> BundlerCommand {
    BundlerCommand::from_words(words).unwrap_or_else(|| {
        BundlerCommand::new(
            settings.bundler.command.clone(),
            settings.bundler.args.clone(),
        )
    })
}

/// Lines printed before the log stream starts
pub fn banner_lines(project: &ProjectInfo, source: &LogSource) -> Vec<StyledLine> {
    let source_line = match source {
        LogSource::Bundler(command) => format!("Running {}", command.display()),
        LogSource::Stdin => "Reading logs from stdin".to_string(),
    };

    vec![
        StyledLine::new(format!("Bundle Demon · {}", project.name), LineStyle::Bold),
        StyledLine::plain(format!("{} in {}", source_line, project.root.display())),
        StyledLine::plain(""),
    ]
}

/// Run one session until the source ends or the user interrupts.
///
/// Fails with [`Error::ProcessExit`] when the bundler exits non-zero.
pub async fn run(project: &ProjectInfo, settings: &Settings, source: LogSource) -> Result<()> {
    info!("Source: {:?}", source);

    let mut output = TermOutput::stdio(&settings.output);
    for line in banner_lines(project, &source) {
        output.write_line(Channel::Default, line);
    }

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

    // Held for the whole session; dropping it kills the bundler
    let mut process = match source {
        LogSource::Bundler(command) => Some(BundlerProcess::spawn(&command, &project.root, tx)?),
        LogSource::Stdin => {
            spawn_stdin_reader(tx);
            None
        }
    };

    let mut dispatcher =
        LogDispatcher::from_settings(output, TermProgressFactory::stderr(), settings);
    let pump = StreamPump::new(rx);

    let exit_code = tokio::select! {
        code = pump.run(&mut dispatcher) => code,
        _ = wait_for_signal() => {
            info!("Shutdown signal received");
            None
        }
    };

    if let Some(process) = process.as_mut() {
        if !process.has_exited() {
            process.kill();
        }
    }

    info!("Session ended, exit code {:?}", exit_code);
    exit_status(exit_code)
}

/// A non-zero bundler exit becomes [`Error::ProcessExit`]
pub fn exit_status(code: Option<i32>) -> Result<()> {
    match code {
        Some(code) if code != 0 => Err(Error::ProcessExit { code: Some(code) }),
        _ => Ok(()),
    }
}

/// Wait for SIGINT/SIGTERM (Ctrl+C on Windows).
///
/// Never resolves if the handlers cannot be installed.
async fn wait_for_signal() {
    if let Err(e) = listen_for_signal().await {
        error!("Signal handler error: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn listen_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| Error::terminal(format!("Failed to create SIGINT handler: {}", e)))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| Error::terminal(format!("Failed to create SIGTERM handler: {}", e)))?;

        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
        }

        Ok(())
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::terminal(format!("Failed to listen for Ctrl+C: {}", e)))?;
        info!("Received Ctrl+C");
        Ok(())
    }
}
