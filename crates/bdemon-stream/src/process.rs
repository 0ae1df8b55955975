//! Bundler process management

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};

use bdemon_core::prelude::*;

use crate::stdin::send_lines;
use crate::SourceEvent;

/// Program and arguments used to start the bundler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BundlerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a command line split into words; `None` when empty.
    pub fn from_words(words: &[String]) -> Option<Self> {
        let (program, args) = words.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    /// Resolve the program on `PATH` (or relative to `cwd` when it contains a separator).
    pub fn resolve(&self, cwd: &Path) -> Result<PathBuf> {
        which::which_in(&self.program, std::env::var_os("PATH"), cwd)
            .map_err(|_| Error::bundler_not_found(&self.program))
    }

    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Manages the bundler child process.
///
/// The `Child` handle is moved into a background task that waits for exit and
/// emits [`SourceEvent::Exited`] with the real exit code. stdout and stderr
/// are read line by line on their own tasks.
pub struct BundlerProcess {
    pid: Option<u32>,
    /// Tells the wait task to force-kill the process. Consumed on first use.
    kill_tx: Option<oneshot::Sender<()>>,
    /// Set by the wait task once the child has exited.
    exited: Arc<AtomicBool>,
}

impl BundlerProcess {
    /// Spawn the bundler in `project_root`, forwarding its output to `event_tx`.
    pub fn spawn(
        command: &BundlerCommand,
        project_root: &Path,
        event_tx: mpsc::Sender<SourceEvent>,
    ) -> Result<Self> {
        if !project_root.is_dir() {
            return Err(Error::no_project(project_root));
        }

        let program = command.resolve(project_root)?;
        info!("Spawning bundler: {}", command.display());

        let mut child = Command::new(&program)
            .args(&command.args)
            .current_dir(project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::bundler_not_found(&command.program)
                } else {
                    Error::process_spawn(e.to_string())
                }
            })?;

        let pid = child.id();
        info!("Bundler process started with PID: {:?}", pid);

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::process("stdout was not captured"))?;
        tokio::spawn(Self::stdout_reader(stdout, event_tx.clone()));

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::process("stderr was not captured"))?;
        tokio::spawn(Self::stderr_reader(stderr, event_tx.clone()));

        let exited = Arc::new(AtomicBool::new(false));
        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        tokio::spawn(Self::wait_for_exit(
            child,
            kill_rx,
            event_tx,
            Arc::clone(&exited),
        ));

        Ok(Self {
            pid,
            kill_tx: Some(kill_tx),
            exited,
        })
    }

    /// Background task: owns `child`, waits for it to exit, emits `SourceEvent::Exited`.
    async fn wait_for_exit(
        mut child: Child,
        kill_rx: oneshot::Receiver<()>,
        event_tx: mpsc::Sender<SourceEvent>,
        exited: Arc<AtomicBool>,
    ) {
        let code: Option<i32> = tokio::select! {
            result = child.wait() => {
                match result {
                    Ok(status) => {
                        info!("Bundler exited with status: {:?}", status);
                        status.code()
                    }
                    Err(e) => {
                        error!("Error waiting for bundler process: {}", e);
                        None
                    }
                }
            }
            _ = kill_rx => {
                info!("Kill signal received, stopping bundler");
                if let Err(e) = child.kill().await {
                    error!("Failed to kill bundler process: {}", e);
                }
                child.wait().await.ok().and_then(|status| status.code())
            }
        };

        exited.store(true, Ordering::Release);
        let _ = event_tx.send(SourceEvent::Exited { code }).await;
    }

    async fn stdout_reader(stdout: tokio::process::ChildStdout, tx: mpsc::Sender<SourceEvent>) {
        let reader = BufReader::new(stdout);
        if let Err(e) = send_lines(reader, &tx, SourceEvent::Stdout).await {
            debug!("stdout reader stopped: {}", e);
        }
        debug!("stdout reader finished");
    }

    async fn stderr_reader(stderr: tokio::process::ChildStderr, tx: mpsc::Sender<SourceEvent>) {
        let reader = BufReader::new(stderr);
        if let Err(e) = send_lines(reader, &tx, SourceEvent::Stderr).await {
            debug!("stderr reader stopped: {}", e);
        }
        debug!("stderr reader finished");
    }

    /// Ask the wait task to kill the bundler.
    pub fn kill(&mut self) {
        if let Some(tx) = self.kill_tx.take() {
            // The wait task may already be gone
            let _ = tx.send(());
        }
    }

    pub fn has_exited(&self) -> bool {
        self.exited.load(Ordering::Acquire)
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }
}

impl Drop for BundlerProcess {
    fn drop(&mut self) {
        if !self.has_exited() {
            warn!("BundlerProcess dropped while process may still be running");
            self.kill();
        }
    }
}
