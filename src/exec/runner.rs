// src/exec/runner.rs

//! Child process handling for one meltano invocation.

use std::io;
#[cfg(unix)]
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Context;
#[cfg(unix)]
use tokio::io::{AsyncBufReadExt, BufReader};
#[cfg(unix)]
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::env::EnvMap;
use crate::errors::{MeltrunError, Result};

/// Lines buffered between the pipe reader and the consumer. When full,
/// the reader waits, the pipe fills, and the child blocks on write; nothing
/// is dropped.
const LINE_BUFFER: usize = 256;

/// What to launch, where, and with which environment.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    /// The complete child environment; nothing is inherited.
    pub env: EnvMap,
}

/// How a streamed run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerOutcome {
    /// Exit code, `-1` when the child was killed by a signal.
    Exited(i32),
    Cancelled,
}

/// External request to stop a run.
///
/// Once fired it stays fired. Dropping the sender without sending is not a
/// cancellation.
#[derive(Debug, Default)]
pub struct CancelSignal {
    rx: Option<oneshot::Receiver<()>>,
    fired: bool,
}

impl CancelSignal {
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            Self {
                rx: Some(rx),
                fired: false,
            },
        )
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.fired
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&mut self) {
        if self.fired {
            return;
        }
        if let Some(rx) = self.rx.as_mut() {
            let sent = rx.await.is_ok();
            self.rx = None;
            if sent {
                self.fired = true;
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

/// A running meltano process whose stdout and stderr arrive as one
/// sequence of raw lines.
///
/// Both streams share a single pipe, so lines arrive in the order the child
/// wrote them.
#[derive(Debug)]
pub struct MeltanoProcess {
    child: Child,
    lines: mpsc::Receiver<Vec<u8>>,
}

impl MeltanoProcess {
    pub fn spawn(spec: &LaunchSpec) -> Result<Self> {
        let (program, args) = spec
            .argv
            .split_first()
            .ok_or_else(|| MeltrunError::config("empty command line"))?;

        let (reader, writer) = io::pipe().context("creating output pipe")?;
        let stderr_writer = writer.try_clone().context("creating output pipe")?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);
        if let Some(dir) = spec.cwd.as_ref() {
            cmd.current_dir(dir);
        }
        // Own group, so cancellation reaches the plugins meltano starts.
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning '{program}'"))?;
        // The command holds the parent's write ends; EOF needs them closed.
        drop(cmd);

        info!(pid = child.id(), program = %program, "meltano process started");

        let (tx, lines) = mpsc::channel(LINE_BUFFER);
        spawn_pipe_reader(reader, tx)?;

        Ok(Self { child, lines })
    }

    pub async fn wait(&mut self) -> Result<i32> {
        let status = self
            .child
            .wait()
            .await
            .context("waiting for meltano process")?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Kill meltano and everything in its process group.
    pub async fn kill(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.child.id() {
            // SAFETY: killpg only sends a signal; the group id comes from our child.
            if unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) } != 0 {
                debug!(pid, error = %io::Error::last_os_error(), "killpg failed");
            }
        }
        if let Err(e) = self.child.kill().await {
            warn!(error = %e, "failed to kill meltano process");
        }
    }

    /// Feed every line to `on_line` in arrival order, then wait for exit.
    ///
    /// On cancellation the child is killed and remaining output discarded.
    pub async fn drive<F>(mut self, cancel: &mut CancelSignal, mut on_line: F) -> Result<RunnerOutcome>
    where
        F: FnMut(&[u8]),
    {
        loop {
            tokio::select! {
                line = self.lines.recv() => match line {
                    Some(line) => on_line(&line),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    info!("cancellation requested; killing meltano process");
                    self.kill().await;
                    return Ok(RunnerOutcome::Cancelled);
                }
            }
        }

        tokio::select! {
            code = self.wait() => {
                let code = code?;
                info!(exit_code = code, "meltano process exited");
                Ok(RunnerOutcome::Exited(code))
            }
            _ = cancel.cancelled() => {
                info!("cancellation requested while waiting; killing meltano process");
                self.kill().await;
                Ok(RunnerOutcome::Cancelled)
            }
        }
    }
}

#[cfg(unix)]
fn spawn_pipe_reader(reader: io::PipeReader, tx: mpsc::Sender<Vec<u8>>) -> Result<()> {
    let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))
        .context("registering output pipe")?;

    tokio::spawn(async move {
        let mut reader = BufReader::new(receiver);
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(line).await.is_err() {
                        debug!("line consumer gone; stopping reader");
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "error reading meltano output");
                    break;
                }
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn spawn_pipe_reader(reader: io::PipeReader, tx: mpsc::Sender<Vec<u8>>) -> Result<()> {
    use std::io::BufRead;

    std::thread::spawn(move || {
        let mut reader = io::BufReader::new(reader);
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "error reading meltano output");
                    break;
                }
            }
        }
    });
    Ok(())
}
